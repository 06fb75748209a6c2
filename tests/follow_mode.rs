mod common;

use common::{at, last_spoken, router, router_with, spoken, ScriptedClassifier};
use murmur::config::AssistantConfig;
use murmur::kernel::intent::{Direction, IntentKind};
use murmur::kernel::presence::ListenMode;
use murmur::{Outcome, Route};

#[test]
fn test_more_and_less_within_ttl() {
    let (mut router, log) = router();
    router.handle_utterance("volume up 2", at(0.0));
    assert_eq!(router.listen_mode(at(0.0)), ListenMode::FollowMode);

    // 1. "more" repeats one step in the same direction
    let decision = router.handle_utterance("more", at(3.0));
    assert_eq!(decision.route, Route::FollowMode);
    assert_eq!(decision.outcome, Outcome::Executed);
    let (intent, entities) = log.last().expect("executor called");
    assert_eq!(intent, IntentKind::VolumeChange);
    assert_eq!(entities.direction(), Some(Direction::Up));
    assert_eq!(entities.steps(), Some(1));

    // 2. "less" backs off, twice in a row without oscillating
    router.handle_utterance("a bit less", at(5.0));
    router.handle_utterance("less", at(7.0));
    let directions: Vec<Option<Direction>> = log
        .calls()
        .iter()
        .skip(2)
        .map(|(_, e)| e.direction())
        .collect();
    assert_eq!(directions, vec![Some(Direction::Down), Some(Direction::Down)]);

    // 3. Each adjustment re-arms the window and is recorded
    assert!(router.follow_mode_active(at(16.0)), "window runs 10s from the last adjustment");
    assert_eq!(router.history().len(), 4);

    println!("Test Passed: follow mode more/less");
}

#[test]
fn test_more_after_ttl_requires_wake_word() {
    let (mut router, log) = router();
    router.handle_utterance("brightness up 2", at(0.0));
    spoken(&mut router);

    let decision = router.handle_utterance("more", at(11.0));
    assert_eq!(decision.route, Route::FollowMode);
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Say the wake word."));
    assert_eq!(log.count(), 1, "no adjustment outside follow mode");
}

#[test]
fn test_cancel_leaves_follow_mode() {
    let (mut router, log) = router();
    router.handle_utterance("volume down 3", at(0.0));
    spoken(&mut router);

    let decision = router.handle_utterance("stop", at(2.0));
    assert_eq!(decision.route, Route::FollowMode);
    assert_eq!(decision.outcome, Outcome::Cancelled);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Okay."));
    assert!(!router.follow_mode_active(at(2.0)));
    assert!(router.last_step(at(2.0)).is_none(), "cancel forgets the step too");

    let decision = router.handle_utterance("more", at(3.0));
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(log.count(), 1);
}

#[test]
fn test_repeat_last_steps_reuses_magnitude() {
    let mut config = AssistantConfig::default();
    config.follow_mode.repeat_last_steps = true;
    let (mut router, log) = router_with(config, ScriptedClassifier::new());

    router.handle_utterance("volume up 4", at(0.0));
    router.handle_utterance("more", at(1.0));
    assert_eq!(log.last().and_then(|(_, e)| e.steps()), Some(4));
}

#[test]
fn test_other_speech_needs_wake_word_in_follow_mode() {
    let (mut router, log) = router();
    router.handle_utterance("volume up 2", at(0.0));
    spoken(&mut router);

    // 1. Unrelated speech is not acted on
    let decision = router.handle_utterance("open chrome", at(1.0));
    assert_eq!(decision.route, Route::FollowMode);
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Say 'more', 'less', or the wake word."));
    assert_eq!(log.count(), 1);

    // 2. With the wake word the command goes through and follow mode ends
    let decision = router.handle_utterance("murmur open chrome", at(2.0));
    assert_eq!(decision.route, Route::Direct);
    assert_eq!(decision.outcome, Outcome::Executed);
    assert_eq!(log.last().map(|(intent, _)| intent), Some(IntentKind::OpenApp));
    assert!(!router.follow_mode_active(at(2.0)));
}

#[test]
fn test_wake_word_mentioned_mid_sentence_wakes() {
    let (mut router, log) = router();
    router.handle_utterance("volume up 2", at(0.0));
    spoken(&mut router);

    let decision = router.handle_utterance("wait murmur", at(1.0));
    assert_eq!(decision.route, Route::Wake);
    assert_eq!(decision.outcome, Outcome::Woken);
    assert_eq!(router.listen_mode(at(1.0)), ListenMode::Command);
    assert_eq!(log.count(), 1);
}

#[test]
fn test_disabled_follow_mode() {
    let mut config = AssistantConfig::default();
    config.follow_mode.enabled = false;
    let (mut router, log) = router_with(config, ScriptedClassifier::new());

    router.handle_utterance("volume up 2", at(0.0));
    assert!(!router.follow_mode_active(at(0.0)));
    assert!(router.last_step(at(0.0)).is_some(), "the last step is still remembered");

    let decision = router.handle_utterance("more", at(1.0));
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(log.count(), 1);
}

#[test]
fn test_follow_state_snapshot() {
    let (mut router, _log) = router();
    router.handle_utterance("increase brightness by two", at(1.0));

    let state = router.follow_mode_state(at(2.0));
    assert!(state.active);
    assert_eq!(state.expires_at, Some(at(11.0)));
    let last = state.last_step_action.expect("last step");
    assert_eq!(last.base_intent, IntentKind::BrightnessChange);
    assert_eq!(last.steps, 2);
}

#[test]
fn test_follow_input_priorities() {
    use murmur::kernel::dialogue::follow_mode::{
        classify_follow_input, resolve_follow_mode_gate, FollowGate, FollowInput, FollowVocabulary,
    };

    let config = AssistantConfig::default();
    let phrases = &config.phrases;
    let vocab = FollowVocabulary {
        wake_keywords: &phrases.wake_keywords,
        more: &phrases.more,
        less: &phrases.less,
        cancel: &phrases.cancel_words,
    };

    // 1. A pending question outranks follow mode
    assert_eq!(classify_follow_input("more", vocab, true), FollowInput::PendingBlock);

    // 2. The longest wake keyword is stripped
    assert_eq!(
        classify_follow_input("Hey Murmur open chrome", vocab, false),
        FollowInput::Wake { tail: "open chrome".to_string() }
    );
    assert_eq!(
        classify_follow_input("murmur", vocab, false),
        FollowInput::Wake { tail: String::new() }
    );

    // 3. Adjustments, cancel, everything else
    assert_eq!(classify_follow_input("a little more", vocab, false), FollowInput::More);
    assert_eq!(classify_follow_input("less please", vocab, false), FollowInput::Less);
    assert_eq!(classify_follow_input("stop", vocab, false), FollowInput::Cancel);
    assert_eq!(classify_follow_input("open chrome", vocab, false), FollowInput::Other);

    // 4. Outside the window
    assert_eq!(resolve_follow_mode_gate("more", vocab, false, false), FollowGate::RequireWake);
    assert_eq!(resolve_follow_mode_gate("open chrome", vocab, false, false), FollowGate::Inactive);
    assert_eq!(
        resolve_follow_mode_gate("less", vocab, false, true),
        FollowGate::Follow(FollowInput::Less)
    );
}
