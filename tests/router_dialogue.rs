mod common;

use common::{at, last_spoken, router, router_with, spoken, ScriptedClassifier};
use murmur::config::AssistantConfig;
use murmur::kernel::dialogue::PendingKind;
use murmur::kernel::intent::{keys, Direction, IntentKind};
use murmur::kernel::presence::ListenMode;
use murmur::{Outcome, Route};

#[test]
fn test_step_phrase_asks_how_much_then_executes() {
    let (mut router, log) = router();

    // 1. No magnitude: ask
    let decision = router.handle_utterance("volume up", at(0.0));
    assert_eq!(decision.route, Route::Direct);
    assert_eq!(decision.outcome, Outcome::Prompted);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("How much?"));
    assert_eq!(router.pending(at(0.0)).map(|p| p.kind), Some(PendingKind::NeedSteps));
    assert_eq!(router.listen_mode(at(0.0)), ListenMode::Clarification);

    // 2. Answer
    let decision = router.handle_utterance("three", at(2.0));
    assert_eq!(decision.route, Route::Clarification);
    assert_eq!(decision.outcome, Outcome::Executed);

    // 3. VERIFY: executed once, recorded, follow mode armed
    let (intent, entities) = log.last().expect("executor called");
    assert_eq!(intent, IntentKind::VolumeChange);
    assert_eq!(entities.direction(), Some(Direction::Up));
    assert_eq!(entities.steps(), Some(3));
    assert_eq!(log.count(), 1);
    assert_eq!(router.history().len(), 1);
    assert!(router.pending(at(2.0)).is_none(), "answer should clear the pending action");
    assert!(router.follow_mode_active(at(2.0)), "a step action arms follow mode");
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Increasing volume"));

    println!("Test Passed: How much? -> three");
}

#[test]
fn test_magnitude_in_same_utterance() {
    let (mut router, log) = router();
    let decision = router.handle_utterance("decrease brightness by 4", at(0.0));
    assert_eq!(decision.outcome, Outcome::Executed);
    let (intent, entities) = log.last().expect("executor called");
    assert_eq!(intent, IntentKind::BrightnessChange);
    assert_eq!(entities.direction(), Some(Direction::Down));
    assert_eq!(entities.steps(), Some(4));
}

#[test]
fn test_two_invalid_answers_cancel_the_clarification() {
    let (mut router, log) = router();
    router.handle_utterance("volume down", at(0.0));
    spoken(&mut router);

    let decision = router.handle_utterance("banana", at(1.0));
    assert_eq!(decision.outcome, Outcome::Prompted);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Say a number from one to ten."));

    let decision = router.handle_utterance("banana", at(2.0));
    assert_eq!(decision.outcome, Outcome::Cancelled);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Cancelled."));
    assert!(router.pending(at(2.0)).is_none());
    assert_eq!(log.count(), 0, "nothing should run");
}

#[test]
fn test_cancel_word_drops_pending() {
    let (mut router, log) = router();
    router.handle_utterance("volume up", at(0.0));

    let decision = router.handle_utterance("cancel", at(1.0));
    assert_eq!(decision.route, Route::Cancel);
    assert_eq!(decision.outcome, Outcome::Cancelled);
    assert!(router.pending(at(1.0)).is_none());
    assert_eq!(log.count(), 0);
}

#[test]
fn test_more_while_pending_asks_for_a_number() {
    let (mut router, _log) = router();
    router.handle_utterance("volume up", at(0.0));
    spoken(&mut router);

    let decision = router.handle_utterance("more", at(1.0));
    assert_eq!(decision.route, Route::Clarification);
    assert_eq!(decision.outcome, Outcome::Prompted);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Say a number."));
    assert!(router.pending(at(1.0)).is_some(), "pending action survives");
}

#[test]
fn test_stray_number_is_not_now() {
    let (mut router, log) = router();
    let decision = router.handle_utterance("five", at(0.0));
    assert_eq!(decision.route, Route::Clarification);
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Not now."));
    assert_eq!(log.count(), 0);
}

#[test]
fn test_pending_expires_after_ttl() {
    let (mut router, log) = router();
    router.handle_utterance("volume up", at(0.0));

    // 8s ttl; the answer arrives at 9s
    let decision = router.handle_utterance("three", at(9.0));
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Not now."));
    assert_eq!(log.count(), 0, "expired clarification must not execute");
}

#[test]
fn test_silence_clears_pending() {
    let (mut router, _log) = router();
    router.handle_utterance("volume up", at(0.0));

    let decision = router.handle_silence(at(3.0));
    assert_eq!(decision.route, Route::Clarification);
    assert_eq!(decision.outcome, Outcome::Cancelled);
    assert!(router.pending(at(3.0)).is_none());

    let decision = router.handle_silence(at(4.0));
    assert_eq!(decision.outcome, Outcome::Idle, "plain silence does nothing");
}

#[test]
fn test_wake_word_before_answer_keeps_pending() {
    let (mut router, log) = router();
    router.handle_utterance("volume up", at(0.0));
    spoken(&mut router);

    // 1. The answer arrives behind the wake word
    let decision = router.handle_utterance("murmur three", at(1.0));
    assert_eq!(decision.route, Route::Clarification);
    assert_eq!(decision.outcome, Outcome::Executed);
    assert_eq!(log.last().and_then(|(_, e)| e.steps()), Some(3));
    assert!(!spoken(&mut router).contains(&"Not now.".to_string()));
}

#[test]
fn test_bare_wake_word_while_pending() {
    let (mut router, log) = router();
    router.handle_utterance("brightness down", at(0.0));
    spoken(&mut router);

    let decision = router.handle_utterance("murmur", at(1.0));
    assert_eq!(decision.outcome, Outcome::Woken);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("I am here."));
    assert!(router.pending(at(1.0)).is_some(), "the question is still open");

    router.handle_utterance("four", at(2.0));
    let (intent, entities) = log.last().expect("executor called");
    assert_eq!(intent, IntentKind::BrightnessChange);
    assert_eq!(entities.direction(), Some(Direction::Down));
    assert_eq!(entities.steps(), Some(4));
}

#[test]
fn test_step_phrase_with_level_sets_volume() {
    let (mut router, log) = router();

    // 1. "to 50" is a level, never two steps
    let decision = router.handle_utterance("volume up to 50", at(0.0));
    assert_eq!(decision.route, Route::Direct);
    assert_eq!(decision.outcome, Outcome::Executed);
    let (intent, entities) = log.last().expect("executor called");
    assert_eq!(intent, IntentKind::SetVolume);
    assert_eq!(entities.int(keys::VALUE), Some(50));
    assert_eq!(entities.steps(), None);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Setting volume to 50 percent"));

    // 2. No brightness level intent: the classifier decides, nothing is guessed
    let decision = router.handle_utterance("brightness up to 50", at(20.0));
    assert_eq!(decision.route, Route::Classifier);
    assert_eq!(log.count(), 1);
}

#[test]
fn test_ambiguous_app_asks_which_one() {
    let (mut router, log) = router();

    let decision = router.handle_utterance("open chrom", at(0.0));
    assert_eq!(decision.outcome, Outcome::Prompted);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Which one? 1 chrome, 2 chromium."));
    assert_eq!(router.pending(at(0.0)).map(|p| p.kind), Some(PendingKind::NeedChoice));

    // Out of range counts as an invalid answer
    let decision = router.handle_utterance("seven", at(1.0));
    assert_eq!(decision.outcome, Outcome::Prompted);

    let decision = router.handle_utterance("two", at(2.0));
    assert_eq!(decision.outcome, Outcome::Executed);
    let (intent, entities) = log.last().expect("executor called");
    assert_eq!(intent, IntentKind::OpenApp);
    assert_eq!(entities.app(), Some("chromium"));
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Opening chromium"));
}

#[test]
fn test_bare_open_asks_which_app() {
    let (mut router, log) = router();

    let decision = router.handle_utterance("open", at(0.0));
    assert_eq!(decision.outcome, Outcome::Prompted);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Which app?"));

    let decision = router.handle_utterance("music", at(1.0));
    assert_eq!(decision.outcome, Outcome::Executed);
    assert_eq!(
        log.last().and_then(|(_, e)| e.app().map(str::to_string)).as_deref(),
        Some("spotify")
    );
}

#[test]
fn test_unknown_target_reprompts() {
    let (mut router, log) = router();
    router.handle_utterance("open", at(0.0));
    spoken(&mut router);

    let decision = router.handle_utterance("photoshop", at(1.0));
    assert_eq!(decision.outcome, Outcome::Prompted);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Which app?"));
    assert_eq!(log.count(), 0);
}

#[test]
fn test_bare_app_name_needs_exact_match() {
    let (mut router, log) = router();

    let decision = router.handle_utterance("Google Chrome", at(0.0));
    assert_eq!(decision.route, Route::Direct);
    assert_eq!(decision.outcome, Outcome::Executed);
    assert_eq!(
        log.last().and_then(|(_, e)| e.app().map(str::to_string)).as_deref(),
        Some("chrome")
    );

    // A fragment goes to the classifier, which knows nothing here
    let decision = router.handle_utterance("chrom", at(1.0));
    assert_eq!(decision.route, Route::Classifier);
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(log.count(), 1);
}

#[test]
fn test_repeat_replays_last_action() {
    let (mut router, log) = router();

    let decision = router.handle_utterance("repeat", at(0.0));
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Nothing to repeat."));

    router.handle_utterance("open spotify", at(1.0));
    let decision = router.handle_utterance("again", at(2.0));
    assert_eq!(decision.route, Route::Repeat);
    assert_eq!(decision.outcome, Outcome::Executed);
    assert_eq!(log.intents(), vec![IntentKind::OpenApp, IntentKind::OpenApp]);
    assert_eq!(router.history().len(), 2, "a replay is a new history record");
    assert_eq!(router.telemetry().snapshot().action_stats.repeated, 1);
}

#[test]
fn test_mute_then_undo() {
    let (mut router, log) = router();

    let decision = router.handle_utterance("mute", at(0.0));
    assert_eq!(decision.route, Route::Mute);
    assert_eq!(decision.outcome, Outcome::Executed);
    assert!(spoken(&mut router).is_empty(), "mute stays quiet");

    let decision = router.handle_utterance("undo", at(1.0));
    assert_eq!(decision.route, Route::Undo);
    assert_eq!(decision.outcome, Outcome::Executed);
    assert_eq!(log.intents(), vec![IntentKind::Mute, IntentKind::Unmute]);
    assert!(router.history().is_empty(), "undone record leaves history");
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Undone."));

    let decision = router.handle_utterance("undo", at(2.0));
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Nothing to undo."));
}

#[test]
fn test_failed_action_is_not_recorded() {
    let (mut router, log) = router();
    log.fail(IntentKind::OpenApp);

    let decision = router.handle_utterance("open notepad", at(0.0));
    assert_eq!(decision.outcome, Outcome::Failed);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Sorry, I couldn't open it."));
    assert!(router.history().is_empty(), "failures never reach history");
    assert!(router.context(at(0.0)).is_none(), "failures never set context");

    let decision = router.handle_utterance("repeat", at(1.0));
    assert_eq!(decision.outcome, Outcome::Rejected, "failures are not remembered for repeat");
}

#[test]
fn test_wake_word_alone_waits_for_command() {
    let (mut router, log) = router();

    let decision = router.handle_utterance("hey murmur", at(0.0));
    assert_eq!(decision.route, Route::Wake);
    assert_eq!(decision.outcome, Outcome::Woken);
    assert_eq!(router.listen_mode(at(0.0)), ListenMode::Command);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("I am here."));

    let decision = router.handle_silence(at(5.0));
    assert_eq!(decision.outcome, Outcome::Idle);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("I didn't catch that."));
    assert_eq!(router.listen_mode(at(5.0)), ListenMode::WakeWord);

    let decision = router.handle_utterance("murmur open notes", at(6.0));
    assert_eq!(decision.outcome, Outcome::Executed);
    assert_eq!(
        log.last().and_then(|(_, e)| e.app().map(str::to_string)).as_deref(),
        Some("notepad")
    );
}

#[test]
fn test_classifier_step_label_without_magnitude_asks() {
    let classifier = ScriptedClassifier::new().reply("crank it", "volume_up", 0.9);
    let (mut router, log) = router_with(AssistantConfig::default(), classifier);

    let decision = router.handle_utterance("crank it", at(0.0));
    assert_eq!(decision.route, Route::Classifier);
    assert_eq!(decision.outcome, Outcome::Prompted);
    assert_eq!(router.pending(at(0.0)).map(|p| p.kind), Some(PendingKind::NeedSteps));

    router.handle_utterance("tree", at(1.0));
    let (_, entities) = log.last().expect("executor called");
    assert_eq!(entities.steps(), Some(3), "misheard 'three' still counts");
}

#[test]
fn test_classifier_set_volume() {
    let classifier = ScriptedClassifier::new().reply("set volume to 40", "set_volume", 0.85);
    let (mut router, log) = router_with(AssistantConfig::default(), classifier);

    let decision = router.handle_utterance("set volume to 40", at(0.0));
    assert_eq!(decision.outcome, Outcome::Executed);
    assert_eq!(router.scheduler().count(), 0, "'to 40' is a value, not a delay");
    let (intent, entities) = log.last().expect("executor called");
    assert_eq!(intent, IntentKind::SetVolume);
    assert_eq!(entities.int(keys::VALUE), Some(40));
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Setting volume to 40 percent"));
}

#[test]
fn test_classifier_volume_label_with_percent_sets_absolute() {
    let classifier = ScriptedClassifier::new().reply("volume at 150 percent", "volume_up", 0.7);
    let (mut router, log) = router_with(AssistantConfig::default(), classifier);

    let decision = router.handle_utterance("volume at 150 percent", at(0.0));
    assert_eq!(decision.outcome, Outcome::Executed);
    let (intent, entities) = log.last().expect("executor called");
    assert_eq!(intent, IntentKind::SetVolume);
    assert_eq!(entities.int(keys::VALUE), Some(100), "value caps at 100");
}

#[test]
fn test_low_margin_is_not_confident() {
    let clear_call = ScriptedClassifier::new().reply("lock it down", "lock", 0.5);
    let (mut router, log) = router_with(AssistantConfig::default(), clear_call);
    assert_eq!(router.handle_utterance("lock it down", at(0.0)).outcome, Outcome::Executed);

    let close_call =
        ScriptedClassifier::new().reply_with_runner_up("lock it down", "lock", 0.5, 0.48);
    let (mut unsure, unsure_log) = router_with(AssistantConfig::default(), close_call);
    let decision = unsure.handle_utterance("lock it down", at(0.0));
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(last_spoken(&mut unsure).as_deref(), Some("I'm not sure what you mean."));
    assert_eq!(unsure_log.count(), 0);
    assert_eq!(log.intents(), vec![IntentKind::Lock]);
}

#[test]
fn test_classifier_offline_fails_gracefully() {
    let (mut router, log) = router_with(AssistantConfig::default(), ScriptedClassifier::offline());

    let decision = router.handle_utterance("crank it", at(0.0));
    assert_eq!(decision.route, Route::Classifier);
    assert_eq!(decision.outcome, Outcome::Failed);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("I'm not sure what you mean."));
    assert_eq!(log.count(), 0);
    assert_eq!(router.telemetry().snapshot().dialogue_stats.classifier_outages, 1);

    // Direct phrases still work without the model
    assert_eq!(router.handle_utterance("open spotify", at(1.0)).outcome, Outcome::Executed);
}

#[test]
fn test_short_continuation_merges_with_context() {
    let classifier = ScriptedClassifier::new()
        .reply("and spotify", "open_app", 0.3)
        .reply("also notes", "close_app", 0.3);
    let (mut router, log) = router_with(AssistantConfig::default(), classifier);

    router.handle_utterance("open chrome", at(0.0));

    // 1. Same label, low confidence: merged
    let decision = router.handle_utterance("and spotify", at(2.0));
    assert_eq!(decision.route, Route::Classifier);
    assert_eq!(decision.outcome, Outcome::Executed);
    assert_eq!(
        log.last().and_then(|(_, e)| e.app().map(str::to_string)).as_deref(),
        Some("spotify")
    );

    // 2. Different label: not merged, context dropped
    let decision = router.handle_utterance("also notes", at(3.0));
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(log.count(), 2);
    assert!(router.context(at(3.0)).is_none());
}

#[test]
fn test_continuation_after_context_expiry_is_rejected() {
    let classifier = ScriptedClassifier::new().reply("and spotify", "open_app", 0.3);
    let (mut router, log) = router_with(AssistantConfig::default(), classifier);

    router.handle_utterance("open chrome", at(0.0));
    let decision = router.handle_utterance("and spotify", at(8.0));
    assert_eq!(decision.outcome, Outcome::Rejected, "context lasts 7.5s");
    assert_eq!(log.count(), 1);
}

#[test]
fn test_deferred_command_fires_when_due() {
    let (mut router, log) = router();

    // 1. Schedule
    let decision = router.handle_utterance("open spotify in 10 seconds", at(0.0));
    assert_eq!(decision.route, Route::Deferred);
    assert_eq!(decision.outcome, Outcome::Scheduled);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Okay. I'll do it in 10 seconds."));
    assert_eq!(log.count(), 0, "nothing runs at schedule time");

    // 2. Not yet
    assert_eq!(router.run_due_tasks(at(9.0)), 0);

    // 3. Due
    assert_eq!(router.run_due_tasks(at(10.0)), 1);
    assert_eq!(
        log.last().and_then(|(_, e)| e.app().map(str::to_string)).as_deref(),
        Some("spotify")
    );
    assert_eq!(router.history().len(), 1);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Opening spotify"));
    assert_eq!(router.scheduler().count(), 0);
}

#[test]
fn test_deferred_step_uses_default_magnitude() {
    let (mut router, log) = router();
    router.handle_utterance("volume up in 1 minute", at(0.0));
    router.run_due_tasks(at(60.0));
    let (intent, entities) = log.last().expect("task fired");
    assert_eq!(intent, IntentKind::VolumeChange);
    assert_eq!(entities.steps(), Some(6));
}

#[test]
fn test_deferred_failure_is_reported() {
    let (mut router, log) = router();
    log.fail(IntentKind::Screenshot);
    router.handle_utterance("screenshot in 5", at(0.0));
    spoken(&mut router);

    assert_eq!(router.run_due_tasks(at(5.0)), 1);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("I couldn't complete that."));
    assert!(router.history().is_empty());
}

#[test]
fn test_deferred_limits() {
    let mut config = AssistantConfig::default();
    config.scheduler.max_tasks = 1;
    let (mut router, _log) = router_with(config, ScriptedClassifier::new());

    let decision = router.handle_utterance("after 61 minutes open spotify", at(0.0));
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("I couldn't schedule that."));

    let decision = router.handle_utterance("dance wildly in 5 seconds", at(0.5));
    assert_eq!(decision.outcome, Outcome::Rejected, "unknown deferred command");
    assert_eq!(last_spoken(&mut router).as_deref(), Some("I'm not sure what you mean."));

    assert_eq!(router.handle_utterance("open chrome 15", at(1.0)).outcome, Outcome::Scheduled);
    let decision = router.handle_utterance("open notepad in 20 seconds", at(2.0));
    assert_eq!(decision.outcome, Outcome::Rejected);
    assert_eq!(last_spoken(&mut router).as_deref(), Some("Queue is full."));
}

#[test]
fn test_step_magnitude_is_not_a_delay() {
    let (mut router, log) = router();
    let decision = router.handle_utterance("volume up 3", at(0.0));
    assert_eq!(decision.route, Route::Direct);
    assert_eq!(decision.outcome, Outcome::Executed);
    assert_eq!(router.scheduler().count(), 0);
    assert_eq!(log.last().and_then(|(_, e)| e.steps()), Some(3));
}

#[test]
fn test_turn_telemetry_counts() {
    let (mut router, _log) = router();
    router.handle_utterance("volume up", at(0.0));
    router.handle_utterance("two", at(1.0));
    router.handle_utterance("five", at(20.0));

    let stats = router.telemetry().snapshot();
    assert_eq!(stats.turn_stats.total, 3);
    assert_eq!(stats.turn_stats.prompted, 1);
    assert_eq!(stats.turn_stats.executed, 1);
    assert_eq!(stats.turn_stats.rejected, 1);
    assert_eq!(stats.dialogue_stats.clarifications, 1);
    assert_eq!(stats.dialogue_stats.follow_mode_arms, 1);
}
