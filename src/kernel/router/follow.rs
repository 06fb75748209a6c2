use std::sync::Arc;

use tracing::debug;

use super::{done, Decision, Hop, Outcome, Route, Router};
use crate::kernel::dialogue::follow_mode::{contains_wake_keyword, resolve_follow_mode_gate};
use crate::kernel::dialogue::{FollowGate, FollowInput, FollowVocabulary};
use crate::kernel::intent::{Executor, IntentClassifier};
use crate::kernel::speech::planner::Cue;
use crate::kernel::telemetry::event::ActionOrigin;
use crate::kernel::time::Timestamp;

impl<E: Executor, C: IntentClassifier> Router<E, C> {
    /// `None` when follow mode has nothing to say about this utterance.
    pub(super) fn follow_mode_gate(&mut self, text: &str, t0: &str, now: Timestamp) -> Option<Hop> {
        let config = Arc::clone(&self.config);
        let phrases = &config.phrases;
        let vocab = FollowVocabulary {
            wake_keywords: &phrases.wake_keywords,
            more: &phrases.more,
            less: &phrases.less,
            cancel: &phrases.cancel_words,
        };
        let pending_active = self.follow_up.is_active(now);
        let follow_active = self.follow_mode.is_active(now);
        match resolve_follow_mode_gate(t0, vocab, pending_active, follow_active) {
            FollowGate::Follow(input) => Some(self.follow_mode_turn(input, text, t0, now)),
            FollowGate::RequireWake => {
                self.speak(Cue::SayWakeWord);
                Some(done(Route::FollowMode, Outcome::Rejected))
            }
            FollowGate::PendingBlock | FollowGate::Inactive => None,
        }
    }

    fn follow_mode_turn(
        &mut self,
        input: FollowInput,
        text: &str,
        t0: &str,
        now: Timestamp,
    ) -> Hop {
        match input {
            FollowInput::More => Hop::Done(self.adjust(false, text, Route::FollowMode, now)),
            FollowInput::Less => Hop::Done(self.adjust(true, text, Route::FollowMode, now)),
            FollowInput::Cancel => {
                self.follow_mode.clear();
                self.last_step.clear();
                debug!("follow mode cancelled");
                self.speak(Cue::Okay);
                done(Route::FollowMode, Outcome::Cancelled)
            }
            FollowInput::Wake { tail } => self.wake(tail),
            FollowInput::PendingBlock | FollowInput::Other => {
                if contains_wake_keyword(t0, &self.config.phrases.wake_keywords) {
                    return self.wake(String::new());
                }
                self.speak(Cue::FollowModeHint);
                done(Route::FollowMode, Outcome::Rejected)
            }
        }
    }

    /// Re-applies the last step action: same direction for "more", opposite for "less".
    ///
    /// The remembered direction is kept as-is afterwards, so "less, less" keeps
    /// backing off instead of oscillating.
    pub(super) fn adjust(
        &mut self,
        less: bool,
        text: &str,
        route: Route,
        now: Timestamp,
    ) -> Decision {
        let last = self
            .follow_mode
            .get_last_step_action_if_active(now)
            .cloned()
            .or_else(|| self.last_step.get_if_fresh(now).cloned());
        let Some(last) = last else {
            self.speak(if less { Cue::NothingToAdjust } else { Cue::NothingToRepeat });
            return Decision::new(route, Outcome::Rejected);
        };

        let steps = if self.config.follow_mode.repeat_last_steps { last.steps } else { 1 };
        let direction = if less { last.direction.flip() } else { last.direction };
        let action = last.to_action(direction, steps);
        if !self.run(&action, ActionOrigin::User) {
            return self.fail(&action, route);
        }
        self.commit(&action, Some(text), now);
        self.remember_step(
            last.base_intent,
            last.direction,
            i64::from(steps),
            last.entities.clone(),
            now,
        );
        Decision::new(route, Outcome::Executed)
    }
}
