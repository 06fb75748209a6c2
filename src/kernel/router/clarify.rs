//! Answers to "How much?", "Which one?" and "Which app?".

use tracing::debug;

use super::direct::AppPick;
use super::{Decision, Outcome, Route, Router};
use crate::kernel::dialogue::{PendingAction, PendingKind, MAX_INVALID_ATTEMPTS};
use crate::kernel::intent::registry::StepSpec;
use crate::kernel::intent::{
    keys, Action, Direction, Entities, Executor, IntentClassifier, IntentKind,
};
use crate::kernel::parse::{clamp_steps, parse_numeric};
use crate::kernel::speech::planner::{choice_prompt, Cue};
use crate::kernel::telemetry::event::ActionOrigin;
use crate::kernel::time::Timestamp;
use crate::services::apps::{extract_close_target, extract_open_target};

/// Longest list read out for "Which one?".
const MAX_CHOICES: usize = 10;

impl<E: Executor, C: IntentClassifier> Router<E, C> {
    /// `None` when no clarification is owed and the utterance is not a stray number.
    pub(super) fn clarification_turn(
        &mut self,
        text: &str,
        t0: &str,
        pending_active: bool,
        now: Timestamp,
    ) -> Option<Decision> {
        if !pending_active {
            if parse_numeric(t0).is_some() {
                self.speak(Cue::NotNow);
                return Some(Decision::new(Route::Clarification, Outcome::Rejected));
            }
            return None;
        }
        if self.config.phrases.more.contains(t0) || self.config.phrases.less.contains(t0) {
            self.speak(Cue::SayNumber);
            return Some(Decision::new(Route::Clarification, Outcome::Prompted));
        }

        let pending = self.follow_up.get_pending(now).cloned()?;
        let decision = match pending.kind {
            PendingKind::NeedSteps => match parse_numeric(t0) {
                Some(steps) => self.answer_steps(&pending, steps, text, now),
                None => self.invalid_answer(&pending, now),
            },
            PendingKind::NeedChoice => {
                let in_range =
                    |n: u8| pending.max_choice.map_or(false, |max| (1..=max).contains(&n));
                match parse_numeric(t0).filter(|n| in_range(*n)) {
                    Some(choice) => self.answer_choice(&pending, choice, text, now),
                    None => self.invalid_answer(&pending, now),
                }
            }
            PendingKind::NeedTarget => {
                let name = extract_open_target(t0)
                    .or_else(|| extract_close_target(t0))
                    .unwrap_or_else(|| t0.to_string());
                match self.resolve_app(&name) {
                    AppPick::One(id) => {
                        self.follow_up.clear_pending();
                        let action =
                            Action::new(pending.base_intent, Entities::new().with(keys::APP, id));
                        self.perform(action, Some(text), Route::Clarification, now)
                    }
                    AppPick::Many(ids) => {
                        self.follow_up.clear_pending();
                        self.ask_choice(pending.base_intent, ids, Route::Clarification, now)
                    }
                    AppPick::Missing => self.invalid_answer(&pending, now),
                }
            }
        };
        Some(decision)
    }

    fn answer_steps(
        &mut self,
        pending: &PendingAction,
        steps: u8,
        text: &str,
        now: Timestamp,
    ) -> Decision {
        let direction = pending.direction.unwrap_or(Direction::Up);
        let action = Action::step(
            pending.base_intent,
            direction,
            clamp_steps(i64::from(steps)),
            &pending.entities,
        );
        self.follow_up.clear_pending();
        self.execute_now(action, Some(text), Route::Clarification, ActionOrigin::User, now)
    }

    fn answer_choice(
        &mut self,
        pending: &PendingAction,
        choice: u8,
        text: &str,
        now: Timestamp,
    ) -> Decision {
        let candidates = pending.entities.string_list(keys::CANDIDATES);
        let Some(id) = candidates.get(usize::from(choice) - 1) else {
            return self.invalid_answer(pending, now);
        };
        debug!(choice, app = %id, "choice made");
        self.follow_up.clear_pending();
        let action = Action::new(pending.base_intent, Entities::new().with(keys::APP, id.as_str()));
        self.perform(action, Some(text), Route::Clarification, now)
    }

    fn invalid_answer(&mut self, pending: &PendingAction, now: Timestamp) -> Decision {
        let attempts = self.follow_up.register_invalid_attempt(now);
        debug!(attempts, kind = ?pending.kind, "invalid clarification answer");
        if attempts >= MAX_INVALID_ATTEMPTS {
            self.cancel_pending(true);
            self.history.break_chain();
            return Decision::new(Route::Clarification, Outcome::Cancelled);
        }
        let cue = match pending.kind {
            PendingKind::NeedTarget => Cue::WhichApp,
            PendingKind::NeedSteps | PendingKind::NeedChoice => Cue::NeedNumber,
        };
        self.speak(cue);
        Decision::new(Route::Clarification, Outcome::Prompted)
    }

    /// Runs the step now, or asks "How much?" when no magnitude was given.
    pub(super) fn step_request(
        &mut self,
        spec: StepSpec,
        steps: Option<u8>,
        text: &str,
        route: Route,
        now: Timestamp,
    ) -> Decision {
        match steps {
            Some(steps) => {
                let action = Action::step(spec.base, spec.direction, steps, &Entities::new());
                self.perform(action, Some(text), route, now)
            }
            None => {
                self.set_pending(
                    PendingAction::need_steps(spec.base, spec.direction, Entities::new()),
                    now,
                );
                self.speak(Cue::HowMuch);
                Decision::new(route, Outcome::Prompted)
            }
        }
    }

    pub(super) fn ask_target(
        &mut self,
        base: IntentKind,
        route: Route,
        now: Timestamp,
    ) -> Decision {
        self.set_pending(PendingAction::need_target(base), now);
        self.speak(Cue::WhichApp);
        Decision::new(route, Outcome::Prompted)
    }

    pub(super) fn ask_choice(
        &mut self,
        base: IntentKind,
        mut ids: Vec<String>,
        route: Route,
        now: Timestamp,
    ) -> Decision {
        ids.truncate(MAX_CHOICES);
        let prompt = choice_prompt(&ids);
        let max = ids.len() as u8;
        let entities = Entities::new().with(keys::CANDIDATES, ids);
        self.set_pending(PendingAction::need_choice(base, entities, max), now);
        self.speak_text(Cue::WhichOne, prompt);
        Decision::new(route, Outcome::Prompted)
    }
}
