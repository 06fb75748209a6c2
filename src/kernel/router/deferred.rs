use tracing::{debug, info};

use super::classify::{absolute_level, wants_absolute, Mapped};
use super::{Decision, Outcome, Route, Router};
use crate::kernel::dialogue::ConfirmRequest;
use crate::kernel::intent::registry::intent_key;
use crate::kernel::intent::{Action, Entities, Executor, IntentClassifier, IntentKind};
use crate::kernel::parse::{extract_steps, normalize, DelayRequest};
use crate::kernel::speech::planner::{scheduled_text, Cue};
use crate::kernel::telemetry::TelemetryEvent;
use crate::kernel::time::Timestamp;
use crate::services::apps::{extract_close_target, extract_open_target};

impl<E: Executor, C: IntentClassifier> Router<E, C> {
    /// "volume up 3" and "set volume to 40" carry a magnitude, not a delay.
    pub(super) fn is_magnitude_not_delay(&self, request: &DelayRequest) -> bool {
        if !request.is_bare_trailing_number() {
            return false;
        }
        let last_word = request.action_text.split_whitespace().last().unwrap_or("");
        self.steps.is_step_phrase(&request.action_text) || matches!(last_word, "to" | "by" | "at")
    }

    pub(super) fn defer(&mut self, request: DelayRequest, now: Timestamp) -> Decision {
        let delay = request.delay_seconds;
        if delay > self.scheduler.max_delay_seconds() {
            debug!(delay, "delay too long");
            return self.schedule_rejected(Cue::ScheduleRejected);
        }
        if self.scheduler.is_full() {
            return self.schedule_rejected(Cue::QueueFull);
        }
        let Some(action) = self.infer_action(&request.action_text) else {
            debug!(action_text = %request.action_text, "could not infer deferred action");
            self.context.clear_context();
            self.history.break_chain();
            self.speak(Cue::NotSure);
            return Decision::new(Route::Deferred, Outcome::Rejected);
        };
        if self.needs_confirmation(action.intent) {
            self.confirmation.begin(ConfirmRequest::Schedule { action, delay_seconds: delay }, now);
            self.speak(Cue::AreYouSure);
            return Decision::new(Route::Deferred, Outcome::Prompted);
        }
        self.schedule(action, delay, Route::Deferred, now)
    }

    pub(super) fn schedule(
        &mut self,
        action: Action,
        delay: u64,
        route: Route,
        now: Timestamp,
    ) -> Decision {
        let intent = action.intent;
        match self.scheduler.schedule(action, delay, now) {
            Some(task_id) => {
                info!(task_id, intent = %intent, delay, "task scheduled");
                self.telemetry.record(TelemetryEvent::TaskScheduled { task_id, delay_secs: delay });
                self.speak_text(Cue::Scheduled, scheduled_text(delay));
                Decision::new(route, Outcome::Scheduled)
            }
            None => self.schedule_rejected(Cue::ScheduleRejected),
        }
    }

    fn schedule_rejected(&mut self, cue: Cue) -> Decision {
        self.history.break_chain();
        self.speak(cue);
        Decision::new(Route::Deferred, Outcome::Rejected)
    }

    /// Resolves the command part of a deferred utterance without asking anything.
    ///
    /// Step commands without a magnitude fall back to the configured default.
    fn infer_action(&self, action_text: &str) -> Option<Action> {
        let t = normalize(action_text);
        let phrases = &self.config.phrases;
        let default_steps = self.config.scheduler.default_steps;

        if let Some(kind) = self.commands.lookup(&t) {
            return Some(Action::bare(kind));
        }
        let fixed = [
            (&phrases.switch_window, IntentKind::SwitchWindow),
            (&phrases.close_active, IntentKind::CloseActive),
            (&phrases.mute, IntentKind::Mute),
            (&phrases.unmute, IntentKind::Unmute),
        ];
        if let Some((_, kind)) = fixed.iter().find(|(set, _)| set.contains(&t)) {
            return Some(Action::bare(*kind));
        }
        if let Some(target) = extract_close_target(&t) {
            return self.apps.find(&target).map(|app| Action::close(&app.id));
        }
        if let Some(target) = extract_open_target(&t) {
            return self.apps.find(&target).map(|app| Action::open(&app.id));
        }
        if let Some(step) = self.steps.detect(&t) {
            if let Some(action) = absolute_level(step.spec, &t) {
                return Some(action);
            }
            if !wants_absolute(&step.tail) {
                let steps = extract_steps(&step.tail).unwrap_or(default_steps);
                return Some(Action::step(
                    step.spec.base,
                    step.spec.direction,
                    steps,
                    &Entities::new(),
                ));
            }
        }
        if let Some(app) = self.apps.find(&t) {
            return Some(Action::open(&app.id));
        }

        let result = self.classifier.classify(action_text)?;
        if !self.confident(&result) {
            return None;
        }
        match self.map_classified(&intent_key(&result.intent), action_text) {
            Mapped::Action(action) => Some(action),
            Mapped::NeedSteps(spec) => Some(Action::step(
                spec.base,
                spec.direction,
                default_steps,
                &Entities::new(),
            )),
            Mapped::Adjust { .. }
            | Mapped::Choice { .. }
            | Mapped::UnknownApp
            | Mapped::Unsupported => None,
        }
    }
}
