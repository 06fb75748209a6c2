//! Modal states that swallow every utterance until they end: the yes/no
//! confirmation and window switching.

use tracing::{debug, info};

use super::{Decision, Outcome, Route, Router, WindowSwitch};
use crate::kernel::dialogue::confirm::{classify_reply, MAX_UNCLEAR_REPLIES};
use crate::kernel::dialogue::{ConfirmReply, ConfirmRequest};
use crate::kernel::intent::{keys, Action, Entities, Executor, IntentClassifier, IntentKind};
use crate::kernel::speech::planner::Cue;
use crate::kernel::telemetry::event::ActionOrigin;
use crate::kernel::telemetry::TelemetryEvent;
use crate::kernel::time::Timestamp;

impl<E: Executor, C: IntentClassifier> Router<E, C> {
    // --- Confirmation ------------------------------------------------------

    pub(super) fn request_confirmation(
        &mut self,
        action: Action,
        text: Option<&str>,
        now: Timestamp,
        route: Route,
    ) -> Decision {
        debug!(intent = %action.intent, "confirmation required");
        let request = ConfirmRequest::Execute { action, text: text.map(str::to_string) };
        self.confirmation.begin(request, now);
        self.speak(Cue::AreYouSure);
        Decision::new(route, Outcome::Prompted)
    }

    pub(super) fn confirmation_reply(&mut self, t0: &str, now: Timestamp) -> Decision {
        let phrases = &self.config.phrases;
        match classify_reply(t0, &phrases.confirm_yes, &phrases.confirm_no) {
            ConfirmReply::Yes => {
                let Some(request) = self.confirmation.take(now) else {
                    return Decision::new(Route::Confirmation, Outcome::Idle);
                };
                self.telemetry.record(TelemetryEvent::ConfirmationResolved { accepted: true });
                info!(intent = %request.action().intent, "confirmed");
                match request {
                    ConfirmRequest::Execute { action, text } => {
                        self.execute_now(
                            action,
                            text.as_deref(),
                            Route::Confirmation,
                            ActionOrigin::User,
                            now,
                        )
                    }
                    ConfirmRequest::Schedule { action, delay_seconds } => {
                        self.schedule(action, delay_seconds, Route::Confirmation, now)
                    }
                }
            }
            ConfirmReply::No => self.decline_confirmation(now),
            ConfirmReply::Unclear => {
                let replies = self.confirmation.register_unclear(now);
                if replies >= MAX_UNCLEAR_REPLIES {
                    return self.decline_confirmation(now);
                }
                self.speak(Cue::ConfirmRetry);
                Decision::new(Route::Confirmation, Outcome::Prompted)
            }
        }
    }

    pub(super) fn decline_confirmation(&mut self, now: Timestamp) -> Decision {
        if let Some(request) = self.confirmation.take(now) {
            debug!(intent = %request.action().intent, "confirmation declined");
        }
        self.telemetry.record(TelemetryEvent::ConfirmationResolved { accepted: false });
        self.context.clear_context();
        self.history.break_chain();
        self.speak(Cue::Cancelled);
        Decision::new(Route::Confirmation, Outcome::Cancelled)
    }

    // --- Window switching --------------------------------------------------

    pub(super) fn enter_window_switch(&mut self) {
        info!("window switch mode");
        self.last_step.clear();
        self.follow_mode.clear();
        self.window_switch = Some(WindowSwitch::default());
        self.speak(Cue::WindowSwitchMode);
    }

    pub(super) fn window_switch_input(&mut self, t0: &str) -> Decision {
        if let Some(mode) = self.window_switch.as_mut() {
            mode.silence_hits = 0;
        }
        let phrases = &self.config.phrases;
        let step = if phrases.window_right.contains(t0) {
            Some("right")
        } else if phrases.window_left.contains(t0) {
            Some("left")
        } else {
            None
        };
        if let Some(direction) = step {
            let action = Action::new(
                IntentKind::WindowSwitchStep,
                Entities::new().with(keys::DIRECTION, direction),
            );
            if !self.run(&action, ActionOrigin::User) {
                return self.fail(&action, Route::WindowSwitch);
            }
            return Decision::new(Route::WindowSwitch, Outcome::Executed);
        }
        if self.config.phrases.window_done.contains(t0) {
            return self.end_window_switch(false);
        }
        if self.config.phrases.window_cancel.contains(t0) {
            return self.end_window_switch(true);
        }
        self.history.break_chain();
        self.speak(Cue::WindowSwitchHelp);
        Decision::new(Route::WindowSwitch, Outcome::Rejected)
    }

    /// Ends the mode. `cancel` restores the original window instead of keeping the selection.
    pub(super) fn end_window_switch(&mut self, cancel: bool) -> Decision {
        let action = Action::new(
            IntentKind::WindowSwitchEnd,
            Entities::new().with(keys::CANCEL, cancel),
        );
        let ok = self.run(&action, ActionOrigin::User);
        self.window_switch = None;
        info!(cancel, ok, "window switch ended");
        if !ok {
            return self.fail(&action, Route::WindowSwitch);
        }
        if cancel {
            self.speak(Cue::Cancelled);
            Decision::new(Route::WindowSwitch, Outcome::Cancelled)
        } else {
            self.speak(Cue::WindowSwitchDone);
            Decision::new(Route::WindowSwitch, Outcome::Executed)
        }
    }
}
