use tracing::{debug, info, warn};

use super::{Decision, Outcome, Route, Router};
use crate::kernel::history::ActionRecord;
use crate::kernel::intent::{Executor, IntentClassifier};
use crate::kernel::speech::planner::{undone_text, Cue};
use crate::kernel::telemetry::event::ActionOrigin;
use crate::kernel::telemetry::TelemetryEvent;
use crate::kernel::time::Timestamp;

impl<E: Executor, C: IntentClassifier> Router<E, C> {
    /// Reverts the most recent action. Undo itself never enters history.
    pub(super) fn undo_last(&mut self, _now: Timestamp) -> Decision {
        let Some(record) = self.history.get_last().cloned() else {
            self.speak(Cue::NothingToUndo);
            return Decision::new(Route::Undo, Outcome::Rejected);
        };
        let Some(inverse) = record.inverse_action.clone() else {
            debug!(record = record.id, intent = %record.action_intent, "no inverse");
            self.speak(Cue::CannotUndo);
            return Decision::new(Route::Undo, Outcome::Rejected);
        };
        if !self.run(&inverse, ActionOrigin::Undo) {
            return self.undo_failed(&record);
        }
        self.history.pop_last();
        self.after_undo(1);
        Decision::new(Route::Undo, Outcome::Executed)
    }

    /// Reverts every action of the latest chain, newest first.
    ///
    /// All or nothing up front: one record without an inverse refuses the
    /// whole chain. A failing inverse stops the walk and leaves the chain in
    /// history so it can be retried.
    pub(super) fn undo_chain(&mut self, _now: Timestamp) -> Decision {
        let Some(chain) = self.history.get_last().map(|r| r.chain_id) else {
            self.speak(Cue::NothingToUndo);
            return Decision::new(Route::Undo, Outcome::Rejected);
        };
        let records: Vec<ActionRecord> = self
            .history
            .get_chain(chain)
            .into_iter()
            .rev()
            .cloned()
            .collect();
        if let Some(blocker) = records.iter().find(|r| r.inverse_action.is_none()) {
            debug!(
                chain,
                record = blocker.id,
                intent = %blocker.action_intent,
                "chain has an irreversible action"
            );
            self.speak(Cue::CannotUndo);
            return Decision::new(Route::Undo, Outcome::Rejected);
        }

        for record in &records {
            let Some(inverse) = &record.inverse_action else { continue };
            if !self.run(inverse, ActionOrigin::Undo) {
                return self.undo_failed(record);
            }
        }

        let removed = self.history.pop_chain(chain).len();
        info!(chain, removed, "chain undone");
        self.after_undo(removed);
        Decision::new(Route::Undo, Outcome::Executed)
    }

    fn after_undo(&mut self, records: usize) {
        self.telemetry.record(TelemetryEvent::UndoApplied { records });
        self.context.clear_context();
        self.last_step.clear();
        self.follow_mode.clear();
        self.history.break_chain();
        self.speak_text(Cue::Undone, undone_text(records));
    }

    fn undo_failed(&mut self, record: &ActionRecord) -> Decision {
        warn!(record = record.id, intent = %record.action_intent, "undo failed");
        self.history.break_chain();
        self.speak(Cue::ExecError);
        Decision::new(Route::Undo, Outcome::Failed)
    }
}
