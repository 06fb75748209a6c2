use serde::{Deserialize, Serialize};

use crate::kernel::dialogue::PendingKind;
use crate::kernel::intent::IntentKind;
use crate::kernel::router::{Outcome, Route};

// Allowed: enums, intent kinds, ids, counts, durations
// Forbidden: utterance text, entity values

#[derive(Debug, Clone, Serialize)]
pub enum TelemetryEvent {
    Turn {
        route: Route,
        outcome: Outcome,
    },

    ActionExecuted {
        intent: IntentKind,
        origin: ActionOrigin,
    },

    ActionFailed {
        intent: IntentKind,
        origin: ActionOrigin,
    },

    ClarificationRequested {
        kind: PendingKind,
    },

    ClarificationCancelled,

    FollowModeArmed,

    UndoApplied {
        records: usize,
    },

    TaskScheduled {
        task_id: u64,
        delay_secs: u64,
    },

    TaskFired {
        task_id: u64,
        ok: bool,
    },

    ConfirmationResolved {
        accepted: bool,
    },

    ClassifierUnavailable,
}

/// Why an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOrigin {
    User,
    Repeat,
    Undo,
    Scheduled,
}
