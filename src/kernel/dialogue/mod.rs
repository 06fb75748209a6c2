//! Conversational state between turns. Everything except `ShortMemory` expires on a TTL.

pub mod confirm;
pub mod context;
pub mod follow_mode;
pub mod followup;
pub mod last_step;
pub mod short_memory;

pub use confirm::{ConfirmReply, ConfirmRequest, ConfirmationGate};
pub use context::{should_merge_context, ContextManager, ContextSnapshot};
pub use follow_mode::{
    FollowGate, FollowInput, FollowModeManager, FollowModeState, FollowVocabulary,
};
pub use followup::{FollowUpManager, PendingAction, PendingKind, MAX_INVALID_ATTEMPTS};
pub use last_step::{LastStepAction, LastStepActionManager};
pub use short_memory::ShortMemory;
