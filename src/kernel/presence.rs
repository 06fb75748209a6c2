use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What the host should listen for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListenMode {
    /// Idle. Only the wake word matters.
    WakeWord,
    /// Just woken. The next utterance is a command.
    Command,
    /// A numeric answer or an app name is owed.
    Clarification,
    /// "more"/"less" accepted without the wake word.
    FollowMode,
    /// Yes or no.
    Confirmation,
    /// Left, right, done, cancel.
    WindowSwitch,
}

impl Default for ListenMode {
    fn default() -> Self {
        Self::WakeWord
    }
}

/// Conversation flags the mode is derived from, highest priority first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenFlags {
    pub window_switch: bool,
    pub confirmation: bool,
    pub clarification: bool,
    pub follow_mode: bool,
    pub awaiting_command: bool,
}

impl ListenMode {
    /// Pure function: conversation flags -> mode.
    pub fn resolve(flags: ListenFlags) -> Self {
        if flags.window_switch {
            ListenMode::WindowSwitch
        } else if flags.confirmation {
            ListenMode::Confirmation
        } else if flags.clarification {
            ListenMode::Clarification
        } else if flags.follow_mode {
            ListenMode::FollowMode
        } else if flags.awaiting_command {
            ListenMode::Command
        } else {
            ListenMode::WakeWord
        }
    }

    /// Whether an utterance must start with the wake word to be routed.
    pub fn requires_wake(&self) -> bool {
        matches!(self, ListenMode::WakeWord)
    }

    /// Suggested recogniser window for this mode.
    pub fn listen_window(&self) -> Duration {
        match self {
            ListenMode::WakeWord => Duration::from_secs(3),
            ListenMode::Command => Duration::from_secs(6),
            ListenMode::Clarification | ListenMode::Confirmation => Duration::from_secs(5),
            ListenMode::FollowMode => Duration::from_secs(4),
            ListenMode::WindowSwitch => Duration::from_secs(4),
        }
    }
}
