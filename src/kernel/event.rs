use super::speech::planner::Cue;

#[derive(Debug, Clone)]
pub enum Event {
    /// External signals (recognised speech, listen-window timeouts)
    Input(InputEvent),
    /// Host-side request to drop a queued deferred command.
    CancelTask { task_id: u64 },
}

#[derive(Debug, Clone)]
pub struct InputEvent {
    pub source: String,
    pub content: InputContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputContent {
    /// Final transcript of one listen window.
    Utterance(String),
    /// The listen window closed with nothing recognised.
    Silence,
}

impl InputEvent {
    pub fn utterance(source: &str, text: &str) -> Self {
        Self {
            source: source.to_string(),
            content: InputContent::Utterance(text.to_string()),
        }
    }

    pub fn silence(source: &str) -> Self {
        Self {
            source: source.to_string(),
            content: InputContent::Silence,
        }
    }
}

/// Work the driver performs after a kernel step. The kernel never does I/O itself.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Log(String),
    Speak { cue: Cue, text: String },
}

impl SideEffect {
    pub fn spoken_text(&self) -> Option<&str> {
        match self {
            SideEffect::Speak { text, .. } => Some(text),
            SideEffect::Log(_) => None,
        }
    }
}
