use crate::kernel::intent::Action;

/// What "repeat" replays: the last command text and the last executed action.
#[derive(Debug, Clone, Default)]
pub struct ShortMemory {
    last_command: Option<String>,
    last_action: Option<Action>,
}

impl ShortMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember_command(&mut self, text: &str) {
        self.last_command = Some(text.to_string());
    }

    pub fn remember_action(&mut self, action: Action) {
        self.last_action = Some(action);
    }

    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    pub fn last_action(&self) -> Option<&Action> {
        self.last_action.as_ref()
    }

    pub fn clear(&mut self) {
        self.last_command = None;
        self.last_action = None;
    }
}
