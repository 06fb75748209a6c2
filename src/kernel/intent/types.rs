use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity keys shared between the router, the managers and the executor.
pub mod keys {
    pub const APP: &str = "app";
    pub const DIRECTION: &str = "direction";
    pub const MAGNITUDE_STEPS: &str = "magnitude_steps";
    pub const VALUE: &str = "value";
    pub const CANDIDATES: &str = "candidates";
    pub const CANCEL: &str = "cancel";
}

/// Every action the assistant knows how to ask an executor for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    VolumeChange,
    BrightnessChange,
    SetVolume,
    OpenApp,
    CloseApp,
    CloseActive,
    SwitchWindow,
    WindowSwitchStep,
    WindowSwitchEnd,
    Mute,
    Unmute,
    Shutdown,
    Restart,
    Lock,
    OpenTerminal,
    ShowDesktop,
    Screenshot,
    TaskManager,
}

impl IntentKind {
    pub const ALL: [IntentKind; 18] = [
        IntentKind::VolumeChange,
        IntentKind::BrightnessChange,
        IntentKind::SetVolume,
        IntentKind::OpenApp,
        IntentKind::CloseApp,
        IntentKind::CloseActive,
        IntentKind::SwitchWindow,
        IntentKind::WindowSwitchStep,
        IntentKind::WindowSwitchEnd,
        IntentKind::Mute,
        IntentKind::Unmute,
        IntentKind::Shutdown,
        IntentKind::Restart,
        IntentKind::Lock,
        IntentKind::OpenTerminal,
        IntentKind::ShowDesktop,
        IntentKind::Screenshot,
        IntentKind::TaskManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::VolumeChange => "volume_change",
            IntentKind::BrightnessChange => "brightness_change",
            IntentKind::SetVolume => "set_volume",
            IntentKind::OpenApp => "open_app",
            IntentKind::CloseApp => "close_app",
            IntentKind::CloseActive => "close_active",
            IntentKind::SwitchWindow => "switch_window",
            IntentKind::WindowSwitchStep => "window_switch_step",
            IntentKind::WindowSwitchEnd => "window_switch_end",
            IntentKind::Mute => "mute",
            IntentKind::Unmute => "unmute",
            IntentKind::Shutdown => "shutdown",
            IntentKind::Restart => "restart",
            IntentKind::Lock => "lock",
            IntentKind::OpenTerminal => "open_terminal",
            IntentKind::ShowDesktop => "show_desktop",
            IntentKind::Screenshot => "screenshot",
            IntentKind::TaskManager => "task_manager",
        }
    }

    /// Base intents that take a direction and a step count.
    pub fn is_stepped(&self) -> bool {
        matches!(self, IntentKind::VolumeChange | IntentKind::BrightnessChange)
    }

    pub fn is_close(&self) -> bool {
        matches!(self, IntentKind::CloseApp | IntentKind::CloseActive)
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent `{0}`")]
pub struct UnknownIntent(pub String);

impl FromStr for IntentKind {
    type Err = UnknownIntent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        IntentKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownIntent(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "UP" => Some(Direction::Up),
            "DOWN" => Some(Direction::Down),
            _ => None,
        }
    }
}

/// Ordered string-keyed argument map handed to the executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entities(BTreeMap<String, Value>);

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn app(&self) -> Option<&str> {
        self.str(keys::APP)
    }

    pub fn direction(&self) -> Option<Direction> {
        self.str(keys::DIRECTION).and_then(Direction::parse)
    }

    pub fn steps(&self) -> Option<i64> {
        self.int(keys::MAGNITUDE_STEPS)
    }

    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    }

    /// Copy without the given keys.
    pub fn without(&self, drop: &[&str]) -> Self {
        let mut out = self.clone();
        for key in drop {
            out.0.remove(*key);
        }
        out
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// An intent with its arguments: the unit the executor, history and scheduler deal in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub intent: IntentKind,
    pub entities: Entities,
}

impl Action {
    pub fn new(intent: IntentKind, entities: Entities) -> Self {
        Self { intent, entities }
    }

    pub fn bare(intent: IntentKind) -> Self {
        Self { intent, entities: Entities::new() }
    }

    pub fn step(intent: IntentKind, direction: Direction, steps: u8, base: &Entities) -> Self {
        let entities = base
            .clone()
            .with(keys::DIRECTION, direction.as_str())
            .with(keys::MAGNITUDE_STEPS, steps);
        Self { intent, entities }
    }

    pub fn open(app_id: &str) -> Self {
        Self::new(IntentKind::OpenApp, Entities::new().with(keys::APP, app_id))
    }

    pub fn close(app_id: &str) -> Self {
        Self::new(IntentKind::CloseApp, Entities::new().with(keys::APP, app_id))
    }

    /// A stepped action that carries both a direction and a magnitude.
    pub fn is_step(&self) -> bool {
        self.intent.is_stepped()
            && self.entities.direction().is_some()
            && self.entities.steps().is_some()
    }
}

/// Result of the remote intent model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: String,
    pub confidence: f32,
    /// Confidence of the second-best class, when the model reports one.
    #[serde(default)]
    pub runner_up: Option<f32>,
}

impl Classification {
    pub fn new(intent: &str, confidence: f32) -> Self {
        Self { intent: intent.to_string(), confidence, runner_up: None }
    }

    pub fn with_runner_up(mut self, confidence: f32) -> Self {
        self.runner_up = Some(confidence);
        self
    }

    /// Gap between the top two classes. Without a runner-up the gap is the full confidence.
    pub fn margin(&self) -> f32 {
        self.confidence - self.runner_up.unwrap_or(0.0)
    }
}
