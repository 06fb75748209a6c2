use std::collections::HashMap;

use super::types::{Direction, IntentKind};
use crate::kernel::parse::text::normalize;

/// Fixed phrase → intent table for argument-free commands.
#[derive(Debug, Clone)]
pub struct CommandTable {
    phrases: HashMap<String, IntentKind>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self { phrases: HashMap::new() }
    }

    pub fn register(&mut self, phrase: &str, intent: IntentKind) {
        self.phrases.insert(normalize(phrase), intent);
    }

    /// Exact phrase lookup. Classifier labels such as `task_manager` resolve too.
    pub fn lookup(&self, phrase: &str) -> Option<IntentKind> {
        let t = normalize(phrase);
        self.phrases
            .get(&t)
            .or_else(|| self.phrases.get(&t.replace('_', " ")))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        let mut table = Self::new();
        for (phrase, intent) in [
            ("shutdown", IntentKind::Shutdown),
            ("shut down", IntentKind::Shutdown),
            ("restart", IntentKind::Restart),
            ("lock", IntentKind::Lock),
            ("lock screen", IntentKind::Lock),
            ("open cmd", IntentKind::OpenTerminal),
            ("open terminal", IntentKind::OpenTerminal),
            ("open command prompt", IntentKind::OpenTerminal),
            ("show desktop", IntentKind::ShowDesktop),
            ("screenshot", IntentKind::Screenshot),
            ("take screenshot", IntentKind::Screenshot),
            ("task manager", IntentKind::TaskManager),
            ("open task manager", IntentKind::TaskManager),
        ] {
            table.register(phrase, intent);
        }
        table
    }
}

/// What a step-required intent such as `volume_up` expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSpec {
    pub base: IntentKind,
    pub direction: Direction,
}

/// Registry of intents that need a magnitude before they can run.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    specs: HashMap<String, StepSpec>,
    // (phrase, step intent name); longest phrases first
    phrases: Vec<(String, String)>,
}

/// A step phrase found at the head of an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMatch {
    pub name: String,
    pub spec: StepSpec,
    /// Words after the phrase, e.g. "by three".
    pub tail: String,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self { specs: HashMap::new(), phrases: Vec::new() }
    }

    pub fn register(&mut self, name: &str, spec: StepSpec, phrases: &[&str]) {
        let name = intent_key(name);
        self.specs.insert(name.clone(), spec);
        for phrase in phrases {
            self.phrases.push((normalize(phrase), name.clone()));
        }
        self.phrases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    }

    /// Looks up a step intent by name (`volume_up`, `Volume Up`, ...).
    pub fn spec(&self, name: &str) -> Option<StepSpec> {
        self.specs.get(&intent_key(name)).copied()
    }

    /// Matches an utterance that is a step phrase, optionally followed by a magnitude.
    pub fn detect(&self, text: &str) -> Option<StepMatch> {
        let t = normalize(text);
        self.phrases.iter().find_map(|(phrase, name)| {
            let tail = if t == *phrase {
                ""
            } else {
                t.strip_prefix(phrase.as_str())?.strip_prefix(' ')?
            };
            let spec = self.specs.get(name)?;
            Some(StepMatch { name: name.clone(), spec: *spec, tail: tail.to_string() })
        })
    }

    pub fn is_step_phrase(&self, text: &str) -> bool {
        self.detect(text).is_some()
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(
            "volume_up",
            StepSpec { base: IntentKind::VolumeChange, direction: Direction::Up },
            &[
                "volume up",
                "sound up",
                "increase volume",
                "turn up the volume",
                "louder",
                "make it louder",
            ],
        );
        registry.register(
            "volume_down",
            StepSpec { base: IntentKind::VolumeChange, direction: Direction::Down },
            &[
                "volume down",
                "sound down",
                "decrease volume",
                "turn down the volume",
                "quieter",
                "make it quieter",
            ],
        );
        registry.register(
            "brightness_up",
            StepSpec { base: IntentKind::BrightnessChange, direction: Direction::Up },
            &["brightness up", "increase brightness", "brighten screen", "make screen brighter"],
        );
        registry.register(
            "brightness_down",
            StepSpec { base: IntentKind::BrightnessChange, direction: Direction::Down },
            &["brightness down", "decrease brightness", "dim screen", "make screen darker"],
        );
        registry
    }
}

/// `"Volume Up"` → `"volume_up"`.
pub fn intent_key(name: &str) -> String {
    normalize(name).replace(' ', "_")
}
