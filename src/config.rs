use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::kernel::intent::IntentKind;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MURMUR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "murmur.toml";

pub type PhraseSet = BTreeSet<String>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Immutable assistant configuration, loaded once and shared as `Arc<AssistantConfig>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub phrases: PhraseConfig,
    pub timing: TimingConfig,
    pub follow_mode: FollowModeConfig,
    pub history: HistoryConfig,
    pub scheduler: SchedulerConfig,
    pub classifier: ClassifierConfig,
    /// Intents that always ask "Are you sure?" first.
    pub dangerous_intents: BTreeSet<IntentKind>,
    /// JSON application catalogue.
    pub apps_file: Option<PathBuf>,
    /// Program that receives spoken text as its only argument (e.g. `say`, `espeak`).
    pub tts_program: Option<String>,
    /// Per-intent shell commands for the console executor, keyed by intent name.
    pub actions: BTreeMap<String, ActionCommand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhraseConfig {
    pub wake_keywords: PhraseSet,
    pub more: PhraseSet,
    pub less: PhraseSet,
    /// Words that drop a pending clarification or leave follow mode.
    pub cancel_words: PhraseSet,
    pub confirm_yes: PhraseSet,
    pub confirm_no: PhraseSet,
    pub repeat: PhraseSet,
    pub undo_last: PhraseSet,
    pub undo_all: PhraseSet,
    pub mute: PhraseSet,
    pub unmute: PhraseSet,
    pub close_active: PhraseSet,
    pub window_left: PhraseSet,
    pub window_right: PhraseSet,
    pub window_done: PhraseSet,
    pub window_cancel: PhraseSet,
    pub switch_window: PhraseSet,
    /// Connectives that mark a short continuation ("and spotify", "also chrome").
    pub followup_linkers: PhraseSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub context_ttl_secs: f64,
    pub pending_ttl_secs: f64,
    pub last_step_ttl_secs: f64,
    pub confirmation_ttl_secs: f64,
    pub window_switch_silence_limit: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowModeConfig {
    pub enabled: bool,
    pub ttl_secs: f64,
    /// "more"/"less" reuse the last magnitude instead of a single step.
    pub repeat_last_steps: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_actions: usize,
    pub chain_gap_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub max_tasks: usize,
    pub max_delay_secs: u64,
    /// Magnitude for deferred step commands that name none ("volume up in 10 seconds").
    pub default_steps: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Empty disables the remote model.
    pub url: String,
    pub timeout_secs: u64,
    pub min_confidence: f32,
    pub min_margin: f32,
    pub context_min_confidence: f32,
    /// Continuations longer than this are never merged with context.
    pub followup_max_words: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

fn set(items: &[&str]) -> PhraseSet {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for PhraseConfig {
    fn default() -> Self {
        Self {
            wake_keywords: set(&[
                "murmur", "murmer", "hey murmur", "hey murmer", "ok murmur", "okay murmur",
                "hey assistant", "hello assistant",
            ]),
            more: set(&[
                "more", "a bit more", "a little more", "little more", "bit more", "more please",
            ]),
            less: set(&[
                "less", "a bit less", "a little less", "little less", "bit less", "less please",
            ]),
            cancel_words: set(&["cancel", "stop"]),
            confirm_yes: set(&[
                "yes", "confirm", "conferm", "confim", "confirmm", "do it", "sure", "ok", "okay",
                "proceed",
            ]),
            confirm_no: set(&[
                "no", "no sir", "cancel", "stop", "don't", "do not", "never mind", "abort",
            ]),
            repeat: set(&[
                "repeat", "repeat that", "repeat it", "repeat last command", "repeat last",
                "do it again", "again", "repeet", "repete", "repit", "repet", "ripit", "repet it",
                "repeat it again",
            ]),
            undo_last: set(&[
                "undo", "undo last", "undo that", "undo it", "go back", "revert", "cancel that",
            ]),
            undo_all: set(&[
                "undo all", "undo everything", "undo all that", "undo everything you did",
                "undo all you did", "undo the last actions",
            ]),
            mute: set(&[
                "mute", "shut up", "shut it", "shutup", "shat up", "shut ap", "shut op", "shot up",
            ]),
            unmute: set(&[
                "unmute", "un mute", "an mute", "and mute", "on mute", "one mute", "unmuted",
                "unmoot", "sound back", "sound on", "turn sound on", "turn on sound",
            ]),
            close_active: set(&[
                "close this", "close it", "close window", "close current window",
                "close current app", "close current application", "close active app",
                "close active window", "close this window", "close this app",
            ]),
            window_left: set(&["left", "previous", "back"]),
            window_right: set(&["right", "next", "forward"]),
            window_done: set(&["done", "select", "choose", "ok"]),
            window_cancel: set(&["cancel", "stop", "exit"]),
            switch_window: set(&[
                "switch", "switch window", "switch app", "switch windows", "switch apps",
            ]),
            followup_linkers: set(&["and", "also", "plus", "then", "too"]),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            context_ttl_secs: 7.5,
            pending_ttl_secs: 8.0,
            last_step_ttl_secs: 12.0,
            confirmation_ttl_secs: 15.0,
            window_switch_silence_limit: 3,
        }
    }
}

impl Default for FollowModeConfig {
    fn default() -> Self {
        Self { enabled: true, ttl_secs: 10.0, repeat_last_steps: false }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_actions: 20, chain_gap_secs: 5.0 }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_tasks: 5, max_delay_secs: 3600, default_steps: 6 }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8008/predict".to_string(),
            timeout_secs: 5,
            min_confidence: 0.40,
            min_margin: 0.05,
            context_min_confidence: 0.20,
            followup_max_words: 4,
        }
    }
}

pub(crate) fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            phrases: PhraseConfig::default(),
            timing: TimingConfig::default(),
            follow_mode: FollowModeConfig::default(),
            history: HistoryConfig::default(),
            scheduler: SchedulerConfig::default(),
            classifier: ClassifierConfig::default(),
            dangerous_intents: [IntentKind::Shutdown, IntentKind::Restart].into_iter().collect(),
            apps_file: None,
            tts_program: None,
            actions: BTreeMap::new(),
        }
    }
}

impl AssistantConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: AssistantConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Loads `$MURMUR_CONFIG` or `./murmur.toml`; a missing file means defaults.
    pub fn load_default_location() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            info!(path = %path.display(), "no config file, using built-in defaults");
            return Ok(Self::default());
        }
        info!(path = %path.display(), "loading config");
        Self::load(&path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("timing.context_ttl_secs", self.timing.context_ttl_secs),
            ("timing.pending_ttl_secs", self.timing.pending_ttl_secs),
            ("timing.last_step_ttl_secs", self.timing.last_step_ttl_secs),
            ("timing.confirmation_ttl_secs", self.timing.confirmation_ttl_secs),
            ("follow_mode.ttl_secs", self.follow_mode.ttl_secs),
            ("history.chain_gap_secs", self.history.chain_gap_secs),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(
                    field,
                    format!("must be a positive number of seconds, got {value}"),
                ));
            }
        }

        let capacities = [
            ("history.max_actions", self.history.max_actions),
            ("scheduler.max_tasks", self.scheduler.max_tasks),
            ("scheduler.max_delay_secs", self.scheduler.max_delay_secs as usize),
            (
                "timing.window_switch_silence_limit",
                usize::from(self.timing.window_switch_silence_limit),
            ),
            ("classifier.followup_max_words", self.classifier.followup_max_words),
        ];
        for (field, value) in capacities {
            if value == 0 {
                return Err(invalid(field, "must be at least 1".to_string()));
            }
        }

        if !(1..=10).contains(&self.scheduler.default_steps) {
            return Err(invalid("scheduler.default_steps", "must be between 1 and 10".to_string()));
        }

        let unit = [
            ("classifier.min_confidence", self.classifier.min_confidence),
            ("classifier.min_margin", self.classifier.min_margin),
            ("classifier.context_min_confidence", self.classifier.context_min_confidence),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("must lie in [0, 1], got {value}")));
            }
        }

        if self.phrases.wake_keywords.iter().all(|w| w.trim().is_empty()) {
            return Err(invalid("phrases.wake_keywords", "needs at least one keyword".to_string()));
        }

        for name in self.actions.keys() {
            name.parse::<IntentKind>()
                .map_err(|e| invalid("actions", e.to_string()))?;
        }
        Ok(())
    }

    pub fn is_dangerous(&self, intent: IntentKind) -> bool {
        self.dangerous_intents.contains(&intent)
    }

    pub fn context_ttl(&self) -> Duration {
        secs(self.timing.context_ttl_secs)
    }

    pub fn pending_ttl(&self) -> Duration {
        secs(self.timing.pending_ttl_secs)
    }

    pub fn last_step_ttl(&self) -> Duration {
        secs(self.timing.last_step_ttl_secs)
    }

    pub fn confirmation_ttl(&self) -> Duration {
        secs(self.timing.confirmation_ttl_secs)
    }

    pub fn follow_mode_ttl(&self) -> Duration {
        secs(self.follow_mode.ttl_secs)
    }

    pub fn chain_gap(&self) -> Duration {
        secs(self.history.chain_gap_secs)
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
