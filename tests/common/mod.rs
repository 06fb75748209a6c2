#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use murmur::config::AssistantConfig;
use murmur::kernel::event::SideEffect;
use murmur::kernel::intent::{Classification, Entities, Executor, IntentClassifier, IntentKind};
use murmur::kernel::parse::normalize;
use murmur::kernel::time::Timestamp;
use murmur::services::apps::{AppCatalog, AppEntry};
use murmur::Router;

pub type TestRouter = Router<RecordingExecutor, ScriptedClassifier>;

/// Shared view of everything the executor was asked to do.
#[derive(Clone, Default)]
pub struct ExecLog {
    calls: Arc<Mutex<Vec<(IntentKind, Entities)>>>,
    failing: Arc<Mutex<HashSet<IntentKind>>>,
}

impl ExecLog {
    pub fn calls(&self) -> Vec<(IntentKind, Entities)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn intents(&self) -> Vec<IntentKind> {
        self.calls().into_iter().map(|(intent, _)| intent).collect()
    }

    pub fn last(&self) -> Option<(IntentKind, Entities)> {
        self.calls().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Makes every later call for `intent` report failure.
    pub fn fail(&self, intent: IntentKind) {
        self.failing.lock().unwrap().insert(intent);
    }

    pub fn heal(&self, intent: IntentKind) {
        self.failing.lock().unwrap().remove(&intent);
    }
}

pub struct RecordingExecutor {
    log: ExecLog,
}

impl RecordingExecutor {
    pub fn new() -> (Self, ExecLog) {
        let log = ExecLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl Executor for RecordingExecutor {
    fn execute(&mut self, intent: IntentKind, entities: &Entities) -> bool {
        self.log.calls.lock().unwrap().push((intent, entities.clone()));
        !self.log.failing.lock().unwrap().contains(&intent)
    }
}

/// Canned classifier replies keyed by normalized text. Unknown text gets an
/// empty low-confidence label; `offline()` makes every call fail.
#[derive(Default)]
pub struct ScriptedClassifier {
    replies: HashMap<String, Classification>,
    offline: bool,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self { replies: HashMap::new(), offline: true }
    }

    pub fn reply(mut self, text: &str, intent: &str, confidence: f32) -> Self {
        self.replies.insert(normalize(text), Classification::new(intent, confidence));
        self
    }

    pub fn reply_with_runner_up(
        mut self,
        text: &str,
        intent: &str,
        confidence: f32,
        runner_up: f32,
    ) -> Self {
        let result = Classification::new(intent, confidence).with_runner_up(runner_up);
        self.replies.insert(normalize(text), result);
        self
    }
}

impl IntentClassifier for ScriptedClassifier {
    fn classify(&self, text: &str) -> Option<Classification> {
        if self.offline {
            return None;
        }
        Some(
            self.replies
                .get(&normalize(text))
                .cloned()
                .unwrap_or_else(|| Classification::new("", 0.0)),
        )
    }
}

pub fn at(secs: f64) -> Timestamp {
    Timestamp::from_secs_f64(secs)
}

fn app(id: &str, aliases: &[&str]) -> AppEntry {
    AppEntry {
        id: id.to_string(),
        kind: "exe".to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        target: format!("/usr/bin/{id}"),
        args: Vec::new(),
        process: None,
    }
}

pub fn catalog() -> AppCatalog {
    AppCatalog::new(vec![
        app("chrome", &["chrome", "google chrome"]),
        app("chromium", &["chromium"]),
        app("spotify", &["spotify", "music"]),
        app("notepad", &["notepad", "notes"]),
    ])
}

pub fn router() -> (TestRouter, ExecLog) {
    router_with(AssistantConfig::default(), ScriptedClassifier::new())
}

pub fn router_with(
    config: AssistantConfig,
    classifier: ScriptedClassifier,
) -> (TestRouter, ExecLog) {
    let (executor, log) = RecordingExecutor::new();
    (Router::new(Arc::new(config), executor, classifier, catalog()), log)
}

/// Drains and returns what the router said since the last call.
pub fn spoken(router: &mut TestRouter) -> Vec<String> {
    router
        .take_effects()
        .iter()
        .filter_map(SideEffect::spoken_text)
        .map(str::to_string)
        .collect()
}

pub fn last_spoken(router: &mut TestRouter) -> Option<String> {
    spoken(router).pop()
}
