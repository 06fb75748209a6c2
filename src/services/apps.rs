use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::kernel::parse::normalize;

const OPEN_PREFIXES: &[&str] = &["open", "launch", "start", "run"];
const CLOSE_PREFIXES: &[&str] = &["close", "quit", "exit", "kill", "stop"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read app catalogue {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse app catalogue {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One launchable application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub aliases: Vec<String>,
    pub target: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Process image name used to close it, when it differs from the target.
    #[serde(default)]
    pub process: Option<String>,
}

// Loose shape so one malformed entry does not reject the whole file.
#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    apps: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    target: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    process: Option<String>,
}

impl RawEntry {
    fn into_entry(self) -> Option<AppEntry> {
        let id = normalize(&self.id?);
        let kind = self.kind?.trim().to_lowercase();
        let target = self.target?.trim().to_string();
        let aliases: Vec<String> = self
            .aliases
            .iter()
            .map(|a| normalize(a))
            .filter(|a| !a.is_empty())
            .collect();
        if id.is_empty() || kind.is_empty() || target.is_empty() || aliases.is_empty() {
            return None;
        }
        Some(AppEntry { id, kind, aliases, target, args: self.args, process: self.process })
    }
}

/// Result of resolving a spoken app name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMatch<'a> {
    One(&'a AppEntry),
    /// Several apps fit a partial name; the user has to pick.
    Ambiguous(Vec<&'a AppEntry>),
    None,
}

#[derive(Debug, Clone, Default)]
pub struct AppCatalog {
    apps: Vec<AppEntry>,
}

impl AppCatalog {
    pub fn new(apps: Vec<AppEntry>) -> Self {
        Self { apps }
    }

    pub fn from_json_str(content: &str, path: &Path) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let total = raw.apps.len();
        let apps: Vec<AppEntry> = raw.apps.into_iter().filter_map(RawEntry::into_entry).collect();
        if apps.len() < total {
            warn!(skipped = total - apps.len(), "app entries missing id, type, aliases or target");
        }
        debug!(count = apps.len(), "app catalogue loaded");
        Ok(Self { apps })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content, path)
    }

    pub fn get(&self, id: &str) -> Option<&AppEntry> {
        let id = normalize(id);
        self.apps.iter().find(|app| app.id == id)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Exact alias, then exact id, then the first substring match either way.
    pub fn find(&self, name: &str) -> Option<&AppEntry> {
        let q = normalize(name);
        if q.is_empty() {
            return None;
        }
        self.exact(&q).or_else(|| self.candidates(&q).into_iter().next())
    }

    /// Every app whose id or an alias contains, or is contained in, `name`.
    pub fn candidates(&self, name: &str) -> Vec<&AppEntry> {
        let q = normalize(name);
        if q.is_empty() {
            return Vec::new();
        }
        self.apps
            .iter()
            .filter(|app| {
                std::iter::once(&app.id)
                    .chain(app.aliases.iter())
                    .any(|alias| alias.contains(q.as_str()) || q.contains(alias.as_str()))
            })
            .collect()
    }

    /// Like `find`, but reports ambiguity instead of picking the first candidate.
    pub fn resolve(&self, name: &str) -> AppMatch<'_> {
        let q = normalize(name);
        if q.is_empty() {
            return AppMatch::None;
        }
        if let Some(app) = self.exact(&q) {
            return AppMatch::One(app);
        }
        let mut found = self.candidates(&q);
        match found.len() {
            0 => AppMatch::None,
            1 => AppMatch::One(found.remove(0)),
            _ => AppMatch::Ambiguous(found),
        }
    }

    /// Exact alias or id only. No substring matching.
    pub fn find_exact(&self, name: &str) -> Option<&AppEntry> {
        self.exact(&normalize(name))
    }

    fn exact(&self, q: &str) -> Option<&AppEntry> {
        self.apps
            .iter()
            .find(|app| app.aliases.iter().any(|a| a == q))
            .or_else(|| self.apps.iter().find(|app| app.id == q))
    }
}

fn strip_verb<'a>(text: &'a str, verbs: &[&str]) -> Option<&'a str> {
    verbs.iter().find_map(|verb| {
        text.strip_prefix(verb)
            .and_then(|rest| rest.strip_prefix(' '))
            .map(str::trim)
    })
}

/// "open google chrome" → "google chrome". `None` if the phrase has no open verb.
pub fn extract_open_target(text: &str) -> Option<String> {
    let t = normalize(text);
    strip_verb(&t, OPEN_PREFIXES).map(clean_target)
}

/// "close the spotify app" → "spotify".
pub fn extract_close_target(text: &str) -> Option<String> {
    let t = normalize(text);
    strip_verb(&t, CLOSE_PREFIXES).map(clean_target)
}

/// A bare verb with nothing after it: "open", "close".
pub fn is_bare_open(text: &str) -> bool {
    OPEN_PREFIXES.contains(&normalize(text).as_str())
}

pub fn is_bare_close(text: &str) -> bool {
    CLOSE_PREFIXES.contains(&normalize(text).as_str())
}

fn clean_target(rest: &str) -> String {
    let mut words: Vec<&str> = rest.split_whitespace().collect();
    if words.first().map_or(false, |w| *w == "the") {
        words.remove(0);
    }
    if words.len() > 1 && matches!(words.last(), Some(&"app") | Some(&"application")) {
        words.pop();
    }
    words.join(" ")
}
