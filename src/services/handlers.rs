//! Host-side action handlers behind the executor seam.

use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{ActionCommand, AssistantConfig};
use crate::kernel::intent::{keys, ActionHandler, DispatchTable, Entities, IntentKind};
use crate::services::apps::AppCatalog;

/// Logs the action and reports success. For trying the dialogue without touching the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunHandler;

impl ActionHandler for DryRunHandler {
    fn handle(&mut self, intent: IntentKind, entities: &Entities) -> bool {
        let args: Vec<String> = entities
            .iter()
            .map(|(k, v)| format!("{k}={}", render(v)))
            .collect();
        info!("[DRY-RUN] {} {}", intent, args.join(" "));
        true
    }
}

/// Runs a configured program and waits for it. Exit status 0 is success.
///
/// Arguments may carry `{app}`, `{target}`, `{process}`, `{direction}`,
/// `{steps}`, `{value}` and `{cancel}`; each is replaced from the action's
/// entities, with `{target}` and `{process}` looked up in the app catalogue.
pub struct CommandHandler {
    command: ActionCommand,
    apps: Arc<AppCatalog>,
}

impl CommandHandler {
    pub fn new(command: ActionCommand, apps: Arc<AppCatalog>) -> Self {
        Self { command, apps }
    }

    pub fn render_args(&self, entities: &Entities) -> Vec<String> {
        let app = entities.app().and_then(|id| self.apps.get(id));
        self.command
            .args
            .iter()
            .map(|arg| {
                let mut out = arg.clone();
                let fill = |key: &str| entities.get(key).map(render).unwrap_or_default();
                out = out.replace("{app}", &fill(keys::APP));
                out = out.replace("{direction}", &fill(keys::DIRECTION).to_lowercase());
                out = out.replace("{steps}", &fill(keys::MAGNITUDE_STEPS));
                out = out.replace("{value}", &fill(keys::VALUE));
                out = out.replace("{cancel}", &fill(keys::CANCEL));
                if let Some(app) = app {
                    out = out.replace("{target}", &app.target);
                    out = out.replace("{process}", app.process.as_deref().unwrap_or(&app.target));
                }
                out
            })
            .collect()
    }
}

impl ActionHandler for CommandHandler {
    fn handle(&mut self, intent: IntentKind, entities: &Entities) -> bool {
        let args = self.render_args(entities);
        match Command::new(&self.command.program).args(&args).stdin(Stdio::null()).status() {
            Ok(status) if status.success() => true,
            Ok(status) => {
                warn!(%intent, program = %self.command.program, ?status, "action command failed");
                false
            }
            Err(e) => {
                warn!(
                    %intent,
                    program = %self.command.program,
                    "failed to spawn action command: {}",
                    e
                );
                false
            }
        }
    }
}

/// Opens catalogue apps by spawning their target. Does not wait for the app.
pub struct LaunchHandler {
    apps: Arc<AppCatalog>,
}

impl LaunchHandler {
    pub fn new(apps: Arc<AppCatalog>) -> Self {
        Self { apps }
    }
}

impl ActionHandler for LaunchHandler {
    fn handle(&mut self, _intent: IntentKind, entities: &Entities) -> bool {
        let Some(app) = entities.app().and_then(|id| self.apps.get(id)) else {
            warn!("launch requested for an app that is not in the catalogue");
            return false;
        };
        match Command::new(&app.target)
            .args(&app.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
        {
            Ok(mut child) => {
                // Reap the app whenever it exits so it never lingers as a zombie.
                let id = app.id.clone();
                std::thread::spawn(move || match child.wait() {
                    Ok(status) => debug!(app = %id, ?status, "launched app exited"),
                    Err(e) => warn!(app = %id, "failed to wait on launched app: {}", e),
                });
                true
            }
            Err(e) => {
                warn!(app = %app.id, "failed to launch: {}", e);
                false
            }
        }
    }
}

/// Builds the executor from `[actions.*]` in the config.
///
/// With `dry_run` every intent gets a [`DryRunHandler`]. Otherwise unconfigured
/// intents do too, except `open_app`, which launches catalogue targets directly.
pub fn build_dispatch_table(
    config: &AssistantConfig,
    apps: Arc<AppCatalog>,
    dry_run: bool,
) -> DispatchTable {
    // Keys were validated at load; spaced forms like "open app" are allowed.
    let configured: HashMap<IntentKind, &ActionCommand> = config
        .actions
        .iter()
        .filter_map(|(name, command)| name.parse().ok().map(|intent| (intent, command)))
        .collect();
    let mut table = DispatchTable::new();
    for intent in IntentKind::ALL {
        if dry_run {
            table.insert(intent, Box::new(DryRunHandler));
        } else if let Some(command) = configured.get(&intent) {
            table.insert(
                intent,
                Box::new(CommandHandler::new((*command).clone(), Arc::clone(&apps))),
            );
        } else if intent == IntentKind::OpenApp {
            table.insert(intent, Box::new(LaunchHandler::new(Arc::clone(&apps))));
        } else {
            table.insert(intent, Box::new(DryRunHandler));
        }
    }
    info!(handlers = table.len(), dry_run, "dispatch table built");
    table
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
