use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use murmur::config::AssistantConfig;
use murmur::kernel::event::{Event, InputEvent, SideEffect};
use murmur::kernel::intent::IntentClassifier;
use murmur::kernel::time::TICK_MS;
use murmur::services::apps::AppCatalog;
use murmur::services::classifier::{HttpIntentClassifier, OfflineClassifier};
use murmur::services::handlers::build_dispatch_table;
use murmur::{Reactor, Router};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!("murmur booting...");

    let dry_run = std::env::args().any(|arg| arg == "--dry-run");
    let config = Arc::new(
        AssistantConfig::load_default_location().context("failed to load configuration")?,
    );
    let apps = match &config.apps_file {
        Some(path) => AppCatalog::load(path)
            .with_context(|| format!("failed to load apps from {}", path.display()))?,
        None => AppCatalog::default(),
    };
    info!(apps = apps.len(), dry_run, "configuration loaded");

    let executor = build_dispatch_table(&config, Arc::new(apps.clone()), dry_run);
    let classifier: Box<dyn IntentClassifier + Send> = if config.classifier.url.is_empty() {
        warn!("no classifier url configured; free-form commands will not be understood");
        Box::new(OfflineClassifier)
    } else {
        // The blocking client owns a runtime of its own; build it off the async context.
        let client = tokio::task::block_in_place(|| HttpIntentClassifier::new(&config.classifier))
            .context("failed to build classifier client")?;
        Box::new(client)
    };

    let (tx, rx) = mpsc::channel(100);
    let router = Router::new(Arc::clone(&config), executor, classifier, apps);
    let mut reactor = Reactor::new(rx, router);

    let shutdown = CancellationToken::new();
    tokio::spawn(read_console(tx, shutdown.clone()));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            shutdown.cancel();
        });
    }

    let mut cadence = interval(Duration::from_millis(TICK_MS));
    cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut speaker: Option<oneshot::Sender<()>> = None;
    let mut mode = reactor.router.listen_mode(reactor.now());

    info!(
        "murmur ready. Type a command, an empty line for silence, \
         ':cancel <id>' to drop a task. Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = cadence.tick() => {}
            _ = shutdown.cancelled() => break,
        }

        let events = reactor.drain();
        let closed = events.is_empty() && reactor.receiver.is_closed();

        // Classifier and handlers block; keep the runtime's other tasks moving.
        let effects = tokio::task::block_in_place(|| reactor.tick_step(events));
        for effect in effects {
            match effect {
                SideEffect::Log(msg) => debug!("[LOG] {}", msg),
                SideEffect::Speak { text, .. } => {
                    println!("[SPEAK] {}", text);
                    if let Some(program) = &config.tts_program {
                        speaker = speak(program, &text, speaker.take());
                    }
                }
            }
        }

        let now_mode = reactor.router.listen_mode(reactor.now());
        if now_mode != mode {
            let window_ms = u64::try_from(now_mode.listen_window().as_millis()).unwrap_or(u64::MAX);
            info!(from = ?mode, to = ?now_mode, window_ms, "listen mode");
            mode = now_mode;
        }

        if closed && reactor.router.scheduler().count() == 0 {
            info!("input closed");
            break;
        }
    }

    if let Some(stop) = speaker.take() {
        let _ = stop.send(());
    }
    let stats = reactor.router.telemetry().snapshot();
    info!("session telemetry: {}", serde_json::to_string(&stats).unwrap_or_default());
    Ok(())
}

/// Reads utterances from stdin. Stands in for the speech recogniser.
async fn read_console(tx: mpsc::Sender<Event>, shutdown: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = shutdown.cancelled() => break,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("stdin read failed: {}", e);
                break;
            }
        };
        let event = match line.trim() {
            "" => Event::Input(InputEvent::silence("Console")),
            cmd if cmd.starts_with(":cancel ") => match cmd[":cancel ".len()..].trim().parse() {
                Ok(task_id) => Event::CancelTask { task_id },
                Err(_) => {
                    warn!("usage: :cancel <task id>");
                    continue;
                }
            },
            text => Event::Input(InputEvent::utterance("Console", text)),
        };
        if tx.send(event).await.is_err() {
            break;
        }
    }
}

/// Starts the TTS program, stopping whatever it was still saying.
fn speak(
    program: &str,
    text: &str,
    previous: Option<oneshot::Sender<()>>,
) -> Option<oneshot::Sender<()>> {
    if let Some(stop) = previous {
        let _ = stop.send(());
    }
    match tokio::process::Command::new(program).arg(text).kill_on_drop(true).spawn() {
        Ok(mut child) => {
            let (stop_tx, mut stop_rx) = oneshot::channel();
            tokio::spawn(async move {
                tokio::select! {
                    _ = child.wait() => {}
                    _ = &mut stop_rx => { let _ = child.kill().await; }
                }
            });
            Some(stop_tx)
        }
        Err(e) => {
            warn!("Failed to spawn '{}': {}", program, e);
            None
        }
    }
}
