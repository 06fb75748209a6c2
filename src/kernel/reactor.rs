use tokio::sync::mpsc;
use tokio::time::{interval, Duration}; // Only for the loop driver
use tracing::{debug, info};

use super::event::{Event, InputContent, SideEffect};
use super::intent::{Executor, IntentClassifier};
use super::router::{Decision, Router};
use super::time::{Clock, SystemClock, Timestamp, TICK_MS};

/// Drives the router from a channel of input events at a fixed cadence.
pub struct Reactor<E, C> {
    pub receiver: mpsc::Receiver<Event>,
    pub router: Router<E, C>,
    clock: Box<dyn Clock + Send>,
}

impl<E: Executor, C: IntentClassifier> Reactor<E, C> {
    pub fn new(receiver: mpsc::Receiver<Event>, router: Router<E, C>) -> Self {
        Self::with_clock(receiver, router, Box::new(SystemClock::new()))
    }

    pub fn with_clock(
        receiver: mpsc::Receiver<Event>,
        router: Router<E, C>,
        clock: Box<dyn Clock + Send>,
    ) -> Self {
        Self { receiver, router, clock }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// One kernel step at the clock's current time.
    /// MUST NOT await I/O or timers.
    pub fn tick_step(&mut self, events: Vec<Event>) -> Vec<SideEffect> {
        let now = self.clock.now();
        self.step_at(events, now)
    }

    /// Due tasks run before any input of this step, then inputs in arrival order.
    pub fn step_at(&mut self, events: Vec<Event>, now: Timestamp) -> Vec<SideEffect> {
        let mut effects = Vec::new();

        // === 1. DEFERRED TASKS ===
        let fired = self.router.run_due_tasks(now);
        if fired > 0 {
            effects.push(SideEffect::Log(format!("{fired} scheduled task(s) fired")));
        }
        effects.extend(self.router.take_effects());

        // === 2. INPUTS ===
        for event in events {
            let decision: Option<Decision> = match event {
                Event::Input(input) => {
                    debug!(source = %input.source, "input");
                    Some(match input.content {
                        InputContent::Utterance(text) => self.router.handle_utterance(&text, now),
                        InputContent::Silence => self.router.handle_silence(now),
                    })
                }
                Event::CancelTask { task_id } => {
                    let removed = self.router.cancel_task(task_id);
                    effects.push(SideEffect::Log(format!(
                        "cancel task {task_id}: removed={removed}"
                    )));
                    None
                }
            };
            if let Some(decision) = decision {
                effects.push(SideEffect::Log(format!(
                    "{:?} -> {:?}",
                    decision.route, decision.outcome
                )));
            }

            // === 3. EMIT ===
            effects.extend(self.router.take_effects());
        }

        effects
    }

    /// Drains whatever is queued right now without waiting.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Async driver loop. Ends when every sender is dropped.
    pub async fn run(&mut self) {
        info!("Reactor started. Tick: {}ms", TICK_MS);

        let mut cadence = interval(Duration::from_millis(TICK_MS));
        cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            cadence.tick().await;

            let events = self.drain();
            let closed = events.is_empty() && self.receiver.is_closed();

            for effect in self.tick_step(events) {
                match effect {
                    SideEffect::Log(msg) => info!("[LOG] {}", msg),
                    SideEffect::Speak { cue, text } => info!(?cue, "[SPEAK] {}", text),
                }
            }

            if closed && self.router.scheduler().count() == 0 {
                info!("input channel closed; reactor stopping");
                break;
            }
        }
    }
}
