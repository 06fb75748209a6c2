//! The dialogue decision engine.
//!
//! One utterance (or one silence) in, exactly one behaviour out. The gate is
//! strictly ordered: modal states, cancel words, pending clarification, follow
//! mode, mute/undo, deferred commands, repeat, direct phrases, classifier.
//! Executor results are awaited synchronously; history, context, short memory
//! and follow mode only ever reflect confirmed successes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::dialogue::follow_mode::extract_after_wake;
use super::dialogue::{
    ConfirmationGate, ContextManager, ContextSnapshot, FollowModeManager, FollowModeState,
    FollowUpManager, LastStepAction, LastStepActionManager, PendingAction, ShortMemory,
};
use super::event::SideEffect;
use super::history::ActionHistory;
use super::intent::inverse::inverse_of;
use super::intent::registry::{CommandTable, StepRegistry};
use super::intent::{keys, Action, Direction, Entities, Executor, IntentClassifier, IntentKind};
use super::parse::{normalize, parse_delay};
use super::presence::{ListenFlags, ListenMode};
use super::scheduler::{TaskId, TaskScheduler};
use super::speech::planner::{acknowledgement, Cue};
use super::telemetry::event::ActionOrigin;
use super::telemetry::{TelemetryEvent, TelemetryRecorder};
use super::time::Timestamp;
use crate::config::AssistantConfig;
use crate::services::apps::AppCatalog;

mod clarify;
mod classify;
mod deferred;
mod direct;
mod follow;
mod modal;
mod undo;

/// Re-routes allowed within one utterance (wake tail, repeat).
const MAX_REROUTES: u8 = 3;

/// Which branch of the gate handled a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    WindowSwitch,
    Confirmation,
    Cancel,
    Clarification,
    FollowMode,
    Wake,
    Mute,
    Undo,
    Deferred,
    Repeat,
    Direct,
    Classifier,
    Silence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The executor reported success.
    Executed,
    /// A deferred command was queued.
    Scheduled,
    /// The assistant asked a question and is waiting for the answer.
    Prompted,
    Cancelled,
    /// Understood, but refused or not applicable right now.
    Rejected,
    /// The executor or the classifier failed.
    Failed,
    /// Wake word alone; a command is expected next.
    Woken,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub route: Route,
    pub outcome: Outcome,
}

impl Decision {
    pub fn new(route: Route, outcome: Outcome) -> Self {
        Self { route, outcome }
    }
}

/// One hop of the routing trampoline.
enum Hop {
    Done(Decision),
    /// Route this text next, in the same turn.
    Reroute(String),
}

fn done(route: Route, outcome: Outcome) -> Hop {
    Hop::Done(Decision::new(route, outcome))
}

#[derive(Debug, Clone, Copy, Default)]
struct WindowSwitch {
    silence_hits: u8,
}

pub struct Router<E, C> {
    config: Arc<AssistantConfig>,
    executor: E,
    classifier: C,
    apps: AppCatalog,
    commands: CommandTable,
    steps: StepRegistry,

    context: ContextManager,
    follow_up: FollowUpManager,
    follow_mode: FollowModeManager,
    last_step: LastStepActionManager,
    confirmation: ConfirmationGate,
    memory: ShortMemory,
    history: ActionHistory,
    scheduler: TaskScheduler,

    window_switch: Option<WindowSwitch>,
    awaiting_command: bool,
    replaying: bool,

    effects: Vec<SideEffect>,
    telemetry: TelemetryRecorder,
}

impl<E: Executor, C: IntentClassifier> Router<E, C> {
    pub fn new(config: Arc<AssistantConfig>, executor: E, classifier: C, apps: AppCatalog) -> Self {
        Self {
            context: ContextManager::new(config.context_ttl()),
            follow_up: FollowUpManager::new(config.pending_ttl()),
            follow_mode: FollowModeManager::new(
                config.follow_mode_ttl(),
                config.follow_mode.enabled,
            ),
            last_step: LastStepActionManager::new(config.last_step_ttl()),
            confirmation: ConfirmationGate::new(config.confirmation_ttl()),
            memory: ShortMemory::new(),
            history: ActionHistory::new(config.history.max_actions, config.chain_gap()),
            scheduler: TaskScheduler::new(
                config.scheduler.max_tasks,
                config.scheduler.max_delay_secs,
            ),
            commands: CommandTable::default(),
            steps: StepRegistry::default(),
            window_switch: None,
            awaiting_command: false,
            replaying: false,
            effects: Vec::new(),
            telemetry: TelemetryRecorder::new(),
            config,
            executor,
            classifier,
            apps,
        }
    }

    // --- Queries -----------------------------------------------------------

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn pending(&mut self, now: Timestamp) -> Option<PendingAction> {
        self.follow_up.get_pending(now).cloned()
    }

    pub fn context(&mut self, now: Timestamp) -> Option<ContextSnapshot> {
        self.context.get_context(now).cloned()
    }

    pub fn last_step(&mut self, now: Timestamp) -> Option<LastStepAction> {
        self.last_step.get_if_fresh(now).cloned()
    }

    pub fn follow_mode_state(&mut self, now: Timestamp) -> FollowModeState {
        self.follow_mode.state(now)
    }

    pub fn follow_mode_active(&mut self, now: Timestamp) -> bool {
        self.follow_mode.is_active(now)
    }

    pub fn awaiting_confirmation(&mut self, now: Timestamp) -> bool {
        self.confirmation.is_active(now)
    }

    pub fn in_window_switch(&self) -> bool {
        self.window_switch.is_some()
    }

    /// What the host should listen for next.
    pub fn listen_mode(&mut self, now: Timestamp) -> ListenMode {
        ListenMode::resolve(ListenFlags {
            window_switch: self.window_switch.is_some(),
            confirmation: self.confirmation.is_active(now),
            clarification: self.follow_up.is_active(now),
            follow_mode: self.follow_mode.is_active(now),
            awaiting_command: self.awaiting_command,
        })
    }

    /// Drains speech and log effects produced since the last call.
    pub fn take_effects(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn cancel_task(&mut self, id: TaskId) -> bool {
        let removed = self.scheduler.cancel(id);
        info!(task_id = id, removed, "task cancel requested");
        removed
    }

    // --- Turns -------------------------------------------------------------

    /// Routes one recognised utterance to exactly one behaviour.
    pub fn handle_utterance(&mut self, text: &str, now: Timestamp) -> Decision {
        debug!(text, "utterance");
        let mut current = text.to_string();
        let mut reroutes = 0u8;
        let decision = loop {
            match self.route(&current, now) {
                Hop::Done(decision) => break decision,
                Hop::Reroute(next) => {
                    reroutes += 1;
                    if reroutes > MAX_REROUTES {
                        warn!(reroutes, "re-route limit reached");
                        break Decision::new(Route::Repeat, Outcome::Rejected);
                    }
                    debug!(hop = reroutes, text = %next, "re-routing");
                    current = next;
                }
            }
        };
        self.replaying = false;
        self.finish(decision)
    }

    /// A listen window closed with nothing recognised.
    pub fn handle_silence(&mut self, now: Timestamp) -> Decision {
        let decision = self.silence(now);
        self.finish(decision)
    }

    /// Runs every deferred task that came due. Call at the start of every turn.
    pub fn run_due_tasks(&mut self, now: Timestamp) -> usize {
        let due = self.scheduler.tick(now);
        let fired = due.len();
        for task in due {
            let ok = self.run(&task.action, ActionOrigin::Scheduled);
            self.context.clear_context();
            self.telemetry.record(TelemetryEvent::TaskFired { task_id: task.id, ok });
            info!(task_id = task.id, intent = %task.action.intent, ok, "scheduled task fired");
            if ok {
                self.history.push(task.action.clone(), inverse_of(&task.action), now);
                self.acknowledge(&task.action);
                if task.action.intent == IntentKind::SwitchWindow {
                    self.enter_window_switch();
                }
            } else {
                self.history.break_chain();
                self.speak(Cue::TaskFailed);
            }
        }
        fired
    }

    fn finish(&mut self, decision: Decision) -> Decision {
        info!(route = ?decision.route, outcome = ?decision.outcome, "turn");
        self.telemetry.record(TelemetryEvent::Turn {
            route: decision.route,
            outcome: decision.outcome,
        });
        decision
    }

    fn route(&mut self, text: &str, now: Timestamp) -> Hop {
        let t0 = normalize(text);
        if t0.is_empty() {
            return done(Route::Silence, Outcome::Idle);
        }
        self.awaiting_command = false;
        let config = Arc::clone(&self.config);
        let phrases = &config.phrases;

        // === 1. MODAL STATES ===
        if self.window_switch.is_some() {
            return Hop::Done(self.window_switch_input(&t0));
        }
        if self.confirmation.is_active(now) {
            return Hop::Done(self.confirmation_reply(&t0, now));
        }

        // === 2. WAKE WORD ===
        // An open question survives the wake word; its tail is the answer ("murmur three").
        if let Some(tail) = extract_after_wake(&t0, &phrases.wake_keywords) {
            if tail.is_empty() && self.follow_up.is_active(now) {
                debug!("wake word while a question is open");
                self.follow_mode.clear();
                self.speak(Cue::Wake);
                return done(Route::Wake, Outcome::Woken);
            }
            return self.wake(tail);
        }

        // === 3. CANCEL WORDS ===
        let pending_active = self.follow_up.is_active(now);
        if pending_active && phrases.cancel_words.contains(&t0) {
            self.cancel_pending(true);
            self.history.break_chain();
            return done(Route::Cancel, Outcome::Cancelled);
        }

        // === 4. PENDING CLARIFICATION ===
        if let Some(decision) = self.clarification_turn(text, &t0, pending_active, now) {
            return Hop::Done(decision);
        }

        // === 5. FOLLOW MODE ===
        if let Some(hop) = self.follow_mode_gate(text, &t0, now) {
            return hop;
        }
        if phrases.cancel_words.contains(&t0) {
            self.follow_mode.clear();
            self.last_step.clear();
            self.history.break_chain();
            self.speak(Cue::Cancelled);
            return done(Route::Cancel, Outcome::Cancelled);
        }

        // === 6. MUTE / UNDO ===
        if phrases.unmute.contains(&t0) {
            return Hop::Done(self.perform(
                Action::bare(IntentKind::Unmute),
                Some(text),
                Route::Mute,
                now,
            ));
        }
        if phrases.mute.contains(&t0) {
            return Hop::Done(self.perform(
                Action::bare(IntentKind::Mute),
                Some(text),
                Route::Mute,
                now,
            ));
        }
        if phrases.undo_all.contains(&t0) {
            return Hop::Done(self.undo_chain(now));
        }
        if phrases.undo_last.contains(&t0) {
            return Hop::Done(self.undo_last(now));
        }

        // === 7. DEFERRED ===
        if let Some(request) = parse_delay(&t0) {
            if !self.is_magnitude_not_delay(&request) {
                return Hop::Done(self.defer(request, now));
            }
        }

        // === 8. REPEAT ===
        if phrases.repeat.contains(&t0) {
            return self.repeat(now);
        }

        // === 9. DIRECT PHRASES ===
        if let Some(decision) = self.direct(text, &t0, now) {
            return Hop::Done(decision);
        }

        // === 10. CLASSIFIER ===
        Hop::Done(self.classify(text, &t0, now))
    }

    fn wake(&mut self, tail: String) -> Hop {
        self.follow_mode.clear();
        if tail.is_empty() {
            self.awaiting_command = true;
            self.speak(Cue::Wake);
            return done(Route::Wake, Outcome::Woken);
        }
        Hop::Reroute(tail)
    }

    fn repeat(&mut self, now: Timestamp) -> Hop {
        if let Some(action) = self.memory.last_action().cloned() {
            info!(intent = %action.intent, "repeating last action");
            self.replaying = true;
            return Hop::Done(self.perform(action, None, Route::Repeat, now));
        }
        let last = self.memory.last_command().map(normalize);
        match last {
            Some(command) if !self.config.phrases.repeat.contains(&command) => {
                self.replaying = true;
                Hop::Reroute(command)
            }
            _ => {
                self.speak(Cue::NothingToRepeat);
                done(Route::Repeat, Outcome::Rejected)
            }
        }
    }

    fn silence(&mut self, now: Timestamp) -> Decision {
        if std::mem::take(&mut self.awaiting_command) {
            self.speak(Cue::NotHeard);
            return Decision::new(Route::Silence, Outcome::Idle);
        }
        if let Some(mode) = self.window_switch.as_mut() {
            mode.silence_hits = mode.silence_hits.saturating_add(1);
            if mode.silence_hits >= self.config.timing.window_switch_silence_limit {
                debug!("window switch ended by silence");
                return self.end_window_switch(true);
            }
            return Decision::new(Route::WindowSwitch, Outcome::Idle);
        }
        if self.confirmation.is_active(now) {
            return self.decline_confirmation(now);
        }
        if self.follow_up.is_active(now) {
            debug!("silence cleared pending clarification");
            self.follow_up.clear_pending();
            self.telemetry.record(TelemetryEvent::ClarificationCancelled);
            return Decision::new(Route::Clarification, Outcome::Cancelled);
        }
        Decision::new(Route::Silence, Outcome::Idle)
    }

    // --- Execution ---------------------------------------------------------

    fn needs_confirmation(&self, intent: IntentKind) -> bool {
        self.config.is_dangerous(intent) || intent.is_close()
    }

    /// Executes a resolved action, asking first when it is dangerous or closes something.
    fn perform(
        &mut self,
        action: Action,
        text: Option<&str>,
        route: Route,
        now: Timestamp,
    ) -> Decision {
        if self.needs_confirmation(action.intent) {
            return self.request_confirmation(action, text, now, route);
        }
        let origin = if self.replaying { ActionOrigin::Repeat } else { ActionOrigin::User };
        self.execute_now(action, text, route, origin, now)
    }

    fn execute_now(
        &mut self,
        action: Action,
        text: Option<&str>,
        route: Route,
        origin: ActionOrigin,
        now: Timestamp,
    ) -> Decision {
        if !self.run(&action, origin) {
            return self.fail(&action, route);
        }
        self.commit(&action, text, now);
        if action.is_step() {
            if let (Some(direction), Some(steps)) =
                (action.entities.direction(), action.entities.steps())
            {
                let base = action.entities.without(&[keys::DIRECTION, keys::MAGNITUDE_STEPS]);
                self.remember_step(action.intent, direction, steps, base, now);
            }
        }
        if action.intent == IntentKind::SwitchWindow {
            self.enter_window_switch();
        }
        Decision::new(route, Outcome::Executed)
    }

    /// Calls the executor. Nothing else.
    fn run(&mut self, action: &Action, origin: ActionOrigin) -> bool {
        let ok = self.executor.execute(action.intent, &action.entities);
        debug!(intent = %action.intent, ?origin, ok, "executor");
        let event = if ok {
            TelemetryEvent::ActionExecuted { intent: action.intent, origin }
        } else {
            TelemetryEvent::ActionFailed { intent: action.intent, origin }
        };
        self.telemetry.record(event);
        ok
    }

    /// Success bookkeeping: short memory, context, history, acknowledgement.
    fn commit(&mut self, action: &Action, text: Option<&str>, now: Timestamp) {
        if !self.replaying {
            if let Some(text) = text {
                self.memory.remember_command(text);
            }
            self.memory.remember_action(action.clone());
        }
        self.context.set_context(action.intent, action.entities.clone(), now);
        let id = self.history.push(action.clone(), inverse_of(action), now);
        debug!(record = id, intent = %action.intent, "history push");
        self.acknowledge(action);
    }

    /// Records the step as the target of "more"/"less" and (re)arms follow mode.
    fn remember_step(
        &mut self,
        base: IntentKind,
        direction: Direction,
        steps: i64,
        entities: Entities,
        now: Timestamp,
    ) {
        self.last_step.record(base, direction, steps, entities, now);
        if let Some(last) = self.last_step.get_if_fresh(now).cloned() {
            self.follow_mode.activate(last, now);
            if self.follow_mode.is_active(now) {
                debug!(intent = %base, "follow mode armed");
                self.telemetry.record(TelemetryEvent::FollowModeArmed);
            }
        }
    }

    fn fail(&mut self, action: &Action, route: Route) -> Decision {
        warn!(intent = %action.intent, "action failed");
        self.history.break_chain();
        let cue = match action.intent {
            IntentKind::OpenApp => Cue::OpenFailed,
            IntentKind::CloseApp | IntentKind::CloseActive => Cue::CloseFailed,
            _ => Cue::ExecError,
        };
        self.speak(cue);
        Decision::new(route, Outcome::Failed)
    }

    /// Drops the pending clarification together with the step state it hangs off.
    fn cancel_pending(&mut self, speak: bool) {
        self.follow_up.clear_pending();
        self.last_step.clear();
        self.follow_mode.clear();
        self.telemetry.record(TelemetryEvent::ClarificationCancelled);
        debug!("pending clarification cancelled");
        if speak {
            self.speak(Cue::Cancelled);
        }
    }

    fn set_pending(&mut self, pending: PendingAction, now: Timestamp) {
        debug!(kind = ?pending.kind, base = %pending.base_intent, "pending set");
        self.telemetry.record(TelemetryEvent::ClarificationRequested { kind: pending.kind });
        self.follow_up.set_pending(pending, now);
    }

    // --- Speech ------------------------------------------------------------

    fn speak(&mut self, cue: Cue) {
        self.speak_text(cue, cue.default_text().to_string());
    }

    fn speak_text(&mut self, cue: Cue, text: String) {
        self.effects.push(SideEffect::Speak { cue, text });
    }

    fn acknowledge(&mut self, action: &Action) {
        if let Some(text) = acknowledgement(action) {
            self.speak_text(Cue::Acknowledge, text);
        }
    }
}
