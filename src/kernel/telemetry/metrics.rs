use std::collections::VecDeque;

use serde::Serialize;

use super::event::{ActionOrigin, TelemetryEvent};
use crate::kernel::router::Outcome;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetrySnapshot {
    pub turn_stats: TurnStats,
    pub action_stats: ActionStats,
    pub dialogue_stats: DialogueStats,
    pub task_stats: TaskStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnStats {
    pub total: u64,
    pub executed: u64,
    pub prompted: u64,
    pub rejected: u64,
    pub failed: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionStats {
    pub executed: u64,
    pub failed: u64,
    pub repeated: u64,
    pub undone: u64,
    pub failure_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DialogueStats {
    pub clarifications: u64,
    pub clarifications_cancelled: u64,
    pub follow_mode_arms: u64,
    pub confirmations_accepted: u64,
    pub confirmations_declined: u64,
    pub classifier_outages: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskStats {
    pub scheduled: u64,
    pub fired: u64,
    pub fire_failures: u64,
    pub avg_delay_secs: f64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut total_delay_secs = 0u64;

    for event in events {
        match event {
            TelemetryEvent::Turn { outcome, .. } => {
                snap.turn_stats.total += 1;
                match outcome {
                    Outcome::Executed | Outcome::Scheduled => snap.turn_stats.executed += 1,
                    Outcome::Prompted => snap.turn_stats.prompted += 1,
                    Outcome::Rejected => snap.turn_stats.rejected += 1,
                    Outcome::Failed => snap.turn_stats.failed += 1,
                    Outcome::Cancelled => snap.turn_stats.cancelled += 1,
                    Outcome::Woken | Outcome::Idle => {}
                }
            }
            TelemetryEvent::ActionExecuted { origin, .. } => {
                snap.action_stats.executed += 1;
                match origin {
                    ActionOrigin::Repeat => snap.action_stats.repeated += 1,
                    ActionOrigin::Undo => snap.action_stats.undone += 1,
                    ActionOrigin::User | ActionOrigin::Scheduled => {}
                }
            }
            TelemetryEvent::ActionFailed { .. } => snap.action_stats.failed += 1,
            TelemetryEvent::ClarificationRequested { .. } => {
                snap.dialogue_stats.clarifications += 1
            }
            TelemetryEvent::ClarificationCancelled => {
                snap.dialogue_stats.clarifications_cancelled += 1
            }
            TelemetryEvent::FollowModeArmed => snap.dialogue_stats.follow_mode_arms += 1,
            TelemetryEvent::ConfirmationResolved { accepted } => {
                if *accepted {
                    snap.dialogue_stats.confirmations_accepted += 1;
                } else {
                    snap.dialogue_stats.confirmations_declined += 1;
                }
            }
            TelemetryEvent::ClassifierUnavailable => snap.dialogue_stats.classifier_outages += 1,
            TelemetryEvent::TaskScheduled { delay_secs, .. } => {
                snap.task_stats.scheduled += 1;
                total_delay_secs += delay_secs;
            }
            TelemetryEvent::TaskFired { ok, .. } => {
                snap.task_stats.fired += 1;
                if !ok {
                    snap.task_stats.fire_failures += 1;
                }
            }
            TelemetryEvent::UndoApplied { .. } => {}
        }
    }

    let attempts = snap.action_stats.executed + snap.action_stats.failed;
    if attempts > 0 {
        snap.action_stats.failure_rate = snap.action_stats.failed as f64 / attempts as f64;
    }

    if snap.task_stats.scheduled > 0 {
        snap.task_stats.avg_delay_secs = total_delay_secs as f64 / snap.task_stats.scheduled as f64;
    }

    snap
}
