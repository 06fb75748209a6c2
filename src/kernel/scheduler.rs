use std::time::Duration;

use super::intent::Action;
use super::time::Timestamp;

pub type TaskId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub action: Action,
    pub execute_at: Timestamp,
}

/// Bounded queue of deferred commands.
///
/// There is no timer: the reactor calls `tick` at the start of every turn
/// and runs whatever came due.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    max_tasks: usize,
    max_delay_seconds: u64,
    tasks: Vec<ScheduledTask>,
    next_id: TaskId,
}

impl TaskScheduler {
    pub fn new(max_tasks: usize, max_delay_seconds: u64) -> Self {
        Self {
            max_tasks,
            max_delay_seconds,
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Queues `action` to run `delay_seconds` from `now`.
    ///
    /// `None` for a zero delay, a delay past the maximum, or a full queue.
    pub fn schedule(
        &mut self,
        action: Action,
        delay_seconds: u64,
        now: Timestamp,
    ) -> Option<TaskId> {
        if delay_seconds == 0 || delay_seconds > self.max_delay_seconds {
            return None;
        }
        if self.is_full() {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            action,
            execute_at: now.after(Duration::from_secs(delay_seconds)),
        });
        Some(id)
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Removes and returns every due task, earliest first.
    pub fn tick(&mut self, now: Timestamp) -> Vec<ScheduledTask> {
        let (mut due, rest): (Vec<_>, Vec<_>) = self
            .tasks
            .drain(..)
            .partition(|t| t.execute_at <= now);
        self.tasks = rest;
        due.sort_by_key(|t| (t.execute_at, t.id));
        due
    }

    pub fn clear_all(&mut self) {
        self.tasks.clear();
    }

    pub fn count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_full(&self) -> bool {
        self.tasks.len() >= self.max_tasks
    }

    pub fn max_delay_seconds(&self) -> u64 {
        self.max_delay_seconds
    }

    pub fn pending(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.tasks.iter()
    }
}
