use std::time::Duration;

use crate::kernel::intent::{Action, Direction, Entities, IntentKind};
use crate::kernel::parse::clamp_steps;
use crate::kernel::time::Timestamp;
use crate::kernel::ttl::TtlSlot;

/// The most recent volume/brightness step, the target of "more" and "less".
#[derive(Debug, Clone, PartialEq)]
pub struct LastStepAction {
    pub base_intent: IntentKind,
    pub direction: Direction,
    pub steps: u8,
    /// Arguments other than direction and magnitude.
    pub entities: Entities,
    pub timestamp: Timestamp,
}

impl LastStepAction {
    pub fn to_action(&self, direction: Direction, steps: u8) -> Action {
        Action::step(self.base_intent, direction, steps, &self.entities)
    }
}

#[derive(Debug, Clone)]
pub struct LastStepActionManager {
    slot: TtlSlot<LastStepAction>,
}

impl LastStepActionManager {
    pub fn new(ttl: Duration) -> Self {
        Self { slot: TtlSlot::new(ttl) }
    }

    /// Steps are clamped to 1..=10.
    pub fn record(
        &mut self,
        base_intent: IntentKind,
        direction: Direction,
        steps: i64,
        entities: Entities,
        now: Timestamp,
    ) {
        let last = LastStepAction {
            base_intent,
            direction,
            steps: clamp_steps(steps),
            entities,
            timestamp: now,
        };
        self.slot.arm(last, now);
    }

    pub fn get_if_fresh(&mut self, now: Timestamp) -> Option<&LastStepAction> {
        self.slot.get(now)
    }

    pub fn get_if_fresh_within(
        &mut self,
        ttl: Duration,
        now: Timestamp,
    ) -> Option<&LastStepAction> {
        self.slot.get_within(ttl, now)
    }

    pub fn clear(&mut self) {
        self.slot.clear();
    }
}
