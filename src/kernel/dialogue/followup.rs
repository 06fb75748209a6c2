use std::time::Duration;

use serde::Serialize;

use crate::kernel::intent::{Direction, Entities, IntentKind};
use crate::kernel::time::Timestamp;
use crate::kernel::ttl::TtlSlot;

/// Invalid answers tolerated before a clarification is abandoned.
pub const MAX_INVALID_ATTEMPTS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PendingKind {
    /// "How much?" after a step phrase with no magnitude.
    NeedSteps,
    /// "Which one?" after an ambiguous app name.
    NeedChoice,
    /// "Which app?" after a bare "open" or "close".
    NeedTarget,
}

/// A half-finished command waiting for one more answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub kind: PendingKind,
    pub base_intent: IntentKind,
    pub direction: Option<Direction>,
    pub entities: Entities,
    pub max_choice: Option<u8>,
    pub created_at: Timestamp,
    pub invalid_attempts: u8,
}

impl PendingAction {
    pub fn need_steps(base_intent: IntentKind, direction: Direction, entities: Entities) -> Self {
        Self::new(PendingKind::NeedSteps, base_intent, Some(direction), entities, None)
    }

    pub fn need_choice(base_intent: IntentKind, entities: Entities, max_choice: u8) -> Self {
        Self::new(PendingKind::NeedChoice, base_intent, None, entities, Some(max_choice))
    }

    pub fn need_target(base_intent: IntentKind) -> Self {
        Self::new(PendingKind::NeedTarget, base_intent, None, Entities::new(), None)
    }

    fn new(
        kind: PendingKind,
        base_intent: IntentKind,
        direction: Option<Direction>,
        entities: Entities,
        max_choice: Option<u8>,
    ) -> Self {
        Self {
            kind,
            base_intent,
            direction,
            entities,
            max_choice,
            created_at: Timestamp::ZERO,
            invalid_attempts: 0,
        }
    }
}

/// Holds at most one pending clarification.
#[derive(Debug, Clone)]
pub struct FollowUpManager {
    slot: TtlSlot<PendingAction>,
}

impl FollowUpManager {
    pub fn new(ttl: Duration) -> Self {
        Self { slot: TtlSlot::new(ttl) }
    }

    /// Replaces any existing pending action; its attempt count starts over.
    pub fn set_pending(&mut self, mut pending: PendingAction, now: Timestamp) {
        pending.created_at = now;
        pending.invalid_attempts = 0;
        self.slot.arm(pending, now);
    }

    pub fn get_pending(&mut self, now: Timestamp) -> Option<&PendingAction> {
        self.slot.get(now)
    }

    pub fn is_active(&mut self, now: Timestamp) -> bool {
        self.slot.is_live(now)
    }

    /// Counts one bad answer. Returns the running total, or 0 if nothing is pending.
    pub fn register_invalid_attempt(&mut self, now: Timestamp) -> u8 {
        match self.slot.get_mut(now) {
            Some(pending) => {
                pending.invalid_attempts = pending.invalid_attempts.saturating_add(1);
                pending.invalid_attempts
            }
            None => 0,
        }
    }

    pub fn clear_pending(&mut self) {
        self.slot.clear();
    }
}
