use std::time::Duration;

use crate::kernel::intent::{Entities, IntentKind};
use crate::kernel::time::Timestamp;
use crate::kernel::ttl::TtlSlot;

/// The last successful intent, kept briefly so "and spotify" can reuse it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    pub intent: IntentKind,
    pub entities: Entities,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct ContextManager {
    slot: TtlSlot<ContextSnapshot>,
}

impl ContextManager {
    pub fn new(ttl: Duration) -> Self {
        Self { slot: TtlSlot::new(ttl) }
    }

    pub fn set_context(&mut self, intent: IntentKind, entities: Entities, now: Timestamp) {
        self.slot.arm(ContextSnapshot { intent, entities, created_at: now }, now);
    }

    pub fn get_context(&mut self, now: Timestamp) -> Option<&ContextSnapshot> {
        self.slot.get(now)
    }

    pub fn clear_context(&mut self) {
        self.slot.clear();
    }

    pub fn is_valid(&mut self, now: Timestamp) -> bool {
        self.slot.is_live(now)
    }
}

/// A classifier label may only extend a context of the same intent.
///
/// An empty label (no confident intent) always merges.
pub fn should_merge_context(ctx_intent: IntentKind, api_intent: &str) -> bool {
    let api = api_intent.trim();
    api.is_empty() || api.parse::<IntentKind>().map_or(false, |kind| kind == ctx_intent)
}
