use std::collections::BTreeSet;
use std::time::Duration;

use crate::kernel::intent::Action;
use crate::kernel::parse::normalize;
use crate::kernel::time::Timestamp;
use crate::kernel::ttl::TtlSlot;

/// Unclear replies tolerated before a confirmation is dropped.
pub const MAX_UNCLEAR_REPLIES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmReply {
    Yes,
    No,
    Unclear,
}

/// Matches a whole reply against the yes/no vocabularies, which already
/// include the usual misrecognitions ("conferm", "confim").
pub fn classify_reply(text: &str, yes: &BTreeSet<String>, no: &BTreeSet<String>) -> ConfirmReply {
    let t = normalize(text);
    if yes.contains(&t) {
        ConfirmReply::Yes
    } else if no.contains(&t) {
        ConfirmReply::No
    } else {
        ConfirmReply::Unclear
    }
}

/// What runs once the user says yes.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmRequest {
    Execute { action: Action, text: Option<String> },
    Schedule { action: Action, delay_seconds: u64 },
}

impl ConfirmRequest {
    pub fn action(&self) -> &Action {
        match self {
            ConfirmRequest::Execute { action, .. } | ConfirmRequest::Schedule { action, .. } => {
                action
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirmation {
    pub request: ConfirmRequest,
    pub unclear_replies: u8,
}

/// Yes/no gate in front of dangerous and close-type actions.
#[derive(Debug, Clone)]
pub struct ConfirmationGate {
    slot: TtlSlot<PendingConfirmation>,
}

impl ConfirmationGate {
    pub fn new(ttl: Duration) -> Self {
        Self { slot: TtlSlot::new(ttl) }
    }

    pub fn begin(&mut self, request: ConfirmRequest, now: Timestamp) {
        self.slot.arm(PendingConfirmation { request, unclear_replies: 0 }, now);
    }

    pub fn pending(&mut self, now: Timestamp) -> Option<&PendingConfirmation> {
        self.slot.get(now)
    }

    pub fn is_active(&mut self, now: Timestamp) -> bool {
        self.slot.is_live(now)
    }

    pub fn register_unclear(&mut self, now: Timestamp) -> u8 {
        match self.slot.get_mut(now) {
            Some(pending) => {
                pending.unclear_replies = pending.unclear_replies.saturating_add(1);
                pending.unclear_replies
            }
            None => 0,
        }
    }

    pub fn take(&mut self, now: Timestamp) -> Option<ConfirmRequest> {
        self.slot.take(now).map(|pending| pending.request)
    }

    pub fn clear(&mut self) {
        self.slot.clear();
    }
}
