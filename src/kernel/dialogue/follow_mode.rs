use std::collections::BTreeSet;
use std::time::Duration;

use super::last_step::LastStepAction;
use crate::kernel::parse::normalize;
use crate::kernel::parse::text::contains_words;
use crate::kernel::time::Timestamp;
use crate::kernel::ttl::TtlSlot;

/// Snapshot of follow mode for the host UI.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowModeState {
    pub active: bool,
    pub expires_at: Option<Timestamp>,
    pub last_step_action: Option<LastStepAction>,
}

/// Short window after a step action in which "more"/"less" work without the wake word.
#[derive(Debug, Clone)]
pub struct FollowModeManager {
    enabled: bool,
    slot: TtlSlot<LastStepAction>,
}

impl FollowModeManager {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self { enabled, slot: TtlSlot::new(ttl) }
    }

    /// Opens (or extends) the window. A disabled manager just stays cleared.
    pub fn activate(&mut self, last: LastStepAction, now: Timestamp) {
        if !self.enabled {
            self.slot.clear();
            return;
        }
        self.slot.arm(last, now);
    }

    pub fn is_active(&mut self, now: Timestamp) -> bool {
        self.enabled && self.slot.is_live(now)
    }

    pub fn get_last_step_action_if_active(&mut self, now: Timestamp) -> Option<&LastStepAction> {
        if !self.enabled {
            return None;
        }
        self.slot.get(now)
    }

    pub fn state(&mut self, now: Timestamp) -> FollowModeState {
        let last = self.get_last_step_action_if_active(now).cloned();
        FollowModeState {
            active: last.is_some(),
            expires_at: last.as_ref().and_then(|_| self.slot.expires_at()),
            last_step_action: last,
        }
    }

    pub fn clear(&mut self) {
        self.slot.clear();
    }
}

/// Phrase sets consulted while follow mode decides what an utterance means.
#[derive(Debug, Clone, Copy)]
pub struct FollowVocabulary<'a> {
    pub wake_keywords: &'a BTreeSet<String>,
    pub more: &'a BTreeSet<String>,
    pub less: &'a BTreeSet<String>,
    pub cancel: &'a BTreeSet<String>,
}

impl FollowVocabulary<'_> {
    fn is_more_or_less(&self, t: &str) -> bool {
        self.more.contains(t) || self.less.contains(t)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowInput {
    /// "more"/"less" while a numeric answer is still owed.
    PendingBlock,
    /// Wake keyword, with whatever followed it.
    Wake { tail: String },
    More,
    Less,
    Cancel,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowGate {
    PendingBlock,
    Follow(FollowInput),
    /// "more"/"less" outside follow mode.
    RequireWake,
    Inactive,
}

/// Text after a leading wake keyword. `Some("")` for the keyword alone.
///
/// Longer keywords win, so "hey murmur open chrome" strips "hey murmur"
/// rather than "hey".
pub fn extract_after_wake(text: &str, wake_keywords: &BTreeSet<String>) -> Option<String> {
    let t = normalize(text);
    if t.is_empty() {
        return None;
    }
    let mut ordered: Vec<String> = wake_keywords
        .iter()
        .map(|w| normalize(w))
        .filter(|w| !w.is_empty())
        .collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    ordered.into_iter().find_map(|w| {
        if t == w {
            Some(String::new())
        } else {
            t.strip_prefix(&format!("{w} ")).map(|tail| tail.trim().to_string())
        }
    })
}

/// Whether a wake keyword appears anywhere in the utterance as whole words.
pub fn contains_wake_keyword(text: &str, wake_keywords: &BTreeSet<String>) -> bool {
    let t = normalize(text);
    if t.len() < 3 {
        return false;
    }
    wake_keywords.iter().any(|w| contains_words(&t, &normalize(w)))
}

pub fn classify_follow_input(
    text: &str,
    vocab: FollowVocabulary<'_>,
    pending_active: bool,
) -> FollowInput {
    let t = normalize(text);
    if pending_active && vocab.is_more_or_less(&t) {
        return FollowInput::PendingBlock;
    }
    if let Some(tail) = extract_after_wake(&t, vocab.wake_keywords) {
        return FollowInput::Wake { tail };
    }
    if vocab.more.contains(&t) {
        FollowInput::More
    } else if vocab.less.contains(&t) {
        FollowInput::Less
    } else if vocab.cancel.contains(&t) {
        FollowInput::Cancel
    } else {
        FollowInput::Other
    }
}

pub fn resolve_follow_mode_gate(
    text: &str,
    vocab: FollowVocabulary<'_>,
    pending_active: bool,
    follow_mode_active: bool,
) -> FollowGate {
    let t = normalize(text);
    if pending_active && vocab.is_more_or_less(&t) {
        return FollowGate::PendingBlock;
    }
    if follow_mode_active {
        return FollowGate::Follow(classify_follow_input(&t, vocab, false));
    }
    if vocab.is_more_or_less(&t) {
        FollowGate::RequireWake
    } else {
        FollowGate::Inactive
    }
}
