use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use super::intent::{Action, Entities, IntentKind};
use super::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub id: u64,
    pub action_intent: IntentKind,
    pub entities: Entities,
    pub inverse_action: Option<Action>,
    #[serde(skip)]
    pub timestamp: Timestamp,
    pub chain_id: u64,
}

/// Bounded log of executed actions, grouped into causal chains for undo.
///
/// A new chain starts when the gap since the previous push exceeds
/// `chain_gap`, or on the push after `break_chain`.
#[derive(Debug, Clone)]
pub struct ActionHistory {
    max_actions: usize,
    chain_gap: Duration,
    records: VecDeque<ActionRecord>,
    next_id: u64,
    current_chain: u64,
    last_push: Option<Timestamp>,
    force_new_chain: bool,
}

impl ActionHistory {
    pub fn new(max_actions: usize, chain_gap: Duration) -> Self {
        Self {
            max_actions: max_actions.max(1),
            chain_gap,
            records: VecDeque::with_capacity(max_actions),
            next_id: 1,
            current_chain: 1,
            last_push: None,
            force_new_chain: false,
        }
    }

    /// Appends a record and returns its id. The oldest record falls off when full.
    pub fn push(&mut self, action: Action, inverse: Option<Action>, now: Timestamp) -> u64 {
        let gap_exceeded = self
            .last_push
            .map_or(false, |last| now.since(last) > self.chain_gap);
        if self.force_new_chain || gap_exceeded {
            self.current_chain += 1;
            self.force_new_chain = false;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.records.push_back(ActionRecord {
            id,
            action_intent: action.intent,
            entities: action.entities,
            inverse_action: inverse,
            timestamp: now,
            chain_id: self.current_chain,
        });
        self.last_push = Some(now);

        while self.records.len() > self.max_actions {
            self.records.pop_front();
        }
        id
    }

    pub fn pop_last(&mut self) -> Option<ActionRecord> {
        self.records.pop_back()
    }

    /// Removes every record of the chain, oldest first.
    pub fn pop_chain(&mut self, chain_id: u64) -> Vec<ActionRecord> {
        let (chain, rest): (Vec<_>, Vec<_>) = self
            .records
            .drain(..)
            .partition(|r| r.chain_id == chain_id);
        self.records = rest.into();
        chain
    }

    pub fn get_last(&self) -> Option<&ActionRecord> {
        self.records.back()
    }

    pub fn get_chain(&self, chain_id: u64) -> Vec<&ActionRecord> {
        self.records.iter().filter(|r| r.chain_id == chain_id).collect()
    }

    pub fn break_chain(&mut self) {
        self.force_new_chain = true;
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.last_push = None;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter()
    }
}
