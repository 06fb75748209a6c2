use std::time::Duration;

use super::time::Timestamp;

/// A single value that is only valid for `ttl` after it was armed.
///
/// Expiry is lazy: the slot is emptied the first time it is read past its
/// deadline. There is no timer behind it.
#[derive(Debug, Clone)]
pub struct TtlSlot<T> {
    ttl: Duration,
    entry: Option<(T, Timestamp)>,
}

impl<T> TtlSlot<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Replaces whatever was stored, restarting the window at `now`.
    pub fn arm(&mut self, value: T, now: Timestamp) {
        self.entry = Some((value, now));
    }

    pub fn get(&mut self, now: Timestamp) -> Option<&T> {
        self.get_within(self.ttl, now)
    }

    /// Same as `get` but judged against a caller-supplied TTL.
    pub fn get_within(&mut self, ttl: Duration, now: Timestamp) -> Option<&T> {
        self.expire(ttl, now);
        self.entry.as_ref().map(|(value, _)| value)
    }

    pub fn get_mut(&mut self, now: Timestamp) -> Option<&mut T> {
        self.expire(self.ttl, now);
        self.entry.as_mut().map(|(value, _)| value)
    }

    pub fn is_live(&mut self, now: Timestamp) -> bool {
        self.get(now).is_some()
    }

    /// Removes and returns the value if it is still live.
    pub fn take(&mut self, now: Timestamp) -> Option<T> {
        self.expire(self.ttl, now);
        self.entry.take().map(|(value, _)| value)
    }

    pub fn armed_at(&self) -> Option<Timestamp> {
        self.entry.as_ref().map(|(_, at)| *at)
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        self.armed_at().map(|at| at.after(self.ttl))
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    fn expire(&mut self, ttl: Duration, now: Timestamp) {
        if let Some((_, armed_at)) = &self.entry {
            if now.since(*armed_at) > ttl {
                self.entry = None;
            }
        }
    }
}
