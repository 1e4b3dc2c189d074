//! Unit-capacity event signals.
//!
//! A [`Signal`] carries at most one pending event stamped with the
//! producer's observation instant. Posting while an event is already
//! pending collapses the two (the stamp of the newest post wins); the
//! semantics are "pending", not "counted". The consumer attributes its
//! release to the carried stamp, never to its own wake instant, so queuing
//! delay between producer and consumer shows up as latency.

use std::sync::atomic::{AtomicBool, Ordering as MemOrd};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::clock::Timestamp;

#[cfg(test)]
mod test;

#[derive(Default)]
pub struct Signal {
    pending: Mutex<Option<Timestamp>>,
    cvar: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts an event observed at `stamp`. Collapses into any still-pending
    /// event.
    pub fn post(&self, stamp: Timestamp) {
        let mut pending = self.pending.lock().unwrap();
        *pending = Some(stamp);
        self.cvar.notify_one();
    }

    /// Blocks until an event is pending or `running` turns false.
    ///
    /// Returns the event stamp, or `None` on shutdown. A stamp that is
    /// already pending is consumed even after shutdown was requested, so a
    /// final posted event is never lost.
    pub fn wait(&self, running: &AtomicBool) -> Option<Timestamp> {
        let mut pending = self.pending.lock().unwrap();
        loop {
            if let Some(stamp) = pending.take() {
                return Some(stamp);
            }
            if !running.load(MemOrd::Relaxed) {
                return None;
            }
            pending = self.cvar.wait(pending).unwrap();
        }
    }

    /// Waits at most `timeout` for an event; `None` if none arrived.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Timestamp> {
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending.lock().unwrap();
        loop {
            if let Some(stamp) = pending.take() {
                return Some(stamp);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            (pending, _) = self.cvar.wait_timeout(pending, deadline - now).unwrap();
        }
    }

    /// Consumes a pending event without blocking.
    pub fn try_take(&self) -> Option<Timestamp> {
        self.pending.lock().unwrap().take()
    }

    /// Wakes every waiter without posting an event. Waiters re-check their
    /// running flag and exit; used once at shutdown.
    pub fn unblock(&self) {
        let _pending = self.pending.lock().unwrap();
        self.cvar.notify_all();
    }
}
