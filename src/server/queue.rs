//! Bounded FIFO queue of aperiodic jobs.
//!
//! Single mutex plus one condition variable. Producers never block: a full
//! queue rejects the job and counts it as dropped. Arrival timestamps are
//! assigned at enqueue, so the server's response metric covers queueing
//! delay as well as service time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering as MemOrd};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::clock::{self, Timestamp};

/// Admission bound on queued jobs.
pub const QUEUE_BOUND: usize = 1024;

/// A work descriptor: an opaque action plus its arrival instant.
pub struct Job {
    action: Box<dyn FnOnce() + Send>,
    arrival: Timestamp,
}

impl Job {
    pub fn arrival(&self) -> Timestamp {
        self.arrival
    }

    /// Runs the action to completion, consuming the job.
    pub fn execute(self) {
        (self.action)();
    }
}

#[derive(Default)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<Job>>,
    cvar: Condvar,
    dropped: AtomicU64,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job stamped with the current instant.
    ///
    /// Returns `false` (and counts the drop) when the queue is at its
    /// admission bound; the producer is never blocked either way.
    pub fn enqueue(&self, action: Box<dyn FnOnce() + Send>) -> bool {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.len() >= QUEUE_BOUND {
            self.dropped.fetch_add(1, MemOrd::Relaxed);
            return false;
        }
        jobs.push_back(Job {
            action,
            arrival: clock::now(),
        });
        self.cvar.notify_one();
        true
    }

    /// Removes and returns the head job without blocking.
    pub fn try_dequeue(&self) -> Option<Job> {
        self.jobs.lock().unwrap().pop_front()
    }

    /// Blocks up to `timeout` for the queue to become non-empty.
    pub fn wait_nonempty(&self, timeout: Duration) -> bool {
        let jobs = self.jobs.lock().unwrap();
        if !jobs.is_empty() {
            return true;
        }
        let (jobs, _) = self.cvar.wait_timeout(jobs, timeout).unwrap();
        !jobs.is_empty()
    }

    /// Wakes every waiter; used once at shutdown.
    pub fn broadcast(&self) {
        let _jobs = self.jobs.lock().unwrap();
        self.cvar.notify_all();
    }

    /// Discards all queued jobs, returning how many were dropped. The
    /// owner calls this after the server has exited.
    pub fn drain(&self) -> usize {
        let mut jobs = self.jobs.lock().unwrap();
        let n = jobs.len();
        jobs.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Jobs rejected at the admission bound so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(MemOrd::Relaxed)
    }
}
