//! Per-task statistics record and its reporter-side snapshot.
//!
//! Each record has exactly one writer (the task that owns it) and one reader
//! (the reporter). Every field is an atomic with relaxed ordering: the writer
//! updates fields independently at release/start/finish boundaries and the
//! reader materializes a [`StatsSnapshot`] by loading each field exactly
//! once. A snapshot taken mid-update may mix a new counter with an old
//! worst-case value; that is the documented contract (the reporter tolerates
//! it) and it never produces undefined behavior.

use std::sync::atomic::{AtomicI32, AtomicI64, AtomicU32, Ordering as MemOrd};

use arrayvec::ArrayVec;

use crate::clock::Timestamp;

#[cfg(test)]
mod test;

/// Fixed capacity of the response-time reservoir.
///
/// Once full the reservoir stops growing (keep-first policy); the p99 then
/// describes the first `RESERVOIR_CAP` jobs of the run.
pub const RESERVOIR_CAP: usize = 256;

/// Largest supported (m,k) window.
pub const WINDOW_MAX: u8 = 16;

/// Mutable per-task record of releases, deadlines, reservoir and the
/// (m,k)-firm window.
///
/// Update operations are invoked exactly once per job phase by the owning
/// task; [`snapshot`][Self::snapshot] is the read-only handle handed to the
/// reporter.
pub struct TaskStats {
    releases: AtomicU32,
    starts: AtomicU32,
    finishes: AtomicU32,

    hard_misses: AtomicU32,
    soft_misses: AtomicU32,

    last_release: AtomicI64,
    last_start: AtomicI64,
    last_end: AtomicI64,

    worst_exec: AtomicI64,
    worst_latency: AtomicI64,
    worst_response: AtomicI64,

    reservoir: [AtomicI32; RESERVOIR_CAP],
    reservoir_len: AtomicU32,

    // Last k hit/miss outcomes, bit 0 = most recent, 1 = on time.
    window: AtomicU32,
    window_fill: AtomicU32,
    k: u8,

    blocked: AtomicI64,
    preemptions: AtomicU32,
}

impl TaskStats {
    /// Creates an empty record with an (m,k) window of `k` jobs.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero or above [`WINDOW_MAX`].
    pub fn new(k: u8) -> Self {
        assert!(k >= 1 && k <= WINDOW_MAX, "window size out of range");
        const ZERO: AtomicI32 = AtomicI32::new(0);
        Self {
            releases: AtomicU32::new(0),
            starts: AtomicU32::new(0),
            finishes: AtomicU32::new(0),
            hard_misses: AtomicU32::new(0),
            soft_misses: AtomicU32::new(0),
            last_release: AtomicI64::new(0),
            last_start: AtomicI64::new(0),
            last_end: AtomicI64::new(0),
            worst_exec: AtomicI64::new(0),
            worst_latency: AtomicI64::new(0),
            worst_response: AtomicI64::new(0),
            reservoir: [ZERO; RESERVOIR_CAP],
            reservoir_len: AtomicU32::new(0),
            window: AtomicU32::new(0),
            window_fill: AtomicU32::new(0),
            k,
            blocked: AtomicI64::new(0),
            preemptions: AtomicU32::new(0),
        }
    }

    /// The job became eligible to run at `t`.
    pub fn on_release(&self, t: Timestamp) {
        saturating_inc(&self.releases);
        self.last_release.store(t, MemOrd::Relaxed);
    }

    /// The job began executing at `t`.
    pub fn on_start(&self, t: Timestamp) {
        saturating_inc(&self.starts);
        self.last_start.store(t, MemOrd::Relaxed);
        let latency = t - self.last_release.load(MemOrd::Relaxed);
        self.worst_latency.fetch_max(latency, MemOrd::Relaxed);
    }

    /// The job completed at `t` against a relative `deadline` (us).
    ///
    /// Derives exec, latency and response for the job, folds them into the
    /// worst-case maxima, classifies a deadline miss as hard or soft,
    /// appends the response to the reservoir while capacity remains and
    /// shifts the (m,k) window.
    pub fn on_finish(&self, t: Timestamp, deadline: i64, hard: bool) {
        saturating_inc(&self.finishes);
        self.last_end.store(t, MemOrd::Relaxed);

        let release = self.last_release.load(MemOrd::Relaxed);
        let start = self.last_start.load(MemOrd::Relaxed);
        let exec = t - start;
        let response = t - release;
        let latency = start - release;

        self.worst_exec.fetch_max(exec, MemOrd::Relaxed);
        self.worst_response.fetch_max(response, MemOrd::Relaxed);
        self.worst_latency.fetch_max(latency, MemOrd::Relaxed);

        if response > deadline {
            if hard {
                saturating_inc(&self.hard_misses);
            } else {
                saturating_inc(&self.soft_misses);
            }
        }

        let len = self.reservoir_len.load(MemOrd::Relaxed) as usize;
        if len < RESERVOIR_CAP {
            self.reservoir[len].store(response as i32, MemOrd::Relaxed);
            // Length published after the entry so the reader never sees
            // an unwritten slot.
            self.reservoir_len.store(len as u32 + 1, MemOrd::Release);
        }

        let hit = (response <= deadline) as u32;
        let mask = (1u32 << self.k) - 1;
        let window = self.window.load(MemOrd::Relaxed);
        self.window.store(((window << 1) | hit) & mask, MemOrd::Relaxed);
        let fill = self.window_fill.load(MemOrd::Relaxed);
        if fill < self.k as u32 {
            self.window_fill.store(fill + 1, MemOrd::Relaxed);
        }
    }

    /// Accumulates `d` microseconds spent waiting for the release signal.
    pub fn add_blocked(&self, d: i64) {
        self.blocked.fetch_add(d, MemOrd::Relaxed);
    }

    /// Counts one observed preemption. Nothing in the harness detects
    /// preemption today, so the reported count stays zero.
    pub fn on_preempt(&self) {
        saturating_inc(&self.preemptions);
    }

    /// Reads the record into plain values, each field loaded exactly once.
    pub fn snapshot(&self) -> StatsSnapshot {
        let len = self.reservoir_len.load(MemOrd::Acquire) as usize;
        let len = len.min(RESERVOIR_CAP);
        let mut reservoir = ArrayVec::new();
        for slot in &self.reservoir[..len] {
            reservoir.push(slot.load(MemOrd::Relaxed));
        }

        StatsSnapshot {
            releases: self.releases.load(MemOrd::Relaxed),
            starts: self.starts.load(MemOrd::Relaxed),
            finishes: self.finishes.load(MemOrd::Relaxed),
            hard_misses: self.hard_misses.load(MemOrd::Relaxed),
            soft_misses: self.soft_misses.load(MemOrd::Relaxed),
            last_release: self.last_release.load(MemOrd::Relaxed),
            last_start: self.last_start.load(MemOrd::Relaxed),
            last_end: self.last_end.load(MemOrd::Relaxed),
            worst_exec: self.worst_exec.load(MemOrd::Relaxed),
            worst_latency: self.worst_latency.load(MemOrd::Relaxed),
            worst_response: self.worst_response.load(MemOrd::Relaxed),
            reservoir,
            window: self.window.load(MemOrd::Relaxed),
            window_fill: self.window_fill.load(MemOrd::Relaxed),
            k: self.k,
            blocked: self.blocked.load(MemOrd::Relaxed),
            preemptions: self.preemptions.load(MemOrd::Relaxed),
        }
    }
}

fn saturating_inc(counter: &AtomicU32) {
    let v = counter.load(MemOrd::Relaxed);
    counter.store(v.saturating_add(1), MemOrd::Relaxed);
}

/// Point-in-time copy of a [`TaskStats`] record.
#[derive(Clone)]
pub struct StatsSnapshot {
    pub releases: u32,
    pub starts: u32,
    pub finishes: u32,
    pub hard_misses: u32,
    pub soft_misses: u32,
    pub last_release: Timestamp,
    pub last_start: Timestamp,
    pub last_end: Timestamp,
    pub worst_exec: i64,
    pub worst_latency: i64,
    pub worst_response: i64,
    pub reservoir: ArrayVec<i32, RESERVOIR_CAP>,
    pub window: u32,
    pub window_fill: u32,
    pub k: u8,
    pub blocked: i64,
    pub preemptions: u32,
}

impl StatsSnapshot {
    /// 99th percentile of the reservoir: the element at index
    /// `floor(0.99 * n)` of the ascending order (always below `n`), or 0
    /// for an empty reservoir. With 100 samples this lands on the largest
    /// one, so a single outlier among 99 quiet jobs is visible.
    pub fn p99(&self) -> i32 {
        let n = self.reservoir.len();
        if n == 0 {
            return 0;
        }
        let mut sorted: ArrayVec<i32, RESERVOIR_CAP> = self.reservoir.clone();
        sorted.sort_unstable();
        sorted[n * 99 / 100]
    }

    /// On-time outcomes in the last k jobs, or 0 until the window has seen
    /// k finishes.
    pub fn window_hits(&self) -> u32 {
        if self.window_fill < self.k as u32 {
            return 0;
        }
        let mask = (1u32 << self.k) - 1;
        (self.window & mask).count_ones()
    }
}
