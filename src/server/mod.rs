//! Periodic server for aperiodic jobs.
//!
//! The server runs at period `Ts` with budget `Cs <= Ts`: each period it
//! FIFO-drains the job queue until the budget is consumed or the queue is
//! empty, then sleeps to the next absolute period boundary. The budget is
//! checked between jobs, never inside one, so an admitted job always runs
//! to completion; a long job can overrun `Cs` but never defers the period
//! boundary.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering as MemOrd};
use std::sync::Arc;

use thiserror::Error;

use crate::clock::{self, Timestamp};
use crate::rt;

mod queue;

pub use queue::{Job, JobQueue, QUEUE_BOUND};


#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("budget Cs = {cs_ms} ms exceeds period Ts = {ts_ms} ms")]
    BudgetExceedsPeriod { ts_ms: u64, cs_ms: u64 },
    #[error("period Ts must be nonzero")]
    ZeroPeriod,
}

/// Validated server parameters.
#[derive(Clone, Copy, Debug)]
pub struct ServerParams {
    period_us: i64,
    budget_us: i64,
    priority: i32,
}

impl ServerParams {
    /// Builds parameters from the CLI's millisecond inputs, rejecting a
    /// budget above the period.
    pub fn from_millis(ts_ms: u64, cs_ms: u64, priority: i32) -> Result<Self, ConfigError> {
        if ts_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if cs_ms > ts_ms {
            return Err(ConfigError::BudgetExceedsPeriod { ts_ms, cs_ms });
        }
        Ok(Self {
            period_us: ts_ms as i64 * 1_000,
            budget_us: cs_ms as i64 * 1_000,
            priority,
        })
    }

    pub fn period_us(&self) -> i64 {
        self.period_us
    }

    pub fn budget_us(&self) -> i64 {
        self.budget_us
    }
}

/// The aperiodic server task plus its queue and statistics.
pub struct AperiodicServer {
    params: ServerParams,
    queue: JobQueue,
    stats: ServerStats,
    running: AtomicBool,
}

impl AperiodicServer {
    pub fn new(params: ServerParams) -> Arc<Self> {
        Arc::new(Self {
            params,
            queue: JobQueue::new(),
            stats: ServerStats::default(),
            running: AtomicBool::new(true),
        })
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// Submits a job for service; `false` if the queue rejected it.
    pub fn submit(&self, action: Box<dyn FnOnce() + Send>) -> bool {
        self.queue.enqueue(action)
    }

    pub fn running(&self) -> bool {
        self.running.load(MemOrd::Relaxed)
    }

    /// Raises shutdown and wakes the queue. The server exits at its next
    /// decision point; at worst one period boundary later.
    pub fn shutdown(&self) {
        self.running.store(false, MemOrd::Relaxed);
        self.queue.broadcast();
    }

    /// The server body. Call on a dedicated thread; returns on shutdown,
    /// after which the owner drains the queue.
    pub fn run(&self) {
        rt::set_fifo_priority("APERIODIC_SRV", self.params.priority);

        let mut next = clock::now();
        while self.running() {
            next += self.params.period_us;

            let mut consumed = 0i64;
            let mut had_jobs = false;
            while consumed < self.params.budget_us && self.running() {
                // Unused budget is not carried into the next period.
                let Some(job) = self.queue.try_dequeue() else {
                    break;
                };
                had_jobs = true;
                let arrival = job.arrival();

                let before = clock::now();
                job.execute();
                let after = clock::now();

                self.stats.on_job(after - arrival);
                consumed += after - before;
            }
            self.stats.on_period(consumed, had_jobs);

            // Absolute boundary: an overrunning job eats into the sleep,
            // never into the next release.
            clock::sleep_until(next);
        }

        let leftover = self.queue.drain();
        if leftover > 0 {
            log::info!("APERIODIC_SRV: dropped {leftover} queued jobs at shutdown");
        }
    }

    pub fn stats(&self) -> ServerSnapshot {
        self.stats.snapshot(self.queue.dropped())
    }
}

/// Per-job and per-period server counters, single writer (the server),
/// read by the supervisor as relaxed snapshots.
#[derive(Default)]
struct ServerStats {
    jobs_executed: AtomicU64,
    total_response: AtomicI64,
    max_response: AtomicI64,
    periods_executed: AtomicU64,
    periods_idle: AtomicU64,
    total_budget_used: AtomicI64,
    max_budget_used: AtomicI64,
}

impl ServerStats {
    fn on_job(&self, response: Timestamp) {
        self.jobs_executed.fetch_add(1, MemOrd::Relaxed);
        self.total_response.fetch_add(response, MemOrd::Relaxed);
        self.max_response.fetch_max(response, MemOrd::Relaxed);
    }

    fn on_period(&self, consumed: i64, had_jobs: bool) {
        self.periods_executed.fetch_add(1, MemOrd::Relaxed);
        if !had_jobs {
            self.periods_idle.fetch_add(1, MemOrd::Relaxed);
        }
        self.total_budget_used.fetch_add(consumed, MemOrd::Relaxed);
        self.max_budget_used.fetch_max(consumed, MemOrd::Relaxed);
    }

    fn snapshot(&self, jobs_dropped: u64) -> ServerSnapshot {
        ServerSnapshot {
            jobs_executed: self.jobs_executed.load(MemOrd::Relaxed),
            jobs_dropped,
            total_response: self.total_response.load(MemOrd::Relaxed),
            max_response: self.max_response.load(MemOrd::Relaxed),
            periods_executed: self.periods_executed.load(MemOrd::Relaxed),
            periods_idle: self.periods_idle.load(MemOrd::Relaxed),
            total_budget_used: self.total_budget_used.load(MemOrd::Relaxed),
            max_budget_used: self.max_budget_used.load(MemOrd::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ServerSnapshot {
    pub jobs_executed: u64,
    pub jobs_dropped: u64,
    pub total_response: i64,
    pub max_response: i64,
    pub periods_executed: u64,
    pub periods_idle: u64,
    pub total_budget_used: i64,
    pub max_budget_used: i64,
}

impl ServerSnapshot {
    /// Mean job response in microseconds, 0 with no jobs.
    pub fn mean_response(&self) -> i64 {
        if self.jobs_executed == 0 {
            0
        } else {
            self.total_response / self.jobs_executed as i64
        }
    }
}
