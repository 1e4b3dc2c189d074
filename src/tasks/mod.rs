//! The RT task set: periodic encoder sampler, chained speed controller,
//! event-driven sorter and safety actuators, plus the 1 Hz reporter.
//!
//! Data flows driver -> event channel -> task -> statistics record ->
//! reporter. The sampler -> controller notification is the only intra-core
//! chain; the controller borrows the sampler's release timestamp from the
//! stamp carried on that channel, so the chain is measured end to end.

use std::io::Result;
use std::sync::atomic::{AtomicBool, Ordering as MemOrd};
use std::sync::Arc;
use std::thread::{Builder, JoinHandle};

use crate::belt::Belt;
use crate::chan::Signal;
use crate::clock::{self, Timestamp};
use crate::stats::TaskStats;

mod controller;
mod reporter;
mod safety;
mod sampler;
mod sorter;

#[cfg(test)]
mod test;

/// Sampler period, microseconds.
pub const SAMPLER_PERIOD_US: i64 = 5_000;

/// Reporter period, microseconds.
pub const REPORT_PERIOD_US: i64 = 1_000_000;

/// (m,k)-firm window size shared by all tasks.
pub const WINDOW_K: u8 = 10;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskId {
    Sampler,
    Controller,
    Sorter,
    Safety,
}

impl TaskId {
    pub const ALL: [TaskId; 4] = [
        TaskId::Sampler,
        TaskId::Controller,
        TaskId::Sorter,
        TaskId::Safety,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            TaskId::Sampler => "ENC_SENSE",
            TaskId::Controller => "SPD_CTRL",
            TaskId::Sorter => "SORT_ACT",
            TaskId::Safety => "SAFETY",
        }
    }

    /// Relative deadline, microseconds from release.
    pub const fn deadline_us(self) -> i64 {
        match self {
            TaskId::Sampler => 5_000,
            TaskId::Controller => 10_000,
            TaskId::Sorter => 10_000,
            TaskId::Safety => 5_000,
        }
    }

    /// Event-driven tasks stay silent in the report until first released.
    pub const fn event_driven(self) -> bool {
        matches!(self, TaskId::Sorter | TaskId::Safety)
    }
}

/// Everything the task set shares: the running flag, the belt, one
/// statistics record per task and the event channels.
pub struct Shared {
    pub running: AtomicBool,
    pub belt: Belt,

    pub sampler: TaskStats,
    pub controller: TaskStats,
    pub sorter: TaskStats,
    pub safety: TaskStats,

    /// Sampler -> controller notification; the stamp is the sampler's
    /// release timestamp.
    pub ctrl_notify: Signal,
    pub sort_events: Signal,
    pub estop_events: Signal,
    pub hmi_events: Signal,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            belt: Belt::new(),
            sampler: TaskStats::new(WINDOW_K),
            controller: TaskStats::new(WINDOW_K),
            sorter: TaskStats::new(WINDOW_K),
            safety: TaskStats::new(WINDOW_K),
            ctrl_notify: Signal::new(),
            sort_events: Signal::new(),
            estop_events: Signal::new(),
            hmi_events: Signal::new(),
        }
    }

    pub fn stats(&self, id: TaskId) -> &TaskStats {
        match id {
            TaskId::Sampler => &self.sampler,
            TaskId::Controller => &self.controller,
            TaskId::Sorter => &self.sorter,
            TaskId::Safety => &self.safety,
        }
    }

    pub fn running(&self) -> bool {
        self.running.load(MemOrd::Relaxed)
    }

    /// Raises shutdown and wakes every suspension point once.
    pub fn request_stop(&self) {
        self.running.store(false, MemOrd::Relaxed);
        self.ctrl_notify.unblock();
        self.sort_events.unblock();
        self.estop_events.unblock();
        self.hmi_events.unblock();
    }

    /// A sort event observed by the driver at `stamp`.
    pub fn post_sort(&self, stamp: Timestamp) {
        self.sort_events.post(stamp);
    }

    /// An e-stop event observed by the driver at `stamp`.
    pub fn post_estop(&self, stamp: Timestamp) {
        self.estop_events.post(stamp);
    }

    /// HMI keypress: bump the setpoint and notify the controller's soft
    /// path. Returns the new setpoint.
    pub fn hmi_bump(&self) -> f64 {
        let setpoint = self.belt.bump_setpoint();
        self.hmi_events.post(clock::now());
        setpoint
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle over the five spawned task threads.
pub struct Harness {
    handles: Vec<JoinHandle<()>>,
}

impl Harness {
    /// Spawns the full task set against `shared`.
    pub fn spawn(shared: Arc<Shared>) -> Result<Self> {
        let bodies: [(&str, fn(&Shared)); 5] = [
            ("safety", safety::run),
            ("enc-sense", sampler::run),
            ("spd-ctrl", controller::run),
            ("sort-act", sorter::run),
            ("stats", reporter::run),
        ];

        let mut handles = Vec::with_capacity(bodies.len());
        for (name, body) in bodies {
            let shared = Arc::clone(&shared);
            let handle = Builder::new()
                .name(name.to_owned())
                .spawn(move || body(&shared))?;
            handles.push(handle);
        }
        Ok(Self { handles })
    }

    /// Waits for every task to observe shutdown and exit.
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}
