//! Hard real-time instrumentation harness for a simulated industrial conveyor belt.
//!
//! A fixed set of tasks runs at static SCHED_FIFO priorities: a 5 ms periodic
//! encoder sampler, a speed controller chained to it, two event-driven
//! actuators (sorter and e-stop) and a 1 Hz reporter. Every task keeps a
//! per-task [`TaskStats`][stats::TaskStats] record updated at its
//! release/start/finish boundaries, from which the reporter derives classical
//! RT metrics: worst-case response time, worst-case execution time, release
//! latency, deadline-miss counts, a rolling (m,k)-firm window and the p99
//! response time. A periodic [aperiodic server][server] with period `Ts` and
//! budget `Cs` drains a FIFO queue of externally submitted jobs on the side.
//!
//! ## Example
//!
//! Drive a statistics record through one job and read it back the way the
//! reporter does:
//!
//! ```rust
//! use conveyor_rt::stats::TaskStats;
//!
//! let stats = TaskStats::new(10); // (m,k) window of k = 10
//!
//! stats.on_release(1_000);
//! stats.on_start(1_250);               // 250 us of release latency
//! stats.on_finish(2_000, 5_000, true); // 1000 us response, deadline 5 ms
//!
//! let snap = stats.snapshot();
//! assert_eq!(snap.releases, 1);
//! assert_eq!(snap.worst_response, 1_000);
//! assert_eq!(snap.worst_latency, 250);
//! assert_eq!(snap.hard_misses, 0);
//! ```
//!
//! ## Privileges
//!
//! SCHED_FIFO and `mlockall` need `CAP_SYS_NICE` / `CAP_IPC_LOCK` (or root,
//! or a matching `ulimit -r`). Without them the harness logs a warning and
//! keeps running at the default policy; the metrics then measure CFS rather
//! than the RT scheduler.

pub mod belt;
pub mod chan;
pub mod clock;
pub mod cmd;
mod ffi;
pub mod rt;
pub mod server;
pub mod stats;
pub mod tasks;
