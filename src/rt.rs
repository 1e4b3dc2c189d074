//! Real-time bring-up: memory locking, SCHED_FIFO priorities and the
//! process shutdown flag.
//!
//! Every acquisition failure here degrades to a warning. An unprivileged
//! run keeps all tasks at the default policy; the harness still works, it
//! just measures the stock scheduler instead of the RT one.

use std::sync::atomic::{AtomicBool, Ordering as MemOrd};

use crate::ffi::syscall::{install_handler, mlockall, sched_priority_range, set_thread_sched};

/// Static task priorities, higher = more urgent. The aperiodic server runs
/// at whatever priority its parameters configure.
pub const PRIO_SAFETY: i32 = 90;
pub const PRIO_SAMPLER: i32 = 85;
pub const PRIO_CONTROLLER: i32 = 80;
pub const PRIO_SORTER: i32 = 80;
pub const PRIO_REPORTER: i32 = 70;

/// Locks current and future pages into RAM so the RT tasks never fault.
pub fn lock_memory() {
    if let Err(e) = mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) {
        log::warn!("mlockall failed ({e}); running without locked memory");
    }
}

/// Requests SCHED_FIFO at `priority` for the calling thread, clamped into
/// the policy's valid range.
pub fn set_fifo_priority(task: &str, priority: i32) {
    let priority = match sched_priority_range(libc::SCHED_FIFO) {
        Ok((min, max)) => priority.clamp(min, max),
        Err(_) => priority,
    };
    if let Err(e) = set_thread_sched(libc::SCHED_FIFO, priority) {
        log::warn!("{task}: SCHED_FIFO prio {priority} refused ({e}); using default policy");
    }
}

static SIGNALED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_signum: i32) {
    // A relaxed store is async-signal-safe.
    SIGNALED.store(true, MemOrd::Relaxed);
}

/// Installs SIGINT/SIGTERM handlers that raise the shutdown flag.
pub fn install_signal_handlers() {
    for signum in [libc::SIGINT, libc::SIGTERM] {
        if let Err(e) = install_handler(signum, on_signal) {
            log::warn!("sigaction({signum}) failed: {e}");
        }
    }
}

/// Whether a termination signal has been received.
pub fn signaled() -> bool {
    SIGNALED.load(MemOrd::Relaxed)
}
