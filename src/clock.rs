//! Single source of microsecond timestamps for all RT measurements.
//!
//! All timestamps are signed 64-bit microseconds read from `CLOCK_MONOTONIC`;
//! durations are plain differences. The epoch is unspecified (boot-relative
//! on Linux) and never crosses the process boundary.

use libc::timespec;

use crate::ffi::syscall::{clock_gettime, clock_nanosleep_abs};

/// Microseconds from the monotonic epoch.
pub type Timestamp = i64;

pub const USEC_PER_SEC: i64 = 1_000_000;
const NSEC_PER_USEC: i64 = 1_000;

/// Current monotonic time in microseconds.
///
/// `clock_gettime(CLOCK_MONOTONIC)` cannot fail with a valid clock id on
/// any supported kernel, so failure here is unrecoverable.
pub fn now() -> Timestamp {
    let ts = clock_gettime(libc::CLOCK_MONOTONIC).unwrap_or_else(|e| {
        // Not a recoverable state: without the clock there are no metrics.
        panic!("CLOCK_MONOTONIC unavailable: {e}");
    });
    ts.tv_sec as i64 * USEC_PER_SEC + ts.tv_nsec as i64 / NSEC_PER_USEC
}

/// Suspends the calling thread until the absolute instant `deadline`.
///
/// Uses `TIMER_ABSTIME` so a wakeup that comes late does not shift the
/// release grid; missed time shows up as latency, not as period drift.
pub fn sleep_until(deadline: Timestamp) {
    let ts = timespec {
        tv_sec: deadline / USEC_PER_SEC,
        tv_nsec: (deadline % USEC_PER_SEC) * NSEC_PER_USEC,
    };
    // EINTR is retried inside the wrapper; any other error means the
    // deadline already passed or the clock id is bad, both fine to ignore.
    let _ = clock_nanosleep_abs(libc::CLOCK_MONOTONIC, &ts);
}

/// Burns CPU until `duration` microseconds have elapsed.
///
/// Deterministic WCET emulation for the simulated sensor and actuator
/// work; never yields the processor.
pub fn spin_for(duration: i64) {
    let until = now() + duration;
    while now() < until {
        std::hint::spin_loop();
    }
}
