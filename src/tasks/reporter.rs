//! 1 Hz supervisory reporter.
//!
//! Snapshots every statistics record without taking any lock (each field is
//! read once into locals by [`TaskStats::snapshot`][crate::stats::TaskStats])
//! and prints one summary line per task. Lines for event-driven tasks are
//! held back until the task has been released at least once.

use super::{Shared, TaskId, REPORT_PERIOD_US};
use crate::{clock, rt};

pub(super) fn run(shared: &Shared) {
    rt::set_fifo_priority("STATS", rt::PRIO_REPORTER);

    let mut next = clock::now() + REPORT_PERIOD_US;
    while shared.running() {
        clock::sleep_until(next);
        next += REPORT_PERIOD_US;
        if !shared.running() {
            break;
        }

        let belt = shared.belt.snapshot();
        println!(
            "STATS rpm={:.1} set={:.1} pos={:.2}",
            belt.rpm, belt.setpoint, belt.position
        );

        for id in TaskId::ALL {
            let snap = shared.stats(id).snapshot();
            if id.event_driven() && snap.releases == 0 {
                continue;
            }
            println!(
                "{}: rel={} fin={} hard={} WCRT={}us HWM99\u{2248}{}us Lmax={}us Cmax={}us (m,k)=({},{}) [blk={}us pre={}]",
                id.name(),
                snap.releases,
                snap.finishes,
                snap.hard_misses,
                snap.worst_response,
                snap.p99(),
                snap.worst_latency,
                snap.worst_exec,
                snap.window_hits(),
                snap.k,
                snap.blocked,
                snap.preemptions,
            );
        }
    }
}
