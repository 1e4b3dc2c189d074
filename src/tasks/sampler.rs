//! Periodic encoder sampler, 5 ms, hard deadline 5 ms.
//!
//! Releases are absolute: the next release is the previous release plus the
//! period, never "sampling time plus period". A late wakeup therefore does
//! not drift the release grid; the backlog surfaces as latency.

use super::{Shared, TaskId, SAMPLER_PERIOD_US};
use crate::{clock, rt};

// Deterministic spin emulating the encoder read WCET.
const SENSE_WCET_US: i64 = 200;

pub(super) fn run(shared: &Shared) {
    rt::set_fifo_priority(TaskId::Sampler.name(), rt::PRIO_SAMPLER);
    let stats = &shared.sampler;
    let deadline = TaskId::Sampler.deadline_us();
    let dt_s = SAMPLER_PERIOD_US as f64 / 1e6;

    let mut next = clock::now() + SAMPLER_PERIOD_US;
    while shared.running() {
        clock::sleep_until(next);
        if !shared.running() {
            break;
        }

        let release = next;
        stats.on_release(release);
        stats.on_start(clock::now());

        shared.belt.advance(dt_s);
        clock::spin_for(SENSE_WCET_US);

        stats.on_finish(clock::now(), deadline, true);

        // Exactly one notification per job; the stamp hands the controller
        // this job's release instant for end-to-end attribution.
        shared.ctrl_notify.post(release);

        next += SAMPLER_PERIOD_US;
    }
}
