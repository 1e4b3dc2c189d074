//! Chained speed controller, hard deadline 10 ms from the sampler's release.
//!
//! The release timestamp is borrowed from the notifying sampler job, not
//! from this task's wake instant: queuing delay between the notification
//! and the wakeup is controller latency, which is what a chained
//! end-to-end deadline means.

use std::time::Duration;

use super::{Shared, TaskId};
use crate::belt::PiController;
use crate::{clock, rt};

const CTRL_WCET_US: i64 = 300;

// Bounded soft-RT wait for a pending HMI keypress per job.
const HMI_WAIT: Duration = Duration::from_millis(1);

pub(super) fn run(shared: &Shared) {
    rt::set_fifo_priority(TaskId::Controller.name(), rt::PRIO_CONTROLLER);
    let stats = &shared.controller;
    let deadline = TaskId::Controller.deadline_us();
    let dt_s = super::SAMPLER_PERIOD_US as f64 / 1e6;
    let mut pi = PiController::belt_default();

    loop {
        let wait_from = clock::now();
        let Some(release) = shared.ctrl_notify.wait(&shared.running) else {
            break;
        };
        let start = clock::now();
        stats.add_blocked(start - wait_from);

        stats.on_release(release);
        stats.on_start(start);

        shared.belt.control(&mut pi, dt_s);
        clock::spin_for(CTRL_WCET_US);

        // Soft-RT HMI path: acknowledged here, no deadline accounting.
        if shared.hmi_events.wait_timeout(HMI_WAIT).is_some() {
            log::debug!("SPD_CTRL: HMI setpoint change acknowledged");
        }

        stats.on_finish(clock::now(), deadline, true);
    }
}
