//! E-stop task, highest priority, hard deadline 5 ms.

use super::{Shared, TaskId};
use crate::{clock, rt};

const ESTOP_WCET_US: i64 = 100;

pub(super) fn run(shared: &Shared) {
    rt::set_fifo_priority(TaskId::Safety.name(), rt::PRIO_SAFETY);
    let stats = &shared.safety;
    let deadline = TaskId::Safety.deadline_us();

    loop {
        let wait_from = clock::now();
        let Some(release) = shared.estop_events.wait(&shared.running) else {
            break;
        };
        let start = clock::now();
        stats.add_blocked(start - wait_from);

        stats.on_release(release);
        stats.on_start(start);

        shared.belt.estop();
        clock::spin_for(ESTOP_WCET_US);

        stats.on_finish(clock::now(), deadline, true);
        log::info!("SAFETY: e-stop executed, belt halted");
    }
}
