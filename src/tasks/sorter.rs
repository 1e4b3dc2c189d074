//! Sort actuator, event-driven, hard deadline 10 ms.
//!
//! Released by the sort channel; the release timestamp is the producer's
//! observation instant carried on the event.

use super::{Shared, TaskId};
use crate::{clock, rt};

const SORT_WCET_US: i64 = 500;

pub(super) fn run(shared: &Shared) {
    rt::set_fifo_priority(TaskId::Sorter.name(), rt::PRIO_SORTER);
    let stats = &shared.sorter;
    let deadline = TaskId::Sorter.deadline_us();

    loop {
        let wait_from = clock::now();
        let Some(release) = shared.sort_events.wait(&shared.running) else {
            break;
        };
        let start = clock::now();
        stats.add_blocked(start - wait_from);

        stats.on_release(release);
        stats.on_start(start);

        // Diverter actuation.
        clock::spin_for(SORT_WCET_US);

        stats.on_finish(clock::now(), deadline, true);
    }
}
