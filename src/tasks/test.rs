use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::{Harness, Shared};
use crate::clock;

// Scenario runs are scaled down and their bounds kept loose: the test
// machine has no RT privileges and arbitrary background load.

#[test]
fn test_periodic_only_run() {
    let shared = Arc::new(Shared::new());
    let harness = Harness::spawn(Arc::clone(&shared)).unwrap();

    thread::sleep(Duration::from_millis(500));
    shared.request_stop();
    harness.join();

    let s = shared.sampler.snapshot();
    let c = shared.controller.snapshot();

    // ~100 releases in 500 ms at a 5 ms period.
    assert!(
        s.releases >= 50 && s.releases <= 150,
        "sampler releases = {}",
        s.releases
    );

    // One controller job per sampler notification; collapses under load can
    // only lose, never invent, releases.
    assert!(c.releases <= s.releases);
    assert!(c.releases >= s.releases / 2, "controller starved: {} of {}", c.releases, s.releases);

    for snap in [&s, &c] {
        assert!(snap.releases >= snap.starts);
        assert!(snap.starts >= snap.finishes);
        assert!(snap.starts - snap.finishes <= 1);
        assert!(snap.worst_response >= snap.worst_latency);
        assert!(snap.worst_exec >= 0);
    }

    // No events were injected.
    assert_eq!(shared.sorter.snapshot().releases, 0);
    assert_eq!(shared.safety.snapshot().releases, 0);
}

#[test]
fn test_controller_release_is_samplers() {
    let shared = Arc::new(Shared::new());
    let harness = Harness::spawn(Arc::clone(&shared)).unwrap();

    thread::sleep(Duration::from_millis(200));
    shared.request_stop();
    harness.join();

    // Releases fall on the sampler's absolute grid, so the controller's
    // last release must be one of the sampler's, never its own wake time.
    let s = shared.sampler.snapshot();
    let c = shared.controller.snapshot();
    assert!(c.releases > 0);
    assert!(c.last_release <= s.last_release);
    assert_eq!((s.last_release - c.last_release) % super::SAMPLER_PERIOD_US, 0);
}

#[test]
fn test_estop_halts_belt() {
    let shared = Arc::new(Shared::new());
    let harness = Harness::spawn(Arc::clone(&shared)).unwrap();

    // Let the belt spin up first.
    thread::sleep(Duration::from_millis(150));
    assert!(shared.belt.snapshot().rpm > 0.0);

    shared.post_estop(clock::now());
    thread::sleep(Duration::from_millis(150));

    let snap = shared.safety.snapshot();
    assert_eq!(snap.releases, 1);
    assert_eq!(snap.finishes, 1);

    // E-stop latches: sampler and controller keep running but the belt
    // stays at zero.
    let belt = shared.belt.snapshot();
    assert_eq!(belt.setpoint, 0.0);
    assert_eq!(belt.rpm, 0.0);

    shared.request_stop();
    harness.join();
}

#[test]
fn test_sort_event_releases_once() {
    let shared = Arc::new(Shared::new());
    let harness = Harness::spawn(Arc::clone(&shared)).unwrap();

    let stamp = clock::now();
    shared.post_sort(stamp);
    thread::sleep(Duration::from_millis(100));

    let snap = shared.sorter.snapshot();
    assert_eq!(snap.releases, 1);
    assert_eq!(snap.last_release, stamp);
    assert!(snap.worst_response >= snap.worst_latency);

    shared.request_stop();
    harness.join();
}

#[test]
fn test_hmi_bump_raises_setpoint() {
    let shared = Arc::new(Shared::new());
    let harness = Harness::spawn(Arc::clone(&shared)).unwrap();

    let new = shared.hmi_bump();
    assert_eq!(new, 140.0);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(shared.belt.snapshot().setpoint, 140.0);

    shared.request_stop();
    harness.join();
}

#[test]
fn test_shutdown_unblocks_all_tasks() {
    let shared = Arc::new(Shared::new());
    let harness = Harness::spawn(Arc::clone(&shared)).unwrap();
    thread::sleep(Duration::from_millis(20));
    shared.request_stop();
    // join() hanging here would time the whole suite out.
    harness.join();
}
