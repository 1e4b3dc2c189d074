use super::{TaskStats, RESERVOIR_CAP};

fn run_job(stats: &TaskStats, release: i64, start: i64, finish: i64, deadline: i64) {
    stats.on_release(release);
    stats.on_start(start);
    stats.on_finish(finish, deadline, true);
}

#[test]
fn test_counters_and_ordering() {
    let stats = TaskStats::new(10);
    run_job(&stats, 0, 100, 600, 5_000);
    run_job(&stats, 5_000, 5_050, 5_400, 5_000);

    let snap = stats.snapshot();
    assert_eq!(snap.releases, 2);
    assert_eq!(snap.starts, 2);
    assert_eq!(snap.finishes, 2);
    assert!(snap.releases >= snap.starts && snap.starts >= snap.finishes);
    assert_eq!(snap.last_release, 5_000);
    assert_eq!(snap.last_start, 5_050);
    assert_eq!(snap.last_end, 5_400);
}

#[test]
fn test_worst_case_maxima() {
    let stats = TaskStats::new(10);
    run_job(&stats, 0, 200, 1_000, 5_000); // exec 800, latency 200, response 1000
    run_job(&stats, 5_000, 5_100, 5_500, 5_000); // exec 400, latency 100, response 500

    let snap = stats.snapshot();
    assert_eq!(snap.worst_exec, 800);
    assert_eq!(snap.worst_latency, 200);
    assert_eq!(snap.worst_response, 1_000);
    assert!(snap.worst_response >= snap.worst_latency);
}

#[test]
fn test_miss_classification() {
    let stats = TaskStats::new(10);
    run_job(&stats, 0, 100, 6_000, 5_000); // response 6000 > 5000, hard
    stats.on_release(10_000);
    stats.on_start(10_100);
    stats.on_finish(16_000, 5_000, false); // soft miss
    run_job(&stats, 20_000, 20_100, 21_000, 5_000); // on time

    let snap = stats.snapshot();
    assert_eq!(snap.hard_misses, 1);
    assert_eq!(snap.soft_misses, 1);
    assert_eq!(snap.finishes, 3);
}

#[test]
fn test_reservoir_keeps_first_256() {
    let stats = TaskStats::new(10);
    for i in 0..300i64 {
        let release = i * 5_000;
        run_job(&stats, release, release, release + 100 + i, 5_000);
    }

    let snap = stats.snapshot();
    assert_eq!(snap.reservoir.len(), RESERVOIR_CAP);
    // Keep-first: entry j is the response of job j.
    assert_eq!(snap.reservoir[0], 100);
    assert_eq!(snap.reservoir[RESERVOIR_CAP - 1], 100 + RESERVOIR_CAP as i32 - 1);
}

#[test]
fn test_p99_determinism() {
    // 99 responses of 100us then a 9000us outlier: p99 lands on the outlier.
    let stats = TaskStats::new(10);
    for i in 0..99i64 {
        let release = i * 10_000;
        run_job(&stats, release, release, release + 100, 5_000);
    }
    let release = 99 * 10_000;
    run_job(&stats, release, release, release + 9_000, 5_000);

    let snap = stats.snapshot();
    assert_eq!(snap.reservoir.len(), 100);
    assert_eq!(snap.p99(), 9_000);
    assert_eq!(snap.worst_response, 9_000);
}

#[test]
fn test_p99_empty_is_zero() {
    let stats = TaskStats::new(10);
    assert_eq!(stats.snapshot().p99(), 0);
}

#[test]
fn test_window_reports_zero_until_filled() {
    let stats = TaskStats::new(10);
    for i in 0..9i64 {
        let release = i * 5_000;
        run_job(&stats, release, release, release + 100, 5_000);
    }
    assert_eq!(stats.snapshot().window_hits(), 0);

    run_job(&stats, 45_000, 45_000, 45_100, 5_000);
    assert_eq!(stats.snapshot().window_hits(), 10);
}

#[test]
fn test_window_three_misses_in_last_ten() {
    let stats = TaskStats::new(10);
    // 7 hits, then 3 misses, among the last 10 jobs.
    for i in 0..7i64 {
        let release = i * 10_000;
        run_job(&stats, release, release, release + 100, 5_000);
    }
    for i in 7..10i64 {
        let release = i * 10_000;
        run_job(&stats, release, release, release + 6_000, 5_000);
    }

    let snap = stats.snapshot();
    assert_eq!(snap.window_fill, 10);
    assert_eq!(snap.window_hits(), 7);
    assert_eq!(snap.hard_misses, 3);
}

#[test]
fn test_window_slides() {
    let stats = TaskStats::new(4);
    // miss, then 4 hits: the miss slides out of a k=4 window.
    run_job(&stats, 0, 0, 9_000, 5_000);
    for i in 1..5i64 {
        let release = i * 10_000;
        run_job(&stats, release, release, release + 100, 5_000);
    }
    assert_eq!(stats.snapshot().window_hits(), 4);
}

#[test]
fn test_blocked_time_accumulates() {
    let stats = TaskStats::new(10);
    stats.add_blocked(400);
    stats.add_blocked(600);
    assert_eq!(stats.snapshot().blocked, 1_000);
}

#[test]
#[should_panic]
fn test_window_size_over_max_rejected() {
    TaskStats::new(17);
}
