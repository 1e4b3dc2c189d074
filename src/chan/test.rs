use std::sync::atomic::{AtomicBool, Ordering::Relaxed};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::Signal;

#[test]
fn test_post_then_wait() {
    let sig = Signal::new();
    let running = AtomicBool::new(true);
    sig.post(42);
    assert_eq!(sig.wait(&running), Some(42));
}

#[test]
fn test_posts_collapse_to_latest() {
    let sig = Signal::new();
    let running = AtomicBool::new(true);
    for stamp in [1, 2, 3] {
        sig.post(stamp);
    }
    assert_eq!(sig.wait(&running), Some(3));
    assert_eq!(sig.try_take(), None);
}

#[test]
fn test_wait_timeout_expires_empty() {
    let sig = Signal::new();
    assert_eq!(sig.wait_timeout(Duration::from_millis(5)), None);
}

#[test]
fn test_wait_timeout_sees_pending() {
    let sig = Signal::new();
    sig.post(7);
    assert_eq!(sig.wait_timeout(Duration::from_millis(100)), Some(7));
}

#[test]
fn test_wait_crosses_threads() {
    let sig = Arc::new(Signal::new());
    let running = Arc::new(AtomicBool::new(true));

    let consumer = {
        let sig = Arc::clone(&sig);
        let running = Arc::clone(&running);
        thread::spawn(move || sig.wait(&running))
    };
    thread::sleep(Duration::from_millis(20));
    sig.post(99);
    assert_eq!(consumer.join().unwrap(), Some(99));
}

#[test]
fn test_unblock_releases_waiter_on_shutdown() {
    let sig = Arc::new(Signal::new());
    let running = Arc::new(AtomicBool::new(true));

    let consumer = {
        let sig = Arc::clone(&sig);
        let running = Arc::clone(&running);
        thread::spawn(move || sig.wait(&running))
    };
    thread::sleep(Duration::from_millis(20));
    running.store(false, Relaxed);
    sig.unblock();
    assert_eq!(consumer.join().unwrap(), None);
}

#[test]
fn test_pending_event_survives_shutdown() {
    let sig = Signal::new();
    let running = AtomicBool::new(false);
    sig.post(5);
    assert_eq!(sig.wait(&running), Some(5));
}
