//! Concurrent access tests for the tree lock
//!
//! Verifies that the fs2-based sentinel lock admits exactly one holder
//! and never blocks the losers.

use pgfs_fs::{Error, SENTINEL, TreeLock, prepare};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[test]
fn test_concurrent_acquire_admits_one_holder() {
    let dir = tempdir().unwrap();
    prepare(dir.path()).unwrap();
    let sentinel = dir.path().join(SENTINEL);

    let num_threads = 8;
    let barrier = Arc::new(Barrier::new(num_threads));
    let release = Arc::new(Barrier::new(num_threads));
    let outcomes = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let sentinel = sentinel.clone();
            let barrier = Arc::clone(&barrier);
            let release = Arc::clone(&release);
            let outcomes = Arc::clone(&outcomes);

            thread::spawn(move || {
                barrier.wait();
                let result = TreeLock::acquire(&sentinel);
                let acquired = result.is_ok();
                let contended = matches!(result, Err(Error::AlreadyLocked { .. }));
                outcomes.lock().unwrap().push((acquired, contended));
                // Keep the winner's lock alive until everyone has tried.
                release.wait();
                drop(result);
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should not panic");
    }

    let outcomes = outcomes.lock().unwrap();
    let winners = outcomes.iter().filter(|(acquired, _)| *acquired).count();
    let losers = outcomes.iter().filter(|(_, contended)| *contended).count();
    assert_eq!(winners, 1, "exactly one thread should hold the lock");
    assert_eq!(losers, num_threads - 1, "every other thread should see AlreadyLocked");
}

#[test]
fn test_contention_fails_fast() {
    let dir = tempdir().unwrap();
    prepare(dir.path()).unwrap();
    let sentinel = dir.path().join(SENTINEL);

    let held = TreeLock::acquire(&sentinel).unwrap();

    let start = Instant::now();
    let result = TreeLock::acquire(&sentinel);
    let elapsed = start.elapsed();

    assert!(matches!(result, Err(Error::AlreadyLocked { .. })));
    assert!(
        elapsed < Duration::from_secs(1),
        "contended acquire should not wait, took {:?}",
        elapsed
    );
    held.release().unwrap();
}

#[test]
fn test_lock_is_free_after_holder_thread_panics() {
    let dir = tempdir().unwrap();
    prepare(dir.path()).unwrap();
    let sentinel = dir.path().join(SENTINEL);

    let sentinel_clone = sentinel.clone();
    let result = thread::spawn(move || {
        let _held = TreeLock::acquire(&sentinel_clone).unwrap();
        panic!("run aborted while holding the lock");
    })
    .join();
    assert!(result.is_err());

    assert!(TreeLock::acquire(&sentinel).is_ok());
}
