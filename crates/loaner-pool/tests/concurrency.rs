//! Concurrent borrow/return behaviour of the concrete pools.

use loaner_core::{
    Error, MaxSize, PoolSettings, PoolingConfig, TargetPool, WhenExhausted,
};
use loaner_pool::{FixedPool, GenericPool};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn numbered() -> impl Fn() -> loaner_core::Result<usize> + Send + Sync {
    let next = AtomicUsize::new(0);
    move || Ok(next.fetch_add(1, Ordering::SeqCst))
}

#[test]
fn n_threads_share_n_targets() {
    const N: usize = 4;
    let pool = Arc::new(GenericPool::new(
        numbered(),
        PoolSettings::new()
            .with_max_size(MaxSize::Bounded(N))
            .with_when_exhausted(WhenExhausted::Fail),
    ));
    pool.create_pool().unwrap();

    let barrier = Arc::new(Barrier::new(N + 1));
    let handles: Vec<_> = (0..N)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let lease = pool.get_target().unwrap();
                // Hold until every thread and the main thread have checked in.
                barrier.wait();
                barrier.wait();
                pool.release_target(lease).unwrap();
            })
        })
        .collect();

    barrier.wait();
    assert_eq!(pool.active_count(), N);
    assert!(matches!(
        pool.get_target(),
        Err(Error::Exhausted { max_size: N })
    ));
    barrier.wait();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.active, 0);
    assert_eq!(stats.idle, N);
    assert_eq!(stats.created, N as u64);
    assert!(pool.get_target().is_ok());
}

#[test]
fn blocked_borrow_resumes_after_release() {
    let pool = Arc::new(GenericPool::with_max_size(numbered(), MaxSize::Bounded(1)));
    pool.create_pool().unwrap();

    let held = pool.get_target().unwrap();
    let held_id = *held;

    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            let lease = pool.get_target().unwrap();
            let value = *lease;
            pool.release_target(lease).unwrap();
            value
        })
    };

    // Wait for the borrower to park on the condition variable.
    while pool.stats().waiters == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    pool.release_target(held).unwrap();

    assert_eq!(waiter.join().unwrap(), held_id);
    assert_eq!(pool.stats().created, 1);
}

#[test]
fn destroy_wakes_blocked_borrowers() {
    let pool = Arc::new(FixedPool::with_size(numbered(), 1));
    pool.create_pool().unwrap();
    let _held = pool.get_target().unwrap();

    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.get_target().map(|lease| *lease))
    };

    while pool.stats().waiters == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    pool.destroy().unwrap();

    assert!(matches!(waiter.join().unwrap(), Err(Error::Closed)));
}

#[test]
fn idle_targets_never_handed_out_twice() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 200;
    let pool = Arc::new(FixedPool::with_size(numbered(), 3));
    pool.create_pool().unwrap();

    let in_use = Arc::new(parking_lot::Mutex::new(HashSet::new()));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let in_use = Arc::clone(&in_use);
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let lease = pool.get_target().unwrap();
                    let value = *lease;
                    {
                        let mut in_use = in_use.lock();
                        assert!(in_use.insert(value), "target {value} lent twice");
                        peak.fetch_max(in_use.len(), Ordering::SeqCst);
                    }
                    thread::yield_now();
                    in_use.lock().remove(&value);
                    pool.release_target(lease).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= 3);
    let stats = pool.stats();
    assert_eq!(stats.created, 3);
    assert_eq!(stats.borrowed_total, (THREADS * ROUNDS) as u64);
    assert_eq!(stats.returned_total, (THREADS * ROUNDS) as u64);
}

#[test]
fn unbounded_pool_never_exhausts() {
    let pool = GenericPool::new(
        numbered(),
        PoolSettings::new()
            .with_max_size(MaxSize::from(-1))
            .with_when_exhausted(WhenExhausted::Fail),
    );
    pool.create_pool().unwrap();

    let leases: Vec<_> = (0..64).map(|_| pool.get_target().unwrap()).collect();
    assert_eq!(pool.active_count(), 64);
    for lease in leases {
        pool.release_target(lease).unwrap();
    }
    assert_eq!(pool.idle_count(), 64);
}
