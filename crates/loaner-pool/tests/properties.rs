//! Property-based tests for pool bookkeeping.

use loaner_core::{Error, Lease, MaxSize, PoolSettings, PoolingConfig, TargetPool, WhenExhausted};
use loaner_pool::GenericPool;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Borrow,
    Release(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Borrow),
        2 => any::<usize>().prop_map(Op::Release),
    ]
}

fn fail_fast_pool(max_size: MaxSize) -> GenericPool<u64, impl loaner_core::TargetFactory<u64>> {
    let pool = GenericPool::new(
        || Ok::<_, Error>(0u64),
        PoolSettings::new()
            .with_max_size(max_size)
            .with_when_exhausted(WhenExhausted::Fail),
    );
    pool.create_pool().unwrap();
    pool
}

proptest! {
    /// Property: borrowed targets never exceed a bounded max size.
    #[test]
    fn prop_bounded_never_exceeded(
        max in 0usize..6,
        ops in prop::collection::vec(op_strategy(), 0..120)
    ) {
        let pool = fail_fast_pool(MaxSize::Bounded(max));
        let mut held: Vec<Lease<u64>> = Vec::new();

        for op in ops {
            match op {
                Op::Borrow => match pool.get_target() {
                    Ok(lease) => held.push(lease),
                    Err(Error::Exhausted { max_size }) => {
                        prop_assert_eq!(max_size, max);
                        prop_assert_eq!(held.len(), max);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {}", other),
                },
                Op::Release(index) if !held.is_empty() => {
                    let lease = held.swap_remove(index % held.len());
                    pool.release_target(lease).unwrap();
                }
                Op::Release(_) => {}
            }

            let stats = pool.stats();
            prop_assert!(stats.active <= max);
            prop_assert!(stats.total() <= max);
            prop_assert_eq!(stats.active, held.len());
        }
    }

    /// Property: an unbounded pool never refuses a borrow.
    #[test]
    fn prop_unbounded_never_exhausts(
        ops in prop::collection::vec(op_strategy(), 0..120)
    ) {
        let pool = fail_fast_pool(MaxSize::Unbounded);
        let mut held = Vec::new();

        for op in ops {
            match op {
                Op::Borrow => held.push(pool.get_target().unwrap()),
                Op::Release(index) if !held.is_empty() => {
                    let lease = held.swap_remove(index % held.len());
                    pool.release_target(lease).unwrap();
                }
                Op::Release(_) => {}
            }
            prop_assert_eq!(pool.active_count(), held.len());
        }
    }

    /// Property: borrow then release restores the prior counts.
    #[test]
    fn prop_borrow_release_round_trip(max in 1usize..6, warm in 0usize..6) {
        let warm = warm.min(max);
        let pool = GenericPool::new(
            || Ok::<_, Error>(0u64),
            PoolSettings::new()
                .with_max_size(MaxSize::Bounded(max))
                .with_min_idle(warm),
        );
        pool.create_pool().unwrap();

        // Warm up once so a lazily built target is already idle.
        let lease = pool.get_target().unwrap();
        pool.release_target(lease).unwrap();

        let before = (pool.active_count(), pool.idle_count());
        let lease = pool.get_target().unwrap();
        prop_assert_eq!(pool.active_count(), before.0 + 1);
        pool.release_target(lease).unwrap();
        let after = (pool.active_count(), pool.idle_count());
        prop_assert_eq!(before, after);
    }
}
