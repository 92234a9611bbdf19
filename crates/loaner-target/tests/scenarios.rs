//! End-to-end scenarios: pooled targets wired into a context and a proxy.

use loaner_core::{
    Error, MaxSize, PoolSettings, PoolingConfig, TargetFactory, WhenExhausted,
};
use loaner_pool::{FixedPool, GenericPool};
use loaner_target::{InvokeError, PooledInvocationTarget, Proxy, TargetContext, TargetError};
use pretty_assertions::assert_eq;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/// A stand-in for an expensive, non-thread-safe backing object.
#[derive(Debug, Default)]
struct Session {
    calls: usize,
}

#[derive(Clone, Default)]
struct Sessions {
    created: Arc<AtomicUsize>,
    destroyed: Arc<AtomicUsize>,
}

impl TargetFactory<Session> for Sessions {
    fn create(&self) -> loaner_core::Result<Session> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Session::default())
    }

    fn destroy(&self, _target: Session) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Refuses to build anything.
struct Unreachable;

impl TargetFactory<Session> for Unreachable {
    fn create(&self) -> loaner_core::Result<Session> {
        Err(Error::factory("backend unreachable"))
    }
}

fn sessions(
    settings: PoolSettings,
) -> (Arc<PooledInvocationTarget<GenericPool<Session, Sessions>>>, Sessions) {
    let factory = Sessions::default();
    let pool = GenericPool::new(factory.clone(), settings);
    (
        Arc::new(PooledInvocationTarget::new("sessions", pool)),
        factory,
    )
}

fn started(target: &Arc<PooledInvocationTarget<GenericPool<Session, Sessions>>>) -> TargetContext {
    let mut context = TargetContext::new("app");
    context.register("sessions", target.clone()).unwrap();
    context.start().unwrap();
    context
}

fn touch(session: &mut Session) -> Result<usize, std::io::Error> {
    session.calls += 1;
    Ok(session.calls)
}

#[test]
fn single_target_fail_policy() {
    let (target, _) = sessions(
        PoolSettings::new()
            .with_max_size(MaxSize::Bounded(1))
            .with_when_exhausted(WhenExhausted::Fail),
    );
    let _context = started(&target);

    let held = target.get_target().unwrap();
    let result = target.invoke(touch);
    assert!(matches!(
        result,
        Err(InvokeError::Pool(Error::Exhausted { max_size: 1 }))
    ));
    assert_eq!(target.stats().exhausted_total, 1);

    target.release_target(held).unwrap();
    assert_eq!(target.invoke(touch).unwrap(), 1);
    assert_eq!(target.stats().created, 1);
}

#[test]
fn single_target_block_policy() {
    let (target, _) = sessions(PoolSettings::new().with_max_size(MaxSize::Bounded(1)));
    let _context = started(&target);

    let held = target.get_target().unwrap();
    let waiter = {
        let target = Arc::clone(&target);
        thread::spawn(move || target.invoke(touch))
    };

    while target.stats().waiters == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(target.stats().active, 1);

    target.release_target(held).unwrap();
    assert_eq!(waiter.join().unwrap().unwrap(), 1);

    let stats = target.stats();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.waiters, 0);
    assert_eq!(stats.idle, 1);
}

#[test]
fn block_policy_times_out() {
    let (target, _) = sessions(
        PoolSettings::new()
            .with_max_size(MaxSize::Bounded(1))
            .with_max_wait(Duration::from_millis(20)),
    );
    let _context = started(&target);

    let _held = target.borrow().unwrap();
    match target.invoke(touch) {
        Err(InvokeError::Pool(Error::Timeout { waited })) => {
            assert!(waited >= Duration::from_millis(20));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[test]
fn pool_creation_failure_aborts_startup() {
    let pool = GenericPool::new(
        Unreachable,
        PoolSettings::new()
            .with_max_size(MaxSize::Bounded(2))
            .with_min_idle(1),
    );
    let target = Arc::new(PooledInvocationTarget::new("sessions", pool));
    let (healthy, healthy_factory) = sessions(PoolSettings::new().with_min_idle(1));

    let mut context = TargetContext::new("app");
    context.register("healthy", healthy.clone()).unwrap();
    context.register("sessions", target.clone()).unwrap();

    let err = context.start().unwrap_err();
    match &err {
        TargetError::Initialization { name, source } => {
            assert_eq!(name, "sessions");
            assert_eq!(source.to_string(), "target factory failed: backend unreachable");
        }
        other => panic!("expected an initialization error, got {other:?}"),
    }
    assert!(!context.is_running());

    // Nothing is ever handed out by the failed source.
    assert!(matches!(target.get_target(), Err(Error::NotInitialized)));
    assert_eq!(target.stats().borrowed_total, 0);

    // The component attached before it was rolled back.
    assert!(matches!(healthy.get_target(), Err(Error::Closed)));
    assert_eq!(healthy_factory.destroyed.load(Ordering::SeqCst), 1);
}

#[test]
fn n_threads_with_n_targets() {
    const N: usize = 6;
    let (target, factory) = sessions(
        PoolSettings::new()
            .with_max_size(MaxSize::Bounded(N))
            .with_when_exhausted(WhenExhausted::Fail),
    );
    let _context = started(&target);

    let barrier = Arc::new(Barrier::new(N + 1));
    let handles: Vec<_> = (0..N)
        .map(|_| {
            let target = Arc::clone(&target);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                target.invoke(|session| {
                    barrier.wait();
                    barrier.wait();
                    touch(session)
                })
            })
        })
        .collect();

    barrier.wait();
    assert_eq!(target.stats().active, N);
    assert!(matches!(
        target.invoke(touch),
        Err(InvokeError::Pool(Error::Exhausted { max_size: N }))
    ));
    barrier.wait();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }
    assert_eq!(factory.created.load(Ordering::SeqCst), N);
    assert_eq!(target.stats().idle, N);
}

#[test]
fn panicking_invocation_returns_target() {
    let (target, _) = sessions(
        PoolSettings::new()
            .with_max_size(MaxSize::Bounded(1))
            .with_when_exhausted(WhenExhausted::Fail),
    );
    let _context = started(&target);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        target.invoke(|_session| -> Result<(), std::io::Error> { panic!("target blew up") })
    }));
    assert!(outcome.is_err());

    let stats = target.stats();
    assert_eq!(stats.active, 0);
    assert_eq!(stats.idle, 1);
    assert_eq!(stats.returned_total, 1);
    assert!(target.invoke(touch).is_ok());
}

#[test]
fn proxy_exposes_pool_statistics() {
    let (target, _) = sessions(PoolSettings::new().with_max_size(MaxSize::Bounded(3)));
    let _context = started(&target);
    let proxy = Proxy::pooled(Arc::clone(&target));

    let stats_view = proxy.pooling_config().cloned().unwrap();
    assert_eq!(stats_view.max_size(), MaxSize::Bounded(3));
    assert_eq!(stats_view.active_count(), 0);

    let first = target.borrow().unwrap();
    let second = target.borrow().unwrap();
    assert_eq!(stats_view.active_count(), 2);
    assert_eq!(stats_view.idle_count(), 0);

    drop(first);
    assert_eq!(stats_view.active_count(), 1);
    assert_eq!(stats_view.idle_count(), 1);
    second.release().unwrap();

    assert_eq!(proxy.invoke(touch).unwrap(), 1);
    let stats = stats_view.stats();
    assert_eq!(stats.borrowed_total, 3);
    assert_eq!(stats.returned_total, 3);
    assert_eq!(stats.active + stats.idle, 2);
}

#[test]
fn foreign_lease_is_rejected() {
    let (left, _) = sessions(PoolSettings::new());
    let (right, _) = sessions(PoolSettings::new());
    let _left_context = started(&left);
    let _right_context = started(&right);

    // Lease ids are per pool, so the right pool only knows its first id.
    let _first = left.get_target().unwrap();
    let second = left.get_target().unwrap();
    let _held = right.get_target().unwrap();
    assert!(matches!(
        right.release_target(second),
        Err(Error::UnknownTarget { .. })
    ));
    assert_eq!(right.stats().active, 1);
    assert_eq!(right.stats().returned_total, 0);
}

#[test]
fn shutdown_destroys_each_source_once() {
    let (target, factory) = sessions(PoolSettings::new().with_min_idle(2));
    let fixed = Arc::new(PooledInvocationTarget::new(
        "fixed",
        FixedPool::with_size(Sessions::default(), 2),
    ));

    let mut context = TargetContext::new("app");
    context.register("sessions", target.clone()).unwrap();
    context.register("fixed", fixed.clone()).unwrap();
    context.start().unwrap();

    assert_eq!(fixed.stats().idle, 2);
    assert_eq!(fixed.invoke(touch).unwrap(), 1);

    context.shutdown().unwrap();
    context.shutdown().unwrap();
    target.destroy().unwrap();
    drop(context);

    assert_eq!(factory.destroyed.load(Ordering::SeqCst), 2);
    assert!(matches!(target.get_target(), Err(Error::Closed)));
    assert!(matches!(
        fixed.invoke(touch),
        Err(InvokeError::Pool(Error::Closed))
    ));
}
