//! Shared bookkeeping behind the concrete pools.
//!
//! A [`Shelf`] owns the idle targets and the ids of every outstanding
//! lease. A slot is reserved (its id issued) before a target is built, so
//! `active + idle <= max_size` holds even while factories run outside the
//! lock.

use loaner_core::{
    Error, Exhaustion, Lease, LeaseId, MaxSize, PoolStats, Result, TargetFactory,
};
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Initializing,
    Open,
    Closed,
}

struct State<T> {
    phase: Phase,
    /// Idle targets, most recently returned last.
    idle: Vec<T>,
    outstanding: HashSet<LeaseId>,
    next_id: u64,
    waiters: usize,
}

impl<T> State<T> {
    fn issue(&mut self) -> LeaseId {
        let id = LeaseId::new(self.next_id);
        self.next_id += 1;
        self.outstanding.insert(id);
        id
    }
}

/// Outcome of reserving a slot.
pub(crate) enum Slot<T> {
    /// An idle target was taken off the shelf.
    Idle(LeaseId, T),
    /// Capacity was reserved; the caller must build the target.
    Vacant(LeaseId),
}

#[derive(Default)]
struct Counters {
    created: AtomicU64,
    destroyed: AtomicU64,
    borrowed: AtomicU64,
    returned: AtomicU64,
    exhausted: AtomicU64,
}

pub(crate) struct Shelf<T> {
    max_size: MaxSize,
    state: Mutex<State<T>>,
    returned: Condvar,
    counters: Counters,
}

impl<T> Shelf<T> {
    pub(crate) fn new(max_size: MaxSize) -> Self {
        Self {
            max_size,
            state: Mutex::new(State {
                phase: Phase::Pending,
                idle: Vec::new(),
                outstanding: HashSet::new(),
                next_id: 1,
                waiters: 0,
            }),
            returned: Condvar::new(),
            counters: Counters::default(),
        }
    }

    /// Moves the shelf into initialization. Only the first caller wins.
    pub(crate) fn begin_init(&self) -> Result<()> {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Pending => {
                state.phase = Phase::Initializing;
                Ok(())
            }
            Phase::Initializing | Phase::Open => Err(Error::AlreadyInitialized),
            Phase::Closed => Err(Error::Closed),
        }
    }

    /// Stocks the shelf with its initial targets and opens it.
    pub(crate) fn finish_init(&self, targets: Vec<T>) {
        let mut state = self.state.lock();
        state.idle.extend(targets);
        state.phase = Phase::Open;
        drop(state);
        self.returned.notify_all();
    }

    /// Returns to the pending phase after a failed initialization.
    pub(crate) fn abort_init(&self) {
        let mut state = self.state.lock();
        if state.phase == Phase::Initializing {
            state.phase = Phase::Pending;
        }
    }

    /// Reserves a slot, waiting or failing per `exhaustion` when none is
    /// free.
    pub(crate) fn checkout(&self, exhaustion: Exhaustion) -> Result<Slot<T>> {
        let started = Instant::now();
        let deadline = match exhaustion {
            Exhaustion::Block(Some(max_wait)) => Some(started + max_wait),
            Exhaustion::Block(None) | Exhaustion::Fail => None,
        };

        let mut state = self.state.lock();
        loop {
            match state.phase {
                Phase::Pending | Phase::Initializing => return Err(Error::NotInitialized),
                Phase::Closed => return Err(Error::Closed),
                Phase::Open => {}
            }

            if let Some(target) = state.idle.pop() {
                let id = state.issue();
                return Ok(Slot::Idle(id, target));
            }

            // The shelf is empty, so every live target is outstanding.
            if self.max_size.admits(state.outstanding.len()) {
                let id = state.issue();
                return Ok(Slot::Vacant(id));
            }

            if exhaustion == Exhaustion::Fail {
                self.counters.exhausted.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(max_size = %self.max_size, "target pool exhausted");
                return Err(Error::Exhausted {
                    max_size: self.max_size.limit().unwrap_or_default(),
                });
            }

            state.waiters += 1;
            let timed_out = match deadline {
                Some(deadline) => self.returned.wait_until(&mut state, deadline).timed_out(),
                None => {
                    self.returned.wait(&mut state);
                    false
                }
            };
            state.waiters -= 1;

            let still_full = state.phase == Phase::Open
                && state.idle.is_empty()
                && !self.max_size.admits(state.outstanding.len());
            if timed_out && still_full {
                let waited = started.elapsed();
                self.counters.exhausted.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(?waited, max_size = %self.max_size, "timed out waiting for a target");
                return Err(Error::Timeout { waited });
            }
        }
    }

    /// Gives up a reserved slot whose target never reached the caller.
    pub(crate) fn forfeit(&self, id: LeaseId) {
        let mut state = self.state.lock();
        state.outstanding.remove(&id);
        drop(state);
        self.returned.notify_one();
    }

    /// Takes a lent target back.
    ///
    /// Returns the target when it must be destroyed instead of shelved:
    /// the pool is closed, `keep` is false, or `max_idle` targets are
    /// already idle.
    pub(crate) fn checkin(
        &self,
        id: LeaseId,
        target: T,
        keep: bool,
        max_idle: Option<usize>,
    ) -> Result<Option<T>> {
        let mut state = self.state.lock();
        if !state.outstanding.remove(&id) {
            return Err(Error::UnknownTarget { id });
        }
        self.counters.returned.fetch_add(1, Ordering::Relaxed);

        let full = max_idle.is_some_and(|max_idle| state.idle.len() >= max_idle);
        let rejected = if state.phase == Phase::Closed || !keep || full {
            Some(target)
        } else {
            state.idle.push(target);
            None
        };
        drop(state);

        self.returned.notify_one();
        Ok(rejected)
    }

    /// Closes the shelf and hands back its idle targets. Returns `None` if
    /// it was already closed.
    pub(crate) fn close(&self) -> Option<Vec<T>> {
        let mut state = self.state.lock();
        if state.phase == Phase::Closed {
            return None;
        }
        state.phase = Phase::Closed;
        let idle = std::mem::take(&mut state.idle);
        drop(state);

        self.returned.notify_all();
        Some(idle)
    }

    /// Removes every idle target.
    pub(crate) fn drain_idle(&self) -> Vec<T> {
        let drained = std::mem::take(&mut self.state.lock().idle);
        self.returned.notify_all();
        drained
    }

    /// Builds a target, optionally validating it.
    pub(crate) fn build<F: TargetFactory<T>>(&self, factory: &F, validate: bool) -> Result<T> {
        let target = factory.create()?;
        self.counters.created.fetch_add(1, Ordering::Relaxed);

        if validate && !factory.validate(&target) {
            self.dispose(factory, vec![target]);
            return Err(Error::Validation);
        }
        Ok(target)
    }

    /// Borrows a target, building one when a vacant slot is reserved and
    /// replacing idle targets that fail validation.
    pub(crate) fn lend<F: TargetFactory<T>>(
        &self,
        factory: &F,
        exhaustion: Exhaustion,
        test_on_borrow: bool,
    ) -> Result<Lease<T>> {
        loop {
            let (reservation, target) = match self.checkout(exhaustion)? {
                Slot::Idle(id, target) => {
                    let reservation = Reservation::new(self, id);
                    if test_on_borrow && !factory.validate(&target) {
                        tracing::debug!(lease = %id, "discarding idle target that failed validation");
                        drop(reservation);
                        self.dispose(factory, vec![target]);
                        continue;
                    }
                    (reservation, target)
                }
                Slot::Vacant(id) => {
                    let reservation = Reservation::new(self, id);
                    let target = self.build(factory, test_on_borrow)?;
                    (reservation, target)
                }
            };

            let id = reservation.disarm();
            self.counters.borrowed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(lease = %id, "target borrowed");
            return Ok(Lease::new(id, target));
        }
    }

    /// Returns a lease, destroying the target if it is not kept.
    pub(crate) fn restore<F: TargetFactory<T>>(
        &self,
        factory: &F,
        lease: Lease<T>,
        test_on_return: bool,
        max_idle: Option<usize>,
    ) -> Result<()> {
        let (id, target) = lease.into_parts();
        let keep = if test_on_return {
            let reservation = Reservation::new(self, id);
            let valid = factory.validate(&target);
            reservation.disarm();
            valid
        } else {
            true
        };

        if let Some(rejected) = self.checkin(id, target, keep, max_idle)? {
            tracing::debug!(lease = %id, keep, "destroying returned target");
            self.dispose(factory, vec![rejected]);
        } else {
            tracing::debug!(lease = %id, "target returned");
        }
        Ok(())
    }

    /// Destroys targets through the factory.
    pub(crate) fn dispose<F: TargetFactory<T>>(&self, factory: &F, targets: Vec<T>) -> usize {
        let count = targets.len();
        for target in targets {
            factory.destroy(target);
        }
        self.counters
            .destroyed
            .fetch_add(count as u64, Ordering::Relaxed);
        count
    }

    pub(crate) fn max_size(&self) -> MaxSize {
        self.max_size
    }

    pub(crate) fn active_count(&self) -> usize {
        self.state.lock().outstanding.len()
    }

    pub(crate) fn idle_count(&self) -> usize {
        self.state.lock().idle.len()
    }

    pub(crate) fn stats(&self) -> PoolStats {
        let (active, idle, waiters) = {
            let state = self.state.lock();
            (state.outstanding.len(), state.idle.len(), state.waiters)
        };
        PoolStats {
            max_size: self.max_size,
            active,
            idle,
            created: self.counters.created.load(Ordering::Relaxed),
            destroyed: self.counters.destroyed.load(Ordering::Relaxed),
            borrowed_total: self.counters.borrowed.load(Ordering::Relaxed),
            returned_total: self.counters.returned.load(Ordering::Relaxed),
            exhausted_total: self.counters.exhausted.load(Ordering::Relaxed),
            waiters,
        }
    }
}

/// A reserved slot that is forfeited on drop unless disarmed.
///
/// Factory hooks run while a slot is reserved; if one of them panics the
/// slot must still be given back.
struct Reservation<'a, T> {
    shelf: &'a Shelf<T>,
    id: LeaseId,
    armed: bool,
}

impl<'a, T> Reservation<'a, T> {
    fn new(shelf: &'a Shelf<T>, id: LeaseId) -> Self {
        Self {
            shelf,
            id,
            armed: true,
        }
    }

    /// Keeps the slot and returns its id.
    fn disarm(mut self) -> LeaseId {
        self.armed = false;
        self.id
    }
}

impl<T> Drop for Reservation<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.shelf.forfeit(self.id);
        }
    }
}
