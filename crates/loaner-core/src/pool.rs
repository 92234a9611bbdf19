//! Pooling traits.
//!
//! [`TargetPool`] is the seam between invocation dispatch and pooling
//! technology. [`PoolingConfig`] is the narrow, read-only statistics view
//! that monitoring code and proxies get instead of the pool itself.

use crate::{Lease, MaxSize, Result};
use serde::Serialize;
use std::sync::Arc;

/// Read-only view of a pool's size and usage.
///
/// Nothing reachable through this trait mutates the pool.
pub trait PoolingConfig: Send + Sync {
    /// Returns the configured maximum size.
    fn max_size(&self) -> MaxSize;

    /// Returns the number of targets currently borrowed.
    fn active_count(&self) -> usize;

    /// Returns the number of targets idle in the pool.
    fn idle_count(&self) -> usize;

    /// Returns a full statistics snapshot.
    ///
    /// The default only fills the three required figures.
    fn stats(&self) -> PoolStats {
        PoolStats {
            max_size: self.max_size(),
            active: self.active_count(),
            idle: self.idle_count(),
            ..PoolStats::default()
        }
    }
}

/// A pool of interchangeable targets, lent out one per invocation.
///
/// Implementations must tolerate concurrent `get_target` and
/// `release_target` calls and must never hand the same idle target to two
/// callers. Whether `get_target` blocks or fails when the pool is exhausted
/// is up to the implementation.
pub trait TargetPool: PoolingConfig {
    /// The pooled type.
    type Target: Send;

    /// Allocates the pool. Called once, before any borrow.
    fn create_pool(&self) -> Result<()>;

    /// Borrows a target.
    fn get_target(&self) -> Result<Lease<Self::Target>>;

    /// Returns a target obtained from [`get_target`](Self::get_target) on
    /// this pool.
    fn release_target(&self, lease: Lease<Self::Target>) -> Result<()>;

    /// Releases every resource the pool holds. Later borrows fail with
    /// [`Error::Closed`](crate::Error::Closed).
    fn destroy(&self) -> Result<()>;
}

impl<P: PoolingConfig + ?Sized> PoolingConfig for Arc<P> {
    fn max_size(&self) -> MaxSize {
        (**self).max_size()
    }

    fn active_count(&self) -> usize {
        (**self).active_count()
    }

    fn idle_count(&self) -> usize {
        (**self).idle_count()
    }

    fn stats(&self) -> PoolStats {
        (**self).stats()
    }
}

impl<P: TargetPool + ?Sized> TargetPool for Arc<P> {
    type Target = P::Target;

    fn create_pool(&self) -> Result<()> {
        (**self).create_pool()
    }

    fn get_target(&self) -> Result<Lease<Self::Target>> {
        (**self).get_target()
    }

    fn release_target(&self, lease: Lease<Self::Target>) -> Result<()> {
        (**self).release_target(lease)
    }

    fn destroy(&self) -> Result<()> {
        (**self).destroy()
    }
}

/// Pool statistics snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Configured maximum size.
    pub max_size: MaxSize,
    /// Targets currently borrowed (including ones being constructed).
    pub active: usize,
    /// Targets idle in the pool.
    pub idle: usize,
    /// Total targets created.
    pub created: u64,
    /// Total targets destroyed.
    pub destroyed: u64,
    /// Total successful borrows.
    pub borrowed_total: u64,
    /// Total successful returns.
    pub returned_total: u64,
    /// Borrows refused or timed out for lack of capacity.
    pub exhausted_total: u64,
    /// Callers currently waiting for a target.
    pub waiters: usize,
}

impl PoolStats {
    /// Returns the number of live targets, borrowed and idle.
    #[must_use]
    pub fn total(&self) -> usize {
        self.active + self.idle
    }

    /// Returns the fraction of capacity currently borrowed (0.0 to 1.0),
    /// or `None` for unbounded or zero-sized pools.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn utilization(&self) -> Option<f64> {
        match self.max_size.limit() {
            Some(0) | None => None,
            Some(limit) => Some(self.active as f64 / limit as f64),
        }
    }
}
