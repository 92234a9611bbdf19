//! Pooled invocation targets.
//!
//! [`PooledInvocationTarget`] sits between invocation dispatch and a
//! [`TargetPool`]: every call borrows one target, runs against it, and hands
//! it back on every exit path. It knows nothing about the pooling
//! technology behind the pool.

use crate::{InvokeError, PoolingConfigMixin, TargetError};
use loaner_core::{Lease, LeaseId, MaxSize, PoolStats, PoolingConfig, TargetPool};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Dispatches invocations to targets borrowed from a pool.
pub struct PooledInvocationTarget<P: TargetPool> {
    name: String,
    pool: Arc<P>,
    attached: AtomicBool,
    destroyed: AtomicBool,
}

impl<P> PooledInvocationTarget<P>
where
    P: TargetPool + 'static,
{
    /// Wraps a pool. The pool is created when the target is attached.
    pub fn new(name: impl Into<String>, pool: P) -> Self {
        Self::from_shared(name, Arc::new(pool))
    }

    /// Wraps a pool that is also held elsewhere.
    pub fn from_shared(name: impl Into<String>, pool: Arc<P>) -> Self {
        Self {
            name: name.into(),
            pool,
            attached: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Returns the name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configured maximum pool size.
    pub fn max_size(&self) -> MaxSize {
        self.pool.max_size()
    }

    /// Returns true once `attach` has run.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Creates the pool. Called once by the owning context at startup.
    ///
    /// Any pool failure is wrapped in [`TargetError::Initialization`]; the
    /// target cannot be attached again afterwards.
    pub fn attach(&self) -> Result<(), TargetError> {
        if self.attached.swap(true, Ordering::AcqRel) {
            return Err(TargetError::AlreadyAttached {
                name: self.name.clone(),
            });
        }

        if let Err(source) = self.pool.create_pool() {
            tracing::error!(target_source = %self.name, error = %source, "could not create instance pool");
            return Err(TargetError::Initialization {
                name: self.name.clone(),
                source,
            });
        }

        tracing::info!(
            target_source = %self.name,
            max_size = %self.pool.max_size(),
            "target source attached"
        );
        Ok(())
    }

    /// Borrows a target from the pool.
    pub fn get_target(&self) -> loaner_core::Result<Lease<P::Target>> {
        self.pool.get_target()
    }

    /// Returns a target obtained from [`get_target`](Self::get_target).
    pub fn release_target(&self, lease: Lease<P::Target>) -> loaner_core::Result<()> {
        self.pool.release_target(lease)
    }

    /// Borrows a target behind a guard that returns it when dropped.
    pub fn borrow(&self) -> loaner_core::Result<Borrowed<'_, P>> {
        let lease = self.pool.get_target()?;
        Ok(Borrowed {
            lease: Some(lease),
            pool: &self.pool,
        })
    }

    /// Runs `op` against a borrowed target.
    ///
    /// The target goes back to the pool whether `op` returns `Ok`, returns
    /// `Err`, or panics. When `op` succeeds, a failure to return the target
    /// is reported as [`InvokeError::Pool`]; when `op` fails, its error wins
    /// and the return failure is only logged.
    pub fn invoke<R, E, F>(&self, op: F) -> Result<R, InvokeError<E>>
    where
        F: FnOnce(&mut P::Target) -> Result<R, E>,
    {
        let mut guard = self.borrow().map_err(InvokeError::Pool)?;
        match op(&mut *guard) {
            Ok(value) => {
                guard.release().map_err(InvokeError::Pool)?;
                Ok(value)
            }
            Err(e) => {
                drop(guard);
                Err(InvokeError::Operation(e))
            }
        }
    }

    /// Returns the read-only statistics capability for this pool.
    pub fn pooling_config_mixin(&self) -> PoolingConfigMixin {
        let view: Arc<dyn PoolingConfig> = self.pool.clone();
        PoolingConfigMixin::new(view)
    }

    /// Returns a statistics snapshot.
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Shuts the pool down. Only the first call reaches the pool.
    pub fn destroy(&self) -> loaner_core::Result<()> {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            tracing::debug!(target_source = %self.name, "target source already destroyed");
            return Ok(());
        }
        tracing::info!(target_source = %self.name, "destroying target source");
        self.pool.destroy()
    }
}

impl<P: TargetPool> std::fmt::Debug for PooledInvocationTarget<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledInvocationTarget")
            .field("name", &self.name)
            .field("stats", &self.pool.stats())
            .finish_non_exhaustive()
    }
}

/// A borrowed target that returns itself to the pool on drop.
pub struct Borrowed<'a, P: TargetPool> {
    lease: Option<Lease<P::Target>>,
    pool: &'a P,
}

impl<P: TargetPool> Borrowed<'_, P> {
    /// Returns the id of the underlying lease.
    pub fn id(&self) -> LeaseId {
        self.lease().id()
    }

    /// Returns the target now, reporting any failure.
    pub fn release(mut self) -> loaner_core::Result<()> {
        match self.lease.take() {
            Some(lease) => self.pool.release_target(lease),
            None => Ok(()),
        }
    }

    fn lease(&self) -> &Lease<P::Target> {
        self.lease.as_ref().expect("lease is held until release")
    }
}

impl<P: TargetPool> Deref for Borrowed<'_, P> {
    type Target = P::Target;

    fn deref(&self) -> &Self::Target {
        self.lease()
    }
}

impl<P: TargetPool> DerefMut for Borrowed<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.lease.as_mut().expect("lease is held until release")
    }
}

impl<P: TargetPool> Drop for Borrowed<'_, P> {
    fn drop(&mut self) {
        if let Some(lease) = self.lease.take() {
            let id = lease.id();
            if let Err(e) = self.pool.release_target(lease) {
                tracing::warn!(lease = %id, error = %e, "failed to return target to pool");
            }
        }
    }
}
