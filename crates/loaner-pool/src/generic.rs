//! Lazily growing pool.

use crate::shelf::Shelf;
use loaner_core::{
    Lease, MaxSize, PoolSettings, PoolStats, PoolingConfig, Result, TargetFactory, TargetPool,
};

/// A pool that creates targets on demand up to its maximum size.
///
/// `create_pool` only builds `min_idle` targets; the rest are built the
/// first time a borrow finds the shelf empty and capacity left. When every
/// slot is taken, [`WhenExhausted`](loaner_core::WhenExhausted) decides:
/// `Fail` returns [`Error::Exhausted`](loaner_core::Error::Exhausted)
/// straight away, `Block` waits for a return (bounded by `max_wait_ms`,
/// after which [`Error::Timeout`](loaner_core::Error::Timeout) is
/// returned). Returned targets beyond `max_idle` are destroyed.
pub struct GenericPool<T, F> {
    factory: F,
    settings: PoolSettings,
    shelf: Shelf<T>,
}

impl<T, F> GenericPool<T, F>
where
    T: Send,
    F: TargetFactory<T>,
{
    /// Creates a pool. Settings are checked by `create_pool`.
    pub fn new(factory: F, settings: PoolSettings) -> Self {
        Self {
            shelf: Shelf::new(settings.max_size),
            factory,
            settings,
        }
    }

    /// Creates a blocking pool with the given size and default settings.
    pub fn with_max_size(factory: F, max_size: MaxSize) -> Self {
        Self::new(factory, PoolSettings::default().with_max_size(max_size))
    }

    /// Returns the pool settings.
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Destroys every idle target and returns how many were removed.
    pub fn clear(&self) -> usize {
        let idle = self.shelf.drain_idle();
        let cleared = self.shelf.dispose(&self.factory, idle);
        tracing::debug!(cleared, "cleared idle targets");
        cleared
    }
}

impl<T, F> PoolingConfig for GenericPool<T, F>
where
    T: Send,
    F: TargetFactory<T>,
{
    fn max_size(&self) -> MaxSize {
        self.shelf.max_size()
    }

    fn active_count(&self) -> usize {
        self.shelf.active_count()
    }

    fn idle_count(&self) -> usize {
        self.shelf.idle_count()
    }

    fn stats(&self) -> PoolStats {
        self.shelf.stats()
    }
}

impl<T, F> TargetPool for GenericPool<T, F>
where
    T: Send,
    F: TargetFactory<T>,
{
    type Target = T;

    fn create_pool(&self) -> Result<()> {
        self.settings.validate()?;
        self.shelf.begin_init()?;

        let mut warm = Vec::with_capacity(self.settings.min_idle);
        for _ in 0..self.settings.min_idle {
            match self.shelf.build(&self.factory, self.settings.test_on_borrow) {
                Ok(target) => warm.push(target),
                Err(e) => {
                    self.shelf.dispose(&self.factory, warm);
                    self.shelf.abort_init();
                    return Err(e);
                }
            }
        }

        self.shelf.finish_init(warm);
        tracing::info!(
            max_size = %self.settings.max_size,
            min_idle = self.settings.min_idle,
            when_exhausted = ?self.settings.when_exhausted,
            "target pool created"
        );
        Ok(())
    }

    fn get_target(&self) -> Result<Lease<T>> {
        self.shelf.lend(
            &self.factory,
            self.settings.exhaustion(),
            self.settings.test_on_borrow,
        )
    }

    fn release_target(&self, lease: Lease<T>) -> Result<()> {
        self.shelf.restore(
            &self.factory,
            lease,
            self.settings.test_on_return,
            self.settings.max_idle,
        )
    }

    fn destroy(&self) -> Result<()> {
        match self.shelf.close() {
            Some(idle) => {
                let destroyed = self.shelf.dispose(&self.factory, idle);
                tracing::info!(
                    destroyed,
                    still_borrowed = self.shelf.active_count(),
                    "target pool destroyed"
                );
            }
            None => tracing::debug!("target pool already destroyed"),
        }
        Ok(())
    }
}
