//! Eagerly filled, fixed-size pool.

use crate::shelf::Shelf;
use loaner_core::{
    Error, Exhaustion, Lease, MaxSize, PoolSettings, PoolStats, PoolingConfig, Result,
    TargetFactory, TargetPool, WhenExhausted,
};

/// A pool that builds all of its targets when it is created.
///
/// The size must be bounded. Borrowers always wait when every target is
/// out, up to `max_wait_ms` if set; `when_exhausted = fail` is rejected
/// at creation. A target lost to failed validation is rebuilt on the next
/// borrow, so the pool never grows past its initial size. `max_idle` is
/// ignored because every target is meant to stay resident.
pub struct FixedPool<T, F> {
    factory: F,
    settings: PoolSettings,
    shelf: Shelf<T>,
}

impl<T, F> FixedPool<T, F>
where
    T: Send,
    F: TargetFactory<T>,
{
    /// Creates a pool from full settings. Settings are checked by
    /// `create_pool`.
    pub fn new(factory: F, settings: PoolSettings) -> Self {
        Self {
            shelf: Shelf::new(settings.max_size),
            factory,
            settings,
        }
    }

    /// Creates a pool of exactly `size` targets that waits without limit.
    pub fn with_size(factory: F, size: usize) -> Self {
        Self::new(
            factory,
            PoolSettings::default().with_max_size(MaxSize::Bounded(size)),
        )
    }

    /// Returns the pool settings.
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    fn size(&self) -> Result<usize> {
        let size = self.settings.max_size.limit().ok_or_else(|| {
            Error::invalid_config("max_size", "a fixed pool needs a bounded size")
        })?;
        if self.settings.when_exhausted == WhenExhausted::Fail {
            return Err(Error::invalid_config(
                "when_exhausted",
                "a fixed pool always blocks",
            ));
        }
        self.settings.validate()?;
        Ok(size)
    }
}

impl<T, F> PoolingConfig for FixedPool<T, F>
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

impl<T, F> TargetPool for FixedPool<T, F>
where
    T: Send,
    F: TargetFactory<T>,
{
    type Target = T;

    fn create_pool(&self) -> Result<()> {
        let size = self.size()?;
        self.shelf.begin_init()?;

        let mut targets = Vec::with_capacity(size);
        for _ in 0..size {
            match self.shelf.build(&self.factory, self.settings.test_on_borrow) {
                Ok(target) => targets.push(target),
                Err(e) => {
                    self.shelf.dispose(&self.factory, targets);
                    self.shelf.abort_init();
                    return Err(e);
                }
            }
        }

        self.shelf.finish_init(targets);
        tracing::info!(size, "fixed target pool created");
        Ok(())
    }

    fn get_target(&self) -> Result<Lease<T>> {
        self.shelf.lend(
            &self.factory,
            Exhaustion::Block(self.settings.max_wait()),
            self.settings.test_on_borrow,
        )
    }

    fn release_target(&self, lease: Lease<T>) -> Result<()> {
        self.shelf
            .restore(&self.factory, lease, self.settings.test_on_return, None)
    }

    fn destroy(&self) -> Result<()> {
        if let Some(idle) = self.shelf.close() {
            let destroyed = self.shelf.dispose(&self.factory, idle);
            tracing::info!(destroyed, "fixed target pool destroyed");
        }
        Ok(())
    }
}
