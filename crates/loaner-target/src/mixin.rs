//! Read-only pool statistics capability.

use loaner_core::{MaxSize, PoolStats, PoolingConfig};
use std::fmt;
use std::sync::Arc;

/// Statistics view that can be attached to a proxy.
///
/// Cloning is cheap and every clone observes the same pool. The handle
/// offers no way to borrow, return, or destroy targets.
#[derive(Clone)]
pub struct PoolingConfigMixin {
    view: Arc<dyn PoolingConfig>,
}

impl PoolingConfigMixin {
    /// Wraps a statistics view.
    pub fn new(view: Arc<dyn PoolingConfig>) -> Self {
        Self { view }
    }
}

impl PoolingConfig for PoolingConfigMixin {
    fn max_size(&self) -> MaxSize {
        self.view.max_size()
    }

    fn active_count(&self) -> usize {
        self.view.active_count()
    }

    fn idle_count(&self) -> usize {
        self.view.idle_count()
    }

    fn stats(&self) -> PoolStats {
        self.view.stats()
    }
}

impl fmt::Debug for PoolingConfigMixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PoolingConfigMixin")
            .field(&self.view.stats())
            .finish()
    }
}
