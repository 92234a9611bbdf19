//! Pool settings.

use crate::{Error, MaxSize, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a pool does when every slot is borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhenExhausted {
    /// Fail the borrow immediately.
    Fail,
    /// Wait for a target to be returned.
    #[default]
    Block,
}

/// Resolved exhaustion behaviour handed to pool internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    /// Fail immediately.
    Fail,
    /// Wait, forever or up to the given duration.
    Block(Option<Duration>),
}

/// Configuration for a target pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum number of targets, borrowed and idle together. Negative
    /// values mean unbounded.
    pub max_size: MaxSize,
    /// Targets created when the pool is created.
    pub min_idle: usize,
    /// Maximum number of idle targets kept; surplus returns are destroyed.
    pub max_idle: Option<usize>,
    /// Behaviour when the pool is exhausted.
    pub when_exhausted: WhenExhausted,
    /// Longest a blocked borrow waits, in milliseconds.
    pub max_wait_ms: Option<u64>,
    /// Validate idle targets before lending them.
    pub test_on_borrow: bool,
    /// Validate targets when they are returned.
    pub test_on_return: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: MaxSize::Unbounded,
            min_idle: 0,
            max_idle: None,
            when_exhausted: WhenExhausted::Block,
            max_wait_ms: None,
            test_on_borrow: false,
            test_on_return: false,
        }
    }
}

impl PoolSettings {
    /// Creates settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum pool size.
    #[must_use]
    pub fn with_max_size(mut self, max_size: MaxSize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the number of targets created up front.
    #[must_use]
    pub fn with_min_idle(mut self, min_idle: usize) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// Caps the number of idle targets kept.
    #[must_use]
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = Some(max_idle);
        self
    }

    /// Sets the exhaustion behaviour.
    #[must_use]
    pub fn with_when_exhausted(mut self, when_exhausted: WhenExhausted) -> Self {
        self.when_exhausted = when_exhausted;
        self
    }

    /// Limits how long a blocked borrow waits.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_ms = Some(u64::try_from(max_wait.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Enables validation of idle targets before they are lent.
    #[must_use]
    pub fn with_test_on_borrow(mut self, enabled: bool) -> Self {
        self.test_on_borrow = enabled;
        self
    }

    /// Enables validation of targets on return.
    #[must_use]
    pub fn with_test_on_return(mut self, enabled: bool) -> Self {
        self.test_on_return = enabled;
        self
    }

    /// Returns the configured wait limit.
    #[must_use]
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }

    /// Resolves the exhaustion behaviour.
    #[must_use]
    pub fn exhaustion(&self) -> Exhaustion {
        match self.when_exhausted {
            WhenExhausted::Fail => Exhaustion::Fail,
            WhenExhausted::Block => Exhaustion::Block(self.max_wait()),
        }
    }

    /// Checks the settings for contradictions.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.max_size.limit() {
            if self.min_idle > limit {
                return Err(Error::invalid_config(
                    "min_idle",
                    format!("{} exceeds max_size {limit}", self.min_idle),
                ));
            }
        }

        if let Some(max_idle) = self.max_idle {
            if max_idle < self.min_idle {
                return Err(Error::invalid_config(
                    "max_idle",
                    format!("{max_idle} is below min_idle {}", self.min_idle),
                ));
            }
        }

        if self.when_exhausted == WhenExhausted::Fail && self.max_wait_ms.is_some() {
            return Err(Error::invalid_config(
                "max_wait_ms",
                "only applies when when_exhausted is 'block'",
            ));
        }

        Ok(())
    }
}
