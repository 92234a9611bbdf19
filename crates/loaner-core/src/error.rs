//! Error types for pool operations.

use crate::LeaseId;
use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by a target factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for pooling operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The pool was used before `create_pool` completed.
    #[error("pool has not been created")]
    NotInitialized,

    /// `create_pool` was called on a pool that already exists.
    #[error("pool has already been created")]
    AlreadyInitialized,

    /// The pool was destroyed.
    #[error("pool is closed")]
    Closed,

    /// Every slot is borrowed and the pool fails fast.
    #[error("pool exhausted: all {max_size} targets are borrowed")]
    Exhausted {
        /// The configured maximum size.
        max_size: usize,
    },

    /// Waiting for an idle target exceeded the configured limit.
    #[error("timed out after {waited:?} waiting for an idle target")]
    Timeout {
        /// How long the caller waited.
        waited: Duration,
    },

    /// A lease that this pool did not hand out (or already took back).
    #[error("target {id} was not borrowed from this pool")]
    UnknownTarget {
        /// The identifier carried by the rejected lease.
        id: LeaseId,
    },

    /// The prototype factory could not build a target.
    #[error("target factory failed: {0}")]
    Factory(#[source] BoxError),

    /// A freshly created target was rejected by the factory's validation.
    #[error("newly created target failed validation")]
    Validation,

    /// The pool settings are inconsistent.
    #[error("invalid configuration: {field} - {message}")]
    InvalidConfig {
        /// The offending setting.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },
}

/// A specialized Result type for pooling operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps a factory failure.
    #[must_use]
    pub fn factory(cause: impl Into<BoxError>) -> Self {
        Self::Factory(cause.into())
    }

    /// Creates a new invalid configuration error.
    #[must_use]
    pub fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }

    /// Returns true when the error comes from running out of capacity,
    /// either immediately or after waiting.
    #[must_use]
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::Timeout { .. })
    }
}
