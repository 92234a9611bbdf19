//! Borrowed targets.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// Identifier a pool assigns to each outstanding borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeaseId(u64);

impl LeaseId {
    /// Creates a lease id from a raw counter value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A target lent out by a pool for the duration of one invocation.
///
/// Dropping a lease does not return it. Hand it back with
/// [`TargetPool::release_target`](crate::TargetPool::release_target), or
/// borrow through a guard that does so on every exit path.
#[must_use = "a lease must be released back to its pool"]
#[derive(Debug)]
pub struct Lease<T> {
    id: LeaseId,
    target: T,
}

impl<T> Lease<T> {
    /// Wraps a target under the id issued by the pool.
    pub fn new(id: LeaseId, target: T) -> Self {
        Self { id, target }
    }

    /// Returns the id the pool issued for this borrow.
    pub fn id(&self) -> LeaseId {
        self.id
    }

    /// Splits the lease into its id and target.
    pub fn into_parts(self) -> (LeaseId, T) {
        (self.id, self.target)
    }
}

impl<T> Deref for Lease<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.target
    }
}

impl<T> DerefMut for Lease<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.target
    }
}
