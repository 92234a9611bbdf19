//! Concrete target pools for Loaner.
//!
//! Two pooling strategies implement [`loaner_core::TargetPool`]:
//!
//! - [`GenericPool`] grows lazily up to `max_size` and either fails fast
//!   or blocks when exhausted, as configured by `when_exhausted`.
//! - [`FixedPool`] builds its whole bounded capacity up front and always
//!   blocks when exhausted.
//!
//! Both share the same bookkeeping: a single `parking_lot` mutex guards the
//! idle targets and the set of outstanding lease ids, and a condition
//! variable wakes blocked borrowers on every return and on shutdown.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod fixed;
mod generic;
mod shelf;

pub use fixed::FixedPool;
pub use generic::GenericPool;
