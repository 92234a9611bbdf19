//! # Loaner Core
//!
//! Contracts shared by every Loaner crate: the [`TargetPool`] capability
//! that concrete pooling technologies implement, the read-only
//! [`PoolingConfig`] statistics view, the [`TargetFactory`] used for
//! prototype construction, and the error type all of them report through.
//!
//! Invocation dispatch only ever depends on these traits, so a pool
//! implementation can be swapped without touching the code that surrounds
//! each call with borrow/use/release.
//!
//! ## Example
//!
//! ```rust
//! use loaner_core::{MaxSize, PoolSettings, WhenExhausted};
//!
//! let settings = PoolSettings::default()
//!     .with_max_size(MaxSize::from(4))
//!     .with_when_exhausted(WhenExhausted::Fail);
//! assert!(settings.validate().is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod factory;
pub mod lease;
pub mod pool;
pub mod settings;
pub mod size;

pub use error::{Error, Result};
pub use factory::TargetFactory;
pub use lease::{Lease, LeaseId};
pub use pool::{PoolStats, PoolingConfig, TargetPool};
pub use settings::{Exhaustion, PoolSettings, WhenExhausted};
pub use size::MaxSize;
