//! # Loaner Target
//!
//! Invocation dispatch over a pool of interchangeable targets.
//!
//! A [`PooledInvocationTarget`] borrows one target per call, runs the
//! caller's operation against it and returns it on every exit path,
//! including panics. It exposes the pool statistics as a
//! [`PoolingConfigMixin`] that can be attached to a [`Proxy`], and it is
//! started and shut down by an owning [`TargetContext`].
//!
//! ## Example
//!
//! ```rust
//! use loaner_core::{MaxSize, PoolSettings, PoolingConfig};
//! use loaner_pool::GenericPool;
//! use loaner_target::{PooledInvocationTarget, Proxy, TargetContext};
//! use std::sync::Arc;
//!
//! let pool = GenericPool::new(
//!     || Ok::<_, loaner_core::Error>(String::new()),
//!     PoolSettings::new().with_max_size(MaxSize::Bounded(2)),
//! );
//! let target = Arc::new(PooledInvocationTarget::new("greeter", pool));
//!
//! let mut context = TargetContext::new("app");
//! context.register("greeter", target.clone()).unwrap();
//! context.start().unwrap();
//!
//! let proxy = Proxy::pooled(target);
//! let len = proxy
//!     .invoke(|s| {
//!         s.push_str("hello");
//!         Ok::<_, std::fmt::Error>(s.len())
//!     })
//!     .unwrap();
//! assert_eq!(len, 5);
//! assert_eq!(proxy.pooling_config().unwrap().idle_count(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod mixin;
pub mod proxy;
pub mod source;

pub use context::{Lifecycle, TargetContext};
pub use error::{InvokeError, TargetError};
pub use mixin::PoolingConfigMixin;
pub use proxy::Proxy;
pub use source::{Borrowed, PooledInvocationTarget};
