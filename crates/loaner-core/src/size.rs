//! Pool capacity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on the number of targets a pool may hold.
///
/// Configuration files carry this as a signed integer where any negative
/// value means "no limit", so `MaxSize` converts from and to `i64` and
/// serializes that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum MaxSize {
    /// At most this many targets, borrowed and idle together.
    Bounded(usize),
    /// No size limit.
    #[default]
    Unbounded,
}

impl MaxSize {
    /// Returns the limit, if any.
    #[must_use]
    pub fn limit(self) -> Option<usize> {
        match self {
            Self::Bounded(n) => Some(n),
            Self::Unbounded => None,
        }
    }

    /// Returns true if a limit is set.
    #[must_use]
    pub fn is_bounded(self) -> bool {
        matches!(self, Self::Bounded(_))
    }

    /// Returns true if a pool currently holding `total` targets may create
    /// one more.
    #[must_use]
    pub fn admits(self, total: usize) -> bool {
        match self {
            Self::Bounded(n) => total < n,
            Self::Unbounded => true,
        }
    }
}

impl From<i64> for MaxSize {
    fn from(raw: i64) -> Self {
        usize::try_from(raw).map_or(Self::Unbounded, Self::Bounded)
    }
}

impl From<MaxSize> for i64 {
    fn from(size: MaxSize) -> Self {
        match size {
            MaxSize::Bounded(n) => i64::try_from(n).unwrap_or(i64::MAX),
            MaxSize::Unbounded => -1,
        }
    }
}

impl fmt::Display for MaxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "{n}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}
