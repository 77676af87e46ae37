//! Error types for the dptcache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by construction and insertion. Closed set of
//!   four failure kinds; none leaves a partially built cache or a partially
//!   inserted item behind.
//! - [`InvariantError`]: Returned by [`Cache::check_invariants`] when the
//!   directory, entry pool or free list disagree with each other.
//!
//! ## Example Usage
//!
//! ```
//! use dptcache::error::CacheError;
//! use dptcache::Cache;
//!
//! // Below the minimum budget
//! let err = Cache::create(256).unwrap_err();
//! assert!(matches!(err, CacheError::BadArgument(_)));
//!
//! let mut cache = Cache::create(4096).unwrap();
//! let max = cache.get_info().max_length;
//! let err = cache.put(1, &vec![0u8; max + 1]).unwrap_err();
//! assert!(matches!(err, CacheError::TooBig { .. }));
//! ```
//!
//! [`Cache::check_invariants`]: crate::cache::Cache::check_invariants

use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Failure returned by cache construction and insertion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The backing allocation for a self-allocated cache could not be made.
    #[error("out of memory: could not reserve {0} bytes")]
    OutOfMemory(usize),

    /// Invalid length or configuration, or the layout could not fit the
    /// requested budget.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// A required buffer was missing (zero-length caller block).
    #[error("missing argument: {0}")]
    NullArgument(&'static str),

    /// The item can never fit the store, whatever is currently cached.
    #[error("item of {length} bytes exceeds the store capacity of {max_length} bytes")]
    TooBig { length: usize, max_length: usize },
}

impl CacheError {
    pub(crate) fn bad_argument(msg: impl Into<String>) -> Self {
        CacheError::BadArgument(msg.into())
    }
}

/// Convenience result alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`Cache::check_invariants`](crate::cache::Cache::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
