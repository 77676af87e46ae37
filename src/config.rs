//! Tuning parameters for cache construction.
//!
//! A [`CacheConfig`] controls how a byte budget is split between the entry
//! directory and the data store. It is consumed once, by the layout planner,
//! when a cache is created.
//!
//! ```
//! use dptcache::config::CacheConfig;
//!
//! let config = CacheConfig::default()
//!     .with_hash_chain_length(4)
//!     .with_nentries_percentage(25);
//! assert!(config.validate().is_ok());
//!
//! let bad = CacheConfig::default().with_nentries_percentage(99);
//! assert!(bad.validate().is_err());
//! ```

use crate::error::{CacheError, Result};

/// Smallest total budget a cache accepts, in bytes.
pub const MIN_TOTAL_LENGTH: usize = 512;

/// Target average number of entries per hash bin.
pub const DEFAULT_HASH_CHAIN_LENGTH: usize = 8;

/// Share of the budget, in percent, measured in entry records.
pub const DEFAULT_NENTRIES_PERCENTAGE: usize = 20;

/// Accepted range for [`CacheConfig::nentries_percentage`].
pub const NENTRIES_PERCENTAGE_RANGE: std::ops::RangeInclusive<usize> = 5..=95;

/// Cache construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Desired average chain length per hash bin. Must be at least 1.
    pub hash_chain_length: usize,
    /// Percentage of `total_length / entry_size` that becomes entry slots.
    /// Must lie in `5..=95`.
    pub nentries_percentage: usize,
    /// When set, [`Cache::stats`](crate::cache::Cache::stats) also walks every
    /// chain and reports an [`OccupancyReport`](crate::metrics::OccupancyReport).
    pub detailed_stats: bool,
}

impl CacheConfig {
    pub fn with_hash_chain_length(mut self, hash_chain_length: usize) -> Self {
        self.hash_chain_length = hash_chain_length;
        self
    }

    pub fn with_nentries_percentage(mut self, nentries_percentage: usize) -> Self {
        self.nentries_percentage = nentries_percentage;
        self
    }

    pub fn with_detailed_stats(mut self, detailed_stats: bool) -> Self {
        self.detailed_stats = detailed_stats;
        self
    }

    /// Checks every parameter against its accepted range.
    pub fn validate(&self) -> Result<()> {
        if self.hash_chain_length < 1 {
            return Err(CacheError::bad_argument("hash_chain_length must be >= 1"));
        }
        if !NENTRIES_PERCENTAGE_RANGE.contains(&self.nentries_percentage) {
            return Err(CacheError::bad_argument(format!(
                "nentries_percentage must be within {}..={}, got {}",
                NENTRIES_PERCENTAGE_RANGE.start(),
                NENTRIES_PERCENTAGE_RANGE.end(),
                self.nentries_percentage
            )));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            hash_chain_length: DEFAULT_HASH_CHAIN_LENGTH,
            nentries_percentage: DEFAULT_NENTRIES_PERCENTAGE,
            detailed_stats: false,
        }
    }
}
