//! Fluent construction of caches.
//!
//! Collects the byte budget and tuning parameters, then either allocates the
//! store itself or places the cache inside a caller-owned block.
//!
//! ## Example
//!
//! ```rust
//! use dptcache::builder::CacheBuilder;
//!
//! let mut cache = CacheBuilder::new(8192)
//!     .hash_chain_length(4)
//!     .nentries_percentage(30)
//!     .build()
//!     .unwrap();
//! cache.put(1, b"hello").unwrap();
//! assert_eq!(cache.get(1), Some(&b"hello"[..]));
//!
//! let mut block = vec![0u8; 4096];
//! let cache = CacheBuilder::in_block().build_in(&mut block).unwrap();
//! assert!(!cache.is_self_allocated());
//! ```

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::Result;

/// Builder for [`Cache`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheBuilder {
    length: usize,
    config: CacheConfig,
}

impl CacheBuilder {
    /// Starts a builder for a self-allocated cache of `length` bytes.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            config: CacheConfig::default(),
        }
    }

    /// Starts a builder whose budget will be the caller's block.
    pub fn in_block() -> Self {
        Self::default()
    }

    pub fn hash_chain_length(mut self, hash_chain_length: usize) -> Self {
        self.config.hash_chain_length = hash_chain_length;
        self
    }

    pub fn nentries_percentage(mut self, nentries_percentage: usize) -> Self {
        self.config.nentries_percentage = nentries_percentage;
        self
    }

    pub fn detailed_stats(mut self, detailed_stats: bool) -> Self {
        self.config.detailed_stats = detailed_stats;
        self
    }

    /// Replaces every tuning parameter at once.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Allocates and returns the cache.
    pub fn build(self) -> Result<Cache<'static>> {
        Cache::create_with(self.config, self.length)
    }

    /// Places the cache inside `block`; the length passed to
    /// [`CacheBuilder::new`] is ignored in favour of `block.len()`.
    pub fn build_in(self, block: &mut [u8]) -> Result<Cache<'_>> {
        Cache::construct_with(self.config, block)
    }
}
