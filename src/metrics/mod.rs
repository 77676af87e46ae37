//! Hit/miss/eviction counters and occupancy diagnostics.
//!
//! Counters are always recorded; they are three integer bumps on the hot
//! path. The occupancy walk visits every chain and is only produced on
//! demand (see [`CacheConfig::detailed_stats`](crate::config::CacheConfig)).

pub mod snapshot;

pub use snapshot::{CacheStats, OccupancyReport};

/// Running counters owned by a cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsCounters {
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl StatsCounters {
    #[inline]
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    #[inline]
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    #[inline]
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
