//! Splits a byte budget into header, directory, entry pool and store.
//!
//! The planner is pure arithmetic. It charges each region the size its
//! records actually occupy, so a cache created with a budget of `n` bytes
//! never holds more than `n` bytes of cache state, whether the store is
//! self-allocated or lives inside a caller's block.
//!
//! ```text
//!   0            bins_offset       entries_offset          store_offset      total_length
//!   ├── header ──┼── nbins+1 heads ─┼── nentries entries ───┼──── store ───────┼─ slack ─┤
//! ```
//!
//! ```
//! use dptcache::config::CacheConfig;
//! use dptcache::store::layout::Layout;
//!
//! let config = CacheConfig::default()
//!     .with_hash_chain_length(4)
//!     .with_nentries_percentage(25);
//! let layout = Layout::plan(1536, &config).unwrap();
//! assert!(layout.nbins.is_power_of_two());
//! assert!(layout.end() <= 1536);
//! ```

use std::mem::{align_of, size_of};

use crate::config::{CacheConfig, MIN_TOTAL_LENGTH};
use crate::ds::entry_pool::{Entry, EntryId, ENTRY_SIZE};
use crate::error::{CacheError, Result};
use crate::store::free_list::{FreeBlock, GRANULE};

/// Scalar cache state charged at the front of the budget.
#[allow(dead_code)]
#[repr(C)]
struct HeaderRecord {
    time: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    store_length: u64,
    first_free: u64,
    nbins: u32,
    nentries: u32,
}

pub const HEADER_SIZE: usize = size_of::<HeaderRecord>();

/// Bytes per chain head.
pub const BIN_SIZE: usize = size_of::<Option<EntryId>>();

/// Result of planning a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub total_length: usize,
    pub nentries: usize,
    /// Hash bins, excluding the free-chain head.
    pub nbins: usize,
    pub bins_offset: usize,
    pub entries_offset: usize,
    pub store_offset: usize,
    /// Store capacity; also the largest single item the cache can hold.
    pub store_length: usize,
}

impl Layout {
    pub fn plan(total_length: usize, config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        if total_length < MIN_TOTAL_LENGTH {
            return Err(CacheError::bad_argument(format!(
                "total length {total_length} is below the minimum of {MIN_TOTAL_LENGTH}"
            )));
        }

        let nentries = (total_length / ENTRY_SIZE)
            .checked_mul(config.nentries_percentage)
            .map(|n| n / 100)
            .ok_or_else(|| overflow(total_length))?;
        if nentries < 1 {
            return Err(CacheError::bad_argument(format!(
                "total length {total_length} leaves no room for entries"
            )));
        }

        let per_bin = (nentries / config.hash_chain_length).max(1);
        let nbins = 1usize << per_bin.ilog2();

        let bins_offset = align_up(HEADER_SIZE, align_of::<Option<EntryId>>())
            .ok_or_else(|| overflow(total_length))?;
        let entries_offset = (nbins + 1)
            .checked_mul(BIN_SIZE)
            .and_then(|bins| bins.checked_add(bins_offset))
            .and_then(|end| align_up(end, align_of::<Entry>()))
            .ok_or_else(|| overflow(total_length))?;
        let store_offset = nentries
            .checked_mul(ENTRY_SIZE)
            .and_then(|entries| entries.checked_add(entries_offset))
            .and_then(|end| align_up(end, align_of::<FreeBlock>()))
            .ok_or_else(|| overflow(total_length))?;

        let available = total_length.saturating_sub(store_offset);
        let store_length = available - available % GRANULE;
        if store_length == 0 {
            return Err(CacheError::bad_argument(format!(
                "directory for {nentries} entries and {nbins} bins needs {store_offset} of \
                 {total_length} bytes, leaving no store"
            )));
        }

        Ok(Self {
            total_length,
            nentries,
            nbins,
            bins_offset,
            entries_offset,
            store_offset,
            store_length,
        })
    }

    /// First byte past the store.
    pub fn end(&self) -> usize {
        self.store_offset + self.store_length
    }
}

#[inline]
fn align_up(value: usize, align: usize) -> Option<usize> {
    value.checked_next_multiple_of(align)
}

fn overflow(total_length: usize) -> CacheError {
    CacheError::bad_argument(format!("layout arithmetic overflows for {total_length} bytes"))
}
