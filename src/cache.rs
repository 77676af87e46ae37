//! Single-block cache: hash directory, entry pool and sub-allocated store.
//!
//! A [`Cache`] is planned once from a byte budget and never grows. Keys are
//! `u32`; values are byte strings copied into the store.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────────────┐
//!   │ Cache                                                                 │
//!   │                                                                       │
//!   │  HashDirectory               EntryPool                 FreeList       │
//!   │  ┌───────────────┐           ┌───────────────────┐     ┌───────────┐  │
//!   │  │ bin 0  ───────┼──────────►│ e3 {key, off, len}│     │ (0, 64)   │  │
//!   │  │ bin 1  (none) │           │ e0 {key, off, len}│     │ (192, 32) │  │
//!   │  │ ...           │           │ ...               │     └─────┬─────┘  │
//!   │  │ free  ────────┼──────────►│ e1 ─► e2 ─► ...   │           │        │
//!   │  └───────────────┘           └─────────┬─────────┘           │        │
//!   │                                        │ offset/len          │        │
//!   │                                        ▼                     ▼        │
//!   │  StoreBuffer [ free | e3 bytes | e0 bytes | free | ... ]              │
//!   └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation | Behaviour                                                   |
//! |-----------|-------------------------------------------------------------|
//! | `put`     | allocate (evicting until it fits), copy, link at bin tail   |
//! | `get`     | walk the key's bin; on hit stamp the entry with the clock   |
//! | `empty`   | rebuild every structure in place; no reallocation           |
//! | `stats`   | hit/miss/eviction counters, optional occupancy walk         |
//!
//! Eviction picks the oldest *bin head* (see [`crate::policy::eviction`]).
//!
//! ## Example
//!
//! ```
//! use dptcache::{Cache, CacheConfig};
//!
//! let config = CacheConfig::default().with_hash_chain_length(4);
//! let mut cache = Cache::create_with(config, 4096).unwrap();
//!
//! cache.put(7, b"seven").unwrap();
//! assert_eq!(cache.get(7), Some(&b"seven"[..]));
//! assert_eq!(cache.get(8), None);
//!
//! let stats = cache.stats(false);
//! assert_eq!((stats.hits, stats.misses), (1, 1));
//! ```
//!
//! ## Thread Safety
//!
//! `Cache` does no locking. Share it across threads only behind an external
//! lock.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::config::CacheConfig;
use crate::ds::entry_pool::{Entry, EntryId, EntryPool};
use crate::ds::hash_directory::HashDirectory;
use crate::error::{CacheError, InvariantError, Result};
use crate::metrics::{CacheStats, OccupancyReport, StatsCounters};
use crate::policy::eviction::{self, Evicted};
use crate::store::buffer::StoreBuffer;
use crate::store::free_list::{round_to_granule, FreeList, GRANULE};
use crate::store::layout::Layout;

/// Static limits of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInfo {
    /// Largest single item the cache can ever hold.
    pub max_length: usize,
}

pub struct Cache<'a> {
    config: CacheConfig,
    layout: Layout,
    time: u64,
    len: usize,
    directory: HashDirectory,
    pool: EntryPool,
    free_list: FreeList,
    store: StoreBuffer<'a>,
    stats: StatsCounters,
}

impl Cache<'static> {
    /// Creates a self-allocated cache within a budget of `length` bytes,
    /// using the default configuration.
    pub fn create(length: usize) -> Result<Self> {
        Self::create_with(CacheConfig::default(), length)
    }

    /// Creates a self-allocated cache within a budget of `length` bytes.
    ///
    /// # Errors
    ///
    /// - `BadArgument` for an invalid config, a budget below
    ///   [`MIN_TOTAL_LENGTH`](crate::config::MIN_TOTAL_LENGTH), or a budget
    ///   too small for the planned directory.
    /// - `OutOfMemory` when the backing allocation fails.
    pub fn create_with(config: CacheConfig, length: usize) -> Result<Self> {
        let layout = Layout::plan(length, &config)?;
        let store = StoreBuffer::allocate(layout.store_length)?;
        Self::assemble(config, layout, store)
    }
}

impl<'a> Cache<'a> {
    /// Places a cache inside `block`, using the default configuration.
    pub fn construct(block: &'a mut [u8]) -> Result<Self> {
        Self::construct_with(CacheConfig::default(), block)
    }

    /// Places a cache inside caller-owned memory.
    ///
    /// The budget is `block.len()`. The store lives in the store region of
    /// `block` as computed by the layout; the cache borrows the block until
    /// it is dropped and never frees it.
    ///
    /// # Errors
    ///
    /// `NullArgument` for an empty block; otherwise as [`Cache::create_with`]
    /// minus `OutOfMemory` for the store itself.
    pub fn construct_with(config: CacheConfig, block: &'a mut [u8]) -> Result<Self> {
        if block.is_empty() {
            return Err(CacheError::NullArgument("block"));
        }
        let layout = Layout::plan(block.len(), &config)?;
        let store = StoreBuffer::borrowed(&mut block[layout.store_offset..layout.end()]);
        Self::assemble(config, layout, store)
    }

    fn assemble(config: CacheConfig, layout: Layout, store: StoreBuffer<'a>) -> Result<Self> {
        let mut pool = EntryPool::try_new(layout.nentries)?;
        let mut directory = HashDirectory::try_new(layout.nbins)?;
        let free_list = FreeList::try_new(layout.store_length)?;
        directory.reset(pool.thread_free_chain());

        debug!(
            total_length = layout.total_length,
            nentries = layout.nentries,
            nbins = layout.nbins,
            store_offset = layout.store_offset,
            store_length = layout.store_length,
            self_allocated = store.is_owned(),
            "cache constructed"
        );

        Ok(Self {
            config,
            layout,
            time: 0,
            len: 0,
            directory,
            pool,
            free_list,
            store,
            stats: StatsCounters::default(),
        })
    }

    /// Tears the cache down. Memory is released only if the cache allocated
    /// it itself; a caller-supplied block is simply handed back.
    pub fn destroy(self) {
        debug!(
            self_allocated = self.store.is_owned(),
            entries = self.len,
            "cache destroyed"
        );
    }

    /// Looks up `key`. A hit refreshes the entry's access time.
    pub fn get(&mut self, key: u32) -> Option<&[u8]> {
        let Some((_, _, id)) = self.directory.find(&self.pool, key) else {
            self.stats.record_miss();
            return None;
        };
        let time = self.tick();
        let entry = self.pool.get_mut(id);
        entry.time = time;
        let (offset, len) = (entry.offset, entry.data_len);
        self.stats.record_hit();
        Some(&self.store[offset..offset + len])
    }

    /// Copies `data` into the cache under `key` and returns the stored bytes.
    ///
    /// Evicts oldest bin heads until the item fits and an entry is free. An
    /// existing binding for `key` is replaced.
    ///
    /// # Errors
    ///
    /// - `BadArgument` for empty `data`.
    /// - `TooBig` when `data`, rounded to the allocation granule, exceeds the
    ///   store; nothing is evicted in that case.
    pub fn put(&mut self, key: u32, data: &[u8]) -> Result<&[u8]> {
        if data.is_empty() {
            return Err(CacheError::bad_argument("cannot cache an empty item"));
        }
        let max_length = self.layout.store_length;
        let length = match round_to_granule(data.len()) {
            Some(length) if length <= max_length => length,
            _ => {
                debug!(key, length = data.len(), max_length, "item rejected as too big");
                return Err(CacheError::TooBig {
                    length: data.len(),
                    max_length,
                });
            }
        };

        self.forget(key);

        let Some(offset) = self.allocate(length) else {
            return Err(CacheError::TooBig {
                length: data.len(),
                max_length,
            });
        };
        self.store[offset..offset + data.len()].copy_from_slice(data);

        let Some(id) = self.acquire_entry() else {
            self.free_list.release(offset, length);
            return Err(CacheError::TooBig {
                length: data.len(),
                max_length,
            });
        };

        let time = self.tick();
        *self.pool.get_mut(id) = Entry {
            next: None,
            key,
            offset,
            length,
            data_len: data.len(),
            time,
        };
        let bin = self.directory.bin_of(key);
        self.directory.append(&mut self.pool, bin, id);
        self.len += 1;

        Ok(&self.store[offset..offset + data.len()])
    }

    /// Returns every structure to its freshly constructed state without
    /// touching the underlying memory allocation.
    pub fn empty(&mut self) {
        self.directory.reset(self.pool.thread_free_chain());
        self.free_list.reset();
        self.time = 0;
        self.len = 0;
        self.stats.reset();
        debug!(store_length = self.layout.store_length, "cache emptied");
    }

    /// Reports the counters, then clears them when `reset` is set.
    ///
    /// With [`CacheConfig::detailed_stats`] the report also carries an
    /// [`OccupancyReport`].
    pub fn stats(&mut self, reset: bool) -> CacheStats {
        let snapshot = CacheStats {
            hits: self.stats.hits(),
            misses: self.stats.misses(),
            evictions: self.stats.evictions(),
            occupancy: self.config.detailed_stats.then(|| self.occupancy()),
        };
        if reset {
            self.stats.reset();
        }
        snapshot
    }

    pub fn get_info(&self) -> CacheInfo {
        CacheInfo {
            max_length: self.layout.store_length,
        }
    }

    /// Walks every chain and the free list. Diagnostic; O(nentries).
    pub fn occupancy(&self) -> OccupancyReport {
        let chain_lengths: Vec<usize> = (0..self.layout.nbins)
            .map(|bin| self.directory.chain(&self.pool, bin).count())
            .collect();
        OccupancyReport::from_chain_lengths(
            &chain_lengths,
            self.layout.nentries,
            self.layout.store_length,
            self.free_list.free_bytes(),
            self.free_list.len(),
            self.free_list.largest_block(),
        )
    }

    /// Number of cached items.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` if `key` is cached. Does not count as a lookup.
    pub fn contains(&self, key: u32) -> bool {
        self.directory.find(&self.pool, key).is_some()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// `true` when the cache owns (and will free) its store.
    pub fn is_self_allocated(&self) -> bool {
        self.store.is_owned()
    }

    #[inline]
    fn tick(&mut self) -> u64 {
        let time = self.time;
        self.time += 1;
        time
    }

    /// First-fit allocation, evicting until a block fits. `None` only when
    /// nothing is left to evict.
    fn allocate(&mut self, length: usize) -> Option<usize> {
        loop {
            if let Some(offset) = self.free_list.allocate(length) {
                return Some(offset);
            }
            self.evict_one()?;
        }
    }

    fn acquire_entry(&mut self) -> Option<EntryId> {
        if let Some(id) = self.directory.pop_free(&mut self.pool) {
            return Some(id);
        }
        self.evict_one()?;
        self.directory.pop_free(&mut self.pool)
    }

    fn evict_one(&mut self) -> Option<Evicted> {
        let evicted =
            eviction::evict_one(&mut self.directory, &mut self.pool, &mut self.free_list)?;
        self.len -= 1;
        self.stats.record_eviction();
        Some(evicted)
    }

    /// Drops the binding for `key`, if any. Not counted as an eviction.
    fn forget(&mut self, key: u32) -> bool {
        let Some((bin, prev, id)) = self.directory.find(&self.pool, key) else {
            return false;
        };
        let entry = *self.pool.get(id);
        self.directory.unlink(&mut self.pool, bin, prev, id);
        self.directory.push_free(&mut self.pool, id);
        self.free_list.release(entry.offset, entry.length);
        self.len -= 1;
        true
    }

    /// Verifies that the directory, entry pool and free list agree:
    ///
    /// - every entry is on exactly one chain, and every occupied entry sits
    ///   in the bin its key hashes to, with no duplicate keys;
    /// - occupied ranges and free blocks tile the store with no gap or
    ///   overlap, and no two free blocks touch.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        self.free_list.check_invariants()?;

        let nentries = self.pool.capacity();
        let mut seen = vec![false; nentries];
        let mut keys = HashSet::with_capacity(self.len);
        let mut ranges: Vec<(usize, usize)> = Vec::with_capacity(nentries + self.free_list.len());
        let mut occupied = 0usize;

        for index in 0..=self.layout.nbins {
            let is_free_chain = index == self.layout.nbins;
            for id in self.directory.chain(&self.pool, index) {
                if std::mem::replace(&mut seen[id.index()], true) {
                    return Err(InvariantError::new(format!(
                        "entry {} is reachable from more than one chain",
                        id.index()
                    )));
                }
                if is_free_chain {
                    continue;
                }
                let entry = self.pool.get(id);
                if self.directory.bin_of(entry.key) != index {
                    return Err(InvariantError::new(format!(
                        "key {} sits in bin {index} but hashes to bin {}",
                        entry.key,
                        self.directory.bin_of(entry.key)
                    )));
                }
                if !keys.insert(entry.key) {
                    return Err(InvariantError::new(format!("key {} is cached twice", entry.key)));
                }
                if entry.length == 0
                    || entry.length % GRANULE != 0
                    || entry.data_len > entry.length
                    || entry.data_len == 0
                {
                    return Err(InvariantError::new(format!(
                        "key {} has inconsistent lengths {}/{}",
                        entry.key, entry.data_len, entry.length
                    )));
                }
                ranges.push((entry.offset, entry.length));
                occupied += 1;
            }
        }

        if let Some(orphan) = seen.iter().position(|&s| !s) {
            return Err(InvariantError::new(format!(
                "entry {orphan} is not reachable from any chain"
            )));
        }
        if occupied != self.len {
            return Err(InvariantError::new(format!(
                "{occupied} entries are linked but len is {}",
                self.len
            )));
        }

        let used: usize = ranges.iter().map(|&(_, len)| len).sum();
        if used + self.free_list.free_bytes() != self.layout.store_length {
            return Err(InvariantError::new(format!(
                "occupied {used} + free {} != store length {}",
                self.free_list.free_bytes(),
                self.layout.store_length
            )));
        }

        ranges.extend(
            self.free_list
                .blocks()
                .iter()
                .map(|block| (block.offset, block.length)),
        );
        ranges.sort_unstable();
        let mut cursor = 0usize;
        for (offset, length) in ranges {
            if offset != cursor {
                return Err(InvariantError::new(format!(
                    "store range at {offset} does not start at the previous end {cursor}"
                )));
            }
            cursor = offset + length;
        }
        if cursor != self.layout.store_length {
            return Err(InvariantError::new(format!(
                "store ranges end at {cursor}, expected {}",
                self.layout.store_length
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for Cache<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("layout", &self.layout)
            .field("len", &self.len)
            .field("time", &self.time)
            .field("stats", &self.stats)
            .field("first_free", &self.free_list.first_free())
            .field("self_allocated", &self.store.is_owned())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressure_cache() -> Cache<'static> {
        let config = CacheConfig::default()
            .with_hash_chain_length(4)
            .with_nentries_percentage(25);
        Cache::create_with(config, 1536).unwrap()
    }

    // ==============================================
    // Construction
    // ==============================================

    #[test]
    fn create_plans_layout() {
        let cache = Cache::create(4096).unwrap();
        assert!(cache.is_self_allocated());
        assert!(cache.is_empty());
        assert_eq!(cache.get_info().max_length, cache.layout().store_length);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn create_rejects_small_budget() {
        assert!(matches!(Cache::create(100), Err(CacheError::BadArgument(_))));
    }

    #[test]
    fn construct_rejects_empty_block() {
        let mut block: [u8; 0] = [];
        assert!(matches!(
            Cache::construct(&mut block),
            Err(CacheError::NullArgument(_))
        ));
    }

    #[test]
    fn construct_stores_data_inside_block() {
        let mut block = vec![0u8; 2048];
        let store_offset;
        {
            let mut cache = Cache::construct(&mut block).unwrap();
            assert!(!cache.is_self_allocated());
            store_offset = cache.layout().store_offset;
            let max = cache.get_info().max_length;
            cache.put(1, &vec![0xAB; max]).unwrap();
            cache.check_invariants().unwrap();
            cache.destroy();
        }
        assert!(block[store_offset..].iter().take(16).all(|&b| b == 0xAB));
    }

    #[test]
    fn constructed_and_created_caches_match() {
        let mut block = vec![0u8; 4096];
        let constructed = Cache::construct(&mut block).unwrap();
        let created = Cache::create(4096).unwrap();
        assert_eq!(constructed.layout(), created.layout());
    }

    // ==============================================
    // Put / Get
    // ==============================================

    #[test]
    fn put_then_get_round_trips() {
        let mut cache = Cache::create(4096).unwrap();
        assert_eq!(cache.put(1, b"hello").unwrap(), b"hello");
        assert_eq!(cache.get(1), Some(&b"hello"[..]));
        assert!(cache.contains(1));
        assert_eq!(cache.len(), 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn miss_leaves_structure_untouched() {
        let mut cache = Cache::create(4096).unwrap();
        cache.put(1, b"a").unwrap();
        assert_eq!(cache.get(2), None);
        assert_eq!(cache.len(), 1);
        let stats = cache.stats(false);
        assert_eq!((stats.hits, stats.misses), (0, 1));
    }

    #[test]
    fn put_replaces_existing_key() {
        let mut cache = Cache::create(4096).unwrap();
        cache.put(5, b"first").unwrap();
        cache.put(5, b"second value").unwrap();
        assert_eq!(cache.get(5), Some(&b"second value"[..]));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(false).evictions, 0);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn empty_data_rejected() {
        let mut cache = Cache::create(4096).unwrap();
        assert!(matches!(cache.put(1, b""), Err(CacheError::BadArgument(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn exact_fit_succeeds() {
        let mut cache = Cache::create(4096).unwrap();
        let max = cache.get_info().max_length;
        let data = vec![7u8; max];
        cache.put(9, &data).unwrap();
        assert_eq!(cache.get(9), Some(&data[..]));
        assert_eq!(cache.free_list.first_free(), None);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn oversize_rejected_without_eviction() {
        let mut cache = Cache::create(4096).unwrap();
        cache.put(1, b"keep me").unwrap();
        let max = cache.get_info().max_length;
        let err = cache.put(2, &vec![0u8; max + 1]).unwrap_err();
        assert_eq!(
            err,
            CacheError::TooBig {
                length: max + 1,
                max_length: max
            }
        );
        assert_eq!(cache.get(1), Some(&b"keep me"[..]));
        assert_eq!(cache.stats(false).evictions, 0);
    }

    #[test]
    fn full_size_put_evicts_everything() {
        let mut cache = Cache::create(4096).unwrap();
        for key in 0..4 {
            cache.put(key, b"small").unwrap();
        }
        let max = cache.get_info().max_length;
        cache.put(100, &vec![1u8; max]).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(false).evictions, 4);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn entry_exhaustion_evicts_once_per_put() {
        let mut cache = pressure_cache();
        let nentries = cache.layout().nentries;
        for key in 0..nentries as u32 {
            cache.put(key, b"x").unwrap();
        }
        assert_eq!(cache.stats(false).evictions, 0);
        cache.put(10_000, b"x").unwrap();
        assert_eq!(cache.stats(false).evictions, 1);
        assert_eq!(cache.len(), nentries);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn single_bin_evicts_head_even_after_get() {
        // With a single bin only its head is ever considered, so a refreshed
        // head is still the victim.
        let config = CacheConfig::default().with_hash_chain_length(64);
        let mut cache = Cache::create_with(config, 1024).unwrap();
        assert_eq!(cache.layout().nbins, 1);
        let nentries = cache.layout().nentries as u32;
        for key in 0..nentries {
            cache.put(key, b"v").unwrap();
        }
        cache.get(0);
        cache.put(nentries, b"v").unwrap();
        assert!(!cache.contains(0));
        assert!(cache.contains(1));
    }

    #[test]
    fn get_protects_head_across_bins() {
        let config = CacheConfig::default()
            .with_hash_chain_length(1)
            .with_nentries_percentage(50);
        let mut cache = Cache::create_with(config, 4096).unwrap();
        assert!(cache.layout().nbins >= 2);

        let dir = &cache.directory;
        let k0 = (0u32..).find(|&k| dir.bin_of(k) == 0).unwrap();
        let k1 = (0u32..).find(|&k| dir.bin_of(k) == 1).unwrap();
        cache.put(k0, b"zero").unwrap();
        cache.put(k1, b"one").unwrap();
        cache.get(k0);

        cache.evict_one().unwrap();
        assert!(cache.contains(k0));
        assert!(!cache.contains(k1));
    }

    // ==============================================
    // Reset / Stats
    // ==============================================

    #[test]
    fn empty_forgets_everything() {
        let mut cache = pressure_cache();
        for key in 0..20u32 {
            cache.put(key, format!("({key})").as_bytes()).unwrap();
        }
        cache.empty();
        assert!(cache.is_empty());
        for key in 0..20u32 {
            assert_eq!(cache.get(key), None);
        }
        let max = cache.get_info().max_length;
        cache.put(1, &vec![3u8; max]).unwrap();
        cache.check_invariants().unwrap();
    }

    #[test]
    fn stats_reset_is_idempotent() {
        let mut cache = pressure_cache();
        for key in 0..50u32 {
            cache.put(key, b"abc").unwrap();
            cache.get(key);
            cache.get(key + 1000);
        }
        let before = cache.stats(true);
        assert!(before.hits > 0 && before.misses > 0 && before.evictions > 0);
        let after = cache.stats(false);
        assert_eq!((after.hits, after.misses, after.evictions), (0, 0, 0));
    }

    #[test]
    fn detailed_stats_include_occupancy() {
        let config = CacheConfig::default().with_detailed_stats(true);
        let mut cache = Cache::create_with(config, 8192).unwrap();
        cache.put(1, b"one").unwrap();
        cache.put(2, b"two").unwrap();
        let report = cache.stats(false).occupancy.unwrap();
        assert_eq!(report.used_entries, 2);
        assert_eq!(report.store_used, 2 * GRANULE);
        assert_eq!(report.nbins, cache.layout().nbins);

        let plain = Cache::create(8192).unwrap().stats(false);
        assert!(plain.occupancy.is_none());
    }

    // ==============================================
    // Invariant checker
    // ==============================================

    #[test]
    fn check_invariants_detects_leaked_store() {
        let mut cache = Cache::create(4096).unwrap();
        cache.put(1, b"data").unwrap();
        cache.free_list.allocate(GRANULE).unwrap();
        assert!(cache.check_invariants().is_err());
    }

    #[test]
    fn check_invariants_detects_orphan_entry() {
        let mut cache = Cache::create(4096).unwrap();
        cache.directory.pop_free(&mut cache.pool).unwrap();
        assert!(cache.check_invariants().is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Put(u32, usize),
        Get(u32),
        Empty,
        Stats(bool),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (0u32..64, 1usize..200).prop_map(|(k, n)| Op::Put(k, n)),
            4 => (0u32..64).prop_map(Op::Get),
            1 => Just(Op::Empty),
            1 => any::<bool>().prop_map(Op::Stats),
        ]
    }

    fn payload(key: u32, len: usize) -> Vec<u8> {
        (0..len).map(|i| (key as usize + i) as u8).collect()
    }

    proptest! {
        /// Property: structural invariants hold after every operation
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_invariants_always_hold(
            ops in prop::collection::vec(op(), 1..200),
            chain in 1usize..8,
            pct in 5usize..=60,
        ) {
            let config = CacheConfig::default()
                .with_hash_chain_length(chain)
                .with_nentries_percentage(pct);
            let mut cache = Cache::create_with(config, 2048).unwrap();
            let mut model: std::collections::HashMap<u32, Vec<u8>> = Default::default();

            for op in ops {
                match op {
                    Op::Put(key, len) => {
                        let data = payload(key, len);
                        match cache.put(key, &data) {
                            Ok(stored) => {
                                prop_assert_eq!(stored, &data[..]);
                                model.insert(key, data);
                            }
                            Err(CacheError::TooBig { .. }) => {
                                prop_assert!(len > cache.get_info().max_length);
                            }
                            Err(other) => prop_assert!(false, "unexpected {:?}", other),
                        }
                    }
                    Op::Get(key) => {
                        if let Some(bytes) = cache.get(key) {
                            prop_assert_eq!(Some(bytes), model.get(&key).map(Vec::as_slice));
                        }
                    }
                    Op::Empty => {
                        cache.empty();
                        model.clear();
                    }
                    Op::Stats(reset) => {
                        cache.stats(reset);
                    }
                }
                prop_assert!(cache.check_invariants().is_ok(), "{:?}", cache.check_invariants());
            }
        }

        /// Property: a value read back is always the last value put for that key
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_get_returns_latest_put(
            ops in prop::collection::vec((0u32..32, 1usize..120), 1..150)
        ) {
            let mut cache = Cache::create(2048).unwrap();
            let mut latest = std::collections::HashMap::new();

            for (key, len) in ops {
                let data = payload(key.wrapping_add(len as u32), len);
                cache.put(key, &data).unwrap();
                latest.insert(key, data);

                for (&k, expected) in &latest {
                    if let Some(bytes) = cache.get(k) {
                        prop_assert_eq!(bytes, &expected[..]);
                    }
                }
            }
        }

        /// Property: every lookup is counted exactly once
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_lookups_are_counted(
            keys in prop::collection::vec(0u32..100, 1..300)
        ) {
            let mut cache = Cache::create(1024).unwrap();
            for (i, &key) in keys.iter().enumerate() {
                if i % 2 == 0 {
                    cache.put(key, b"value").unwrap();
                } else {
                    cache.get(key);
                }
            }
            let stats = cache.stats(false);
            prop_assert_eq!(stats.lookups(), (keys.len() / 2) as u64);
        }
    }
}
