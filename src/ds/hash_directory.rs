//! Chain heads for the hash bins and the free-entry chain.
//!
//! The directory holds `nbins + 1` heads. Heads `0..nbins` are hash bins;
//! head `nbins` is the free-entry chain. Entries are appended at the tail of
//! a bin so the head of every bin is the entry that has been in that bin the
//! longest, which is what the head-scan eviction relies on.
//!
//! ```text
//!   heads[0]      ─► e4 ─► e7
//!   heads[1]      ─► (empty)
//!   heads[2]      ─► e0
//!   heads[3]      ─► e2 ─► e5 ─► e6
//!   heads[nbins]  ─► e1 ─► e3        (free chain)
//! ```

use crate::ds::entry_pool::{ChainIter, EntryId, EntryPool};
use crate::error::{CacheError, Result};

/// Fixed-point fractional golden ratio used to spread folded keys.
const GOLDEN_RATIO_32: u32 = 0x9e37_79b9;

/// Folds the high bits of `key` down, then scrambles with a multiplicative
/// hash. The low bits of the result select the bin.
#[inline]
pub fn hash_key(key: u32) -> u32 {
    let mut h = key;
    h ^= h >> 16;
    h ^= h >> 8;
    h.wrapping_mul(GOLDEN_RATIO_32)
}

#[derive(Debug)]
pub struct HashDirectory {
    heads: Vec<Option<EntryId>>,
    nbins: usize,
}

impl HashDirectory {
    /// Reserves `nbins + 1` heads. `nbins` must be a power of two.
    pub fn try_new(nbins: usize) -> Result<Self> {
        if !nbins.is_power_of_two() {
            return Err(CacheError::bad_argument(format!(
                "bin count {nbins} is not a power of two"
            )));
        }
        let slots = nbins + 1;
        let mut heads = Vec::new();
        heads
            .try_reserve_exact(slots)
            .map_err(|_| CacheError::OutOfMemory(slots * std::mem::size_of::<Option<EntryId>>()))?;
        heads.resize(slots, None);
        Ok(Self { heads, nbins })
    }

    pub fn nbins(&self) -> usize {
        self.nbins
    }

    /// Empties every bin and installs `free_head` as the free-entry chain.
    pub(crate) fn reset(&mut self, free_head: Option<EntryId>) {
        self.heads.iter_mut().for_each(|head| *head = None);
        self.heads[self.nbins] = free_head;
    }

    #[inline]
    pub fn bin_of(&self, key: u32) -> usize {
        hash_key(key) as usize & (self.nbins - 1)
    }

    #[inline]
    pub fn head(&self, bin: usize) -> Option<EntryId> {
        self.heads[bin]
    }

    #[inline]
    pub fn free_head(&self) -> Option<EntryId> {
        self.heads[self.nbins]
    }

    /// Iterates the chain at `index`; `index == nbins` walks the free chain.
    pub fn chain<'a>(&self, pool: &'a EntryPool, index: usize) -> ChainIter<'a> {
        pool.chain(self.heads[index])
    }

    /// Finds the entry holding `key`, returning its bin, its predecessor in
    /// the chain, and its id.
    pub fn find(
        &self,
        pool: &EntryPool,
        key: u32,
    ) -> Option<(usize, Option<EntryId>, EntryId)> {
        let bin = self.bin_of(key);
        let mut prev = None;
        for id in self.chain(pool, bin) {
            if pool.get(id).key == key {
                return Some((bin, prev, id));
            }
            prev = Some(id);
        }
        None
    }

    /// Links `id` at the tail of `bin`.
    pub(crate) fn append(&mut self, pool: &mut EntryPool, bin: usize, id: EntryId) {
        pool.set_next(id, None);
        let tail = self.chain(pool, bin).last();
        match tail {
            Some(tail) => pool.set_next(tail, Some(id)),
            None => self.heads[bin] = Some(id),
        }
    }

    /// Unlinks `id` from `bin`. `prev` must be its predecessor, or `None` when
    /// `id` is the head.
    pub(crate) fn unlink(
        &mut self,
        pool: &mut EntryPool,
        bin: usize,
        prev: Option<EntryId>,
        id: EntryId,
    ) {
        let next = pool.next(id);
        match prev {
            Some(prev) => pool.set_next(prev, next),
            None => {
                debug_assert_eq!(self.heads[bin], Some(id));
                self.heads[bin] = next;
            }
        }
        pool.set_next(id, None);
    }

    pub(crate) fn pop_free(&mut self, pool: &mut EntryPool) -> Option<EntryId> {
        let id = self.heads[self.nbins]?;
        self.heads[self.nbins] = pool.next(id);
        pool.set_next(id, None);
        Some(id)
    }

    pub(crate) fn push_free(&mut self, pool: &mut EntryPool, id: EntryId) {
        pool.set_next(id, self.heads[self.nbins]);
        self.heads[self.nbins] = Some(id);
    }
}
