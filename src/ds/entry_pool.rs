//! Fixed-capacity pool of entry records linked by `EntryId`.
//!
//! Every slot is allocated once, at construction, and lives for the whole
//! lifetime of the cache. A slot is either on the free-entry chain or on
//! exactly one hash-bin chain; the chain heads live in
//! [`HashDirectory`](crate::ds::hash_directory::HashDirectory).
//!
//! ## Architecture
//!
//! ```text
//!   entries (Vec<Entry>)
//!   ┌──────────┬────────────────────────────────────────────────┐
//!   │ EntryId  │ Entry { next, key, offset, length, time }      │
//!   ├──────────┼────────────────────────────────────────────────┤
//!   │ 0        │ { next: Some(2), key: 17, offset: 992, .. }    │  bin chain
//!   │ 1        │ { next: Some(3), .. }                          │  free chain
//!   │ 2        │ { next: None,    key: 81, offset: 960, .. }    │  bin chain
//!   │ 3        │ { next: None, .. }                             │  free chain
//!   └──────────┴────────────────────────────────────────────────┘
//! ```
//!
//! Links are `Option<EntryId>`; there is no back pointer, so unlinking from
//! the middle of a chain needs the predecessor from the caller.

use crate::error::{CacheError, Result};

/// Handle to one slot of an [`EntryPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub(crate) u32);

impl EntryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One entry record. Payload fields are meaningful only while the entry sits
/// on a bin chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Entry {
    pub(crate) next: Option<EntryId>,
    pub(crate) key: u32,
    pub(crate) offset: usize,
    /// Reserved store bytes, rounded up to the allocation granule.
    pub(crate) length: usize,
    /// Bytes supplied by the caller.
    pub(crate) data_len: usize,
    pub(crate) time: u64,
}

impl Entry {
    pub fn key(&self) -> u32 {
        self.key
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn data_len(&self) -> usize {
        self.data_len
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn next(&self) -> Option<EntryId> {
        self.next
    }
}

/// Bytes charged against the budget for each entry slot.
pub const ENTRY_SIZE: usize = std::mem::size_of::<Entry>();

#[derive(Debug)]
pub struct EntryPool {
    entries: Vec<Entry>,
}

impl EntryPool {
    /// Reserves `nentries` slots. Fails with `OutOfMemory` when the
    /// reservation cannot be made and `BadArgument` when `nentries` does not
    /// fit an `EntryId`.
    pub fn try_new(nentries: usize) -> Result<Self> {
        if nentries > u32::MAX as usize {
            return Err(CacheError::bad_argument(format!(
                "{nentries} entries exceed the addressable pool size"
            )));
        }
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(nentries)
            .map_err(|_| CacheError::OutOfMemory(nentries.saturating_mul(ENTRY_SIZE)))?;
        entries.resize(nentries, Entry::default());
        Ok(Self { entries })
    }

    /// Number of slots. Fixed for the lifetime of the pool.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn get(&self, id: EntryId) -> &Entry {
        &self.entries[id.index()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: EntryId) -> &mut Entry {
        &mut self.entries[id.index()]
    }

    #[inline]
    pub fn next(&self, id: EntryId) -> Option<EntryId> {
        self.entries[id.index()].next
    }

    #[inline]
    pub(crate) fn set_next(&mut self, id: EntryId, next: Option<EntryId>) {
        self.entries[id.index()].next = next;
    }

    /// Clears every slot and links them in index order into a single chain.
    /// Returns the head of that chain (`None` only for an empty pool).
    pub(crate) fn thread_free_chain(&mut self) -> Option<EntryId> {
        let n = self.entries.len();
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            *entry = Entry {
                next: (idx + 1 < n).then(|| EntryId((idx + 1) as u32)),
                ..Entry::default()
            };
        }
        (n > 0).then_some(EntryId(0))
    }

    /// Iterates a chain starting at `head`.
    pub fn chain(&self, head: Option<EntryId>) -> ChainIter<'_> {
        ChainIter {
            pool: self,
            current: head,
            remaining: self.entries.len(),
        }
    }
}

/// Iterator over the ids of one chain, head first.
///
/// Stops after `capacity` steps so a corrupted (cyclic) chain cannot loop
/// forever; `check_invariants` reports such chains separately.
pub struct ChainIter<'a> {
    pool: &'a EntryPool,
    current: Option<EntryId>,
    remaining: usize,
}

impl Iterator for ChainIter<'_> {
    type Item = EntryId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.current?;
        self.remaining -= 1;
        self.current = self.pool.next(id);
        Some(id)
    }
}
