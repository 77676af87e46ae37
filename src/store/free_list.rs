//! First-fit, address-ordered free list over the byte store.
//!
//! The store is addressed by byte offset. Free space is kept as a sorted
//! vector of `(offset, length)` blocks; every other byte belongs to exactly
//! one occupied entry.
//!
//! ## Architecture
//!
//! ```text
//!   store  0                                                   store_length
//!          ├──────┬────────────┬──────┬──────────────────┬──────┤
//!          │ free │  occupied  │ free │     occupied     │ free │
//!          └──────┴────────────┴──────┴──────────────────┴──────┘
//!   blocks [ (0, 32),           (96, 16),                 (208, 48) ]
//! ```
//!
//! ## Operations
//! - `allocate(len)`: first block with `length >= len` in address order. A
//!   larger block gives up its tail so its offset (and sort position) stays
//!   put; an exact fit is removed.
//! - `release(offset, len)`: merges with the following block when
//!   `offset + len == next.offset` and with the preceding block when
//!   `prev.end() == offset`; otherwise inserts a new block.
//!
//! No two blocks are ever adjacent after a call returns.
//!
//! ## Allocation
//! The block vector is reserved up front for the worst case (free and
//! occupied granules alternating), so neither call allocates.

use crate::error::{CacheError, InvariantError, Result};

/// A run of unused store bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    pub offset: usize,
    pub length: usize,
}

impl FreeBlock {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Allocation unit: every reserved length is a multiple of this, so any
/// fragment left behind can itself be tracked as a block.
pub const GRANULE: usize = std::mem::size_of::<FreeBlock>();

/// Rounds `length` up to the next multiple of [`GRANULE`]. `None` on
/// overflow.
#[inline]
pub fn round_to_granule(length: usize) -> Option<usize> {
    length.checked_next_multiple_of(GRANULE)
}

#[derive(Debug)]
pub struct FreeList {
    blocks: Vec<FreeBlock>,
    store_length: usize,
}

impl FreeList {
    /// Creates a free list covering `store_length` bytes as one block.
    /// `store_length` must be a non-zero multiple of [`GRANULE`].
    pub fn try_new(store_length: usize) -> Result<Self> {
        if store_length == 0 || store_length % GRANULE != 0 {
            return Err(CacheError::bad_argument(format!(
                "store length {store_length} is not a positive multiple of {GRANULE}"
            )));
        }
        let max_blocks = (store_length / GRANULE).div_ceil(2);
        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(max_blocks)
            .map_err(|_| CacheError::OutOfMemory(max_blocks.saturating_mul(GRANULE)))?;
        let mut list = Self {
            blocks,
            store_length,
        };
        list.reset();
        Ok(list)
    }

    /// Returns the whole store to a single free block.
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.blocks.push(FreeBlock {
            offset: 0,
            length: self.store_length,
        });
    }

    pub fn store_length(&self) -> usize {
        self.store_length
    }

    /// Lowest free offset, or `None` when the store is full.
    pub fn first_free(&self) -> Option<usize> {
        self.blocks.first().map(|block| block.offset)
    }

    pub fn blocks(&self) -> &[FreeBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn free_bytes(&self) -> usize {
        self.blocks.iter().map(|block| block.length).sum()
    }

    pub fn largest_block(&self) -> usize {
        self.blocks.iter().map(|block| block.length).max().unwrap_or(0)
    }

    /// Reserves `length` bytes (already rounded to [`GRANULE`]) and returns
    /// their offset, or `None` when no single block is large enough.
    pub fn allocate(&mut self, length: usize) -> Option<usize> {
        debug_assert!(length > 0 && length % GRANULE == 0);
        let idx = self.blocks.iter().position(|block| block.length >= length)?;
        let block = &mut self.blocks[idx];
        if block.length > length {
            block.length -= length;
            Some(block.end())
        } else {
            let offset = block.offset;
            self.blocks.remove(idx);
            Some(offset)
        }
    }

    /// Returns `[offset, offset + length)` to the free list, coalescing with
    /// address-adjacent neighbours.
    pub fn release(&mut self, offset: usize, length: usize) {
        debug_assert!(length > 0 && offset + length <= self.store_length);
        let idx = self.blocks.partition_point(|block| block.offset < offset);
        let end = offset + length;

        let merge_prev = idx > 0 && self.blocks[idx - 1].end() == offset;
        let merge_next = idx < self.blocks.len() && self.blocks[idx].offset == end;
        debug_assert!(idx == 0 || self.blocks[idx - 1].end() <= offset);
        debug_assert!(idx == self.blocks.len() || self.blocks[idx].offset >= end);

        match (merge_prev, merge_next) {
            (true, true) => {
                let next_len = self.blocks[idx].length;
                self.blocks[idx - 1].length += length + next_len;
                self.blocks.remove(idx);
            }
            (true, false) => self.blocks[idx - 1].length += length,
            (false, true) => {
                let next = &mut self.blocks[idx];
                next.offset = offset;
                next.length += length;
            }
            (false, false) => self.blocks.insert(idx, FreeBlock { offset, length }),
        }
    }

    /// Verifies ordering, granularity, bounds and non-adjacency.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        let mut prev_end: Option<usize> = None;
        for block in &self.blocks {
            if block.length == 0 || block.length % GRANULE != 0 || block.offset % GRANULE != 0 {
                return Err(InvariantError::new(format!(
                    "free block {block:?} is not granule aligned"
                )));
            }
            if block.end() > self.store_length {
                return Err(InvariantError::new(format!(
                    "free block {block:?} runs past the store end {}",
                    self.store_length
                )));
            }
            if let Some(prev_end) = prev_end {
                if block.offset < prev_end {
                    return Err(InvariantError::new(format!(
                        "free block {block:?} overlaps or precedes its predecessor"
                    )));
                }
                if block.offset == prev_end {
                    return Err(InvariantError::new(format!(
                        "free block {block:?} is adjacent to its predecessor"
                    )));
                }
            }
            prev_end = Some(block.end());
        }
        Ok(())
    }
}
