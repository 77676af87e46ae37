//! Byte storage behind the store allocator.
//!
//! A self-allocated cache owns its bytes; a cache constructed inside a
//! caller-supplied block borrows the store region of that block for its
//! whole lifetime and never frees it.

use std::ops::{Deref, DerefMut};

use crate::error::{CacheError, Result};

#[derive(Debug)]
enum Backing<'a> {
    Owned(Box<[u8]>),
    Borrowed(&'a mut [u8]),
}

#[derive(Debug)]
pub struct StoreBuffer<'a> {
    backing: Backing<'a>,
}

impl StoreBuffer<'static> {
    /// Allocates `length` zeroed bytes, reporting `OutOfMemory` instead of
    /// aborting when the allocator refuses.
    pub fn allocate(length: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(length)
            .map_err(|_| CacheError::OutOfMemory(length))?;
        bytes.resize(length, 0);
        Ok(Self {
            backing: Backing::Owned(bytes.into_boxed_slice()),
        })
    }
}

impl<'a> StoreBuffer<'a> {
    pub fn borrowed(bytes: &'a mut [u8]) -> Self {
        Self {
            backing: Backing::Borrowed(bytes),
        }
    }

    /// `true` when dropping the buffer releases memory.
    pub fn is_owned(&self) -> bool {
        matches!(self.backing, Backing::Owned(_))
    }
}

impl Deref for StoreBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.backing {
            Backing::Owned(bytes) => bytes,
            Backing::Borrowed(bytes) => bytes,
        }
    }
}

impl DerefMut for StoreBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match &mut self.backing {
            Backing::Owned(bytes) => bytes,
            Backing::Borrowed(bytes) => bytes,
        }
    }
}
