//! Head-scan eviction: an O(nbins) approximation of LRU.
//!
//! Bins append new entries at the tail, so each bin head is the entry that
//! has been in that bin the longest. The victim is the bin head with the
//! smallest last-access time; on ties the lowest bin wins. Entries deeper in
//! a chain are never considered, so an older entry behind a recently touched
//! head can outlive younger heads elsewhere.
//!
//! ```text
//!   bin 0: [t=12] ─► [t=3]      head 12
//!   bin 1: (empty)
//!   bin 2: [t=7]  ─► [t=20]     head 7   ◄── victim
//!   bin 3: [t=9]                head 9
//! ```

use tracing::trace;

use crate::ds::entry_pool::{EntryId, EntryPool};
use crate::ds::hash_directory::HashDirectory;
use crate::store::free_list::FreeList;

/// What an eviction reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evicted {
    pub id: EntryId,
    pub key: u32,
    pub offset: usize,
    pub length: usize,
    pub time: u64,
}

/// Returns the bin and id of the oldest bin head, or `None` when every bin
/// is empty.
pub fn select_victim(directory: &HashDirectory, pool: &EntryPool) -> Option<(usize, EntryId)> {
    let mut victim: Option<(usize, EntryId, u64)> = None;
    for bin in 0..directory.nbins() {
        let Some(id) = directory.head(bin) else {
            continue;
        };
        let time = pool.get(id).time;
        if victim.map_or(true, |(_, _, oldest)| time < oldest) {
            victim = Some((bin, id, time));
        }
    }
    victim.map(|(bin, id, _)| (bin, id))
}

/// Evicts the oldest bin head: unlinks it, pushes it on the free-entry chain
/// and releases its store range.
pub fn evict_one(
    directory: &mut HashDirectory,
    pool: &mut EntryPool,
    free_list: &mut FreeList,
) -> Option<Evicted> {
    let (bin, id) = select_victim(directory, pool)?;
    let entry = *pool.get(id);

    directory.unlink(pool, bin, None, id);
    directory.push_free(pool, id);
    free_list.release(entry.offset, entry.length);

    trace!(
        key = entry.key,
        bin,
        offset = entry.offset,
        length = entry.length,
        time = entry.time,
        "evicted entry"
    );

    Some(Evicted {
        id,
        key: entry.key,
        offset: entry.offset,
        length: entry.length,
        time: entry.time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::free_list::GRANULE;

    struct Parts {
        dir: HashDirectory,
        pool: EntryPool,
        free: FreeList,
    }

    fn parts(nbins: usize, nentries: usize, units: usize) -> Parts {
        let mut dir = HashDirectory::try_new(nbins).unwrap();
        let mut pool = EntryPool::try_new(nentries).unwrap();
        let head = pool.thread_free_chain();
        dir.reset(head);
        Parts {
            dir,
            pool,
            free: FreeList::try_new(units * GRANULE).unwrap(),
        }
    }

    fn occupy(p: &mut Parts, key: u32, time: u64) -> EntryId {
        let offset = p.free.allocate(GRANULE).unwrap();
        let id = p.dir.pop_free(&mut p.pool).unwrap();
        {
            let entry = p.pool.get_mut(id);
            entry.key = key;
            entry.offset = offset;
            entry.length = GRANULE;
            entry.data_len = 1;
            entry.time = time;
        }
        let bin = p.dir.bin_of(key);
        p.dir.append(&mut p.pool, bin, id);
        id
    }

    /// First key >= `start` that hashes to `bin`.
    fn key_in_bin(dir: &HashDirectory, bin: usize, start: u32) -> u32 {
        (start..).find(|&k| dir.bin_of(k) == bin).unwrap()
    }

    #[test]
    fn empty_directory_has_no_victim() {
        let mut p = parts(4, 4, 4);
        assert_eq!(select_victim(&p.dir, &p.pool), None);
        assert_eq!(evict_one(&mut p.dir, &mut p.pool, &mut p.free), None);
    }

    #[test]
    fn oldest_head_is_chosen() {
        let mut p = parts(4, 4, 8);
        let k0 = key_in_bin(&p.dir, 0, 0);
        let k2 = key_in_bin(&p.dir, 2, 0);
        let k3 = key_in_bin(&p.dir, 3, 0);
        occupy(&mut p, k0, 12);
        let victim = occupy(&mut p, k2, 7);
        occupy(&mut p, k3, 9);

        assert_eq!(select_victim(&p.dir, &p.pool), Some((2, victim)));
    }

    #[test]
    fn older_entry_behind_head_is_ignored() {
        let mut p = parts(2, 4, 8);
        let k0a = key_in_bin(&p.dir, 0, 0);
        let k0b = key_in_bin(&p.dir, 0, k0a + 1);
        let k1 = key_in_bin(&p.dir, 1, 0);
        occupy(&mut p, k0a, 12);
        occupy(&mut p, k0b, 1);
        let victim = occupy(&mut p, k1, 5);

        assert_eq!(select_victim(&p.dir, &p.pool), Some((1, victim)));
    }

    #[test]
    fn ties_go_to_lowest_bin() {
        let mut p = parts(2, 2, 4);
        let k1 = key_in_bin(&p.dir, 1, 0);
        let k0 = key_in_bin(&p.dir, 0, 0);
        occupy(&mut p, k1, 3);
        let first = occupy(&mut p, k0, 3);
        assert_eq!(select_victim(&p.dir, &p.pool), Some((0, first)));
    }

    #[test]
    fn eviction_reclaims_entry_and_store() {
        let mut p = parts(1, 2, 2);
        let a = occupy(&mut p, 10, 0);
        occupy(&mut p, 11, 1);
        assert!(p.free.is_empty());
        assert_eq!(p.dir.free_head(), None);

        let evicted = evict_one(&mut p.dir, &mut p.pool, &mut p.free).unwrap();
        assert_eq!(evicted.id, a);
        assert_eq!(evicted.key, 10);
        assert_eq!(p.dir.free_head(), Some(a));
        assert_eq!(p.free.free_bytes(), GRANULE);
        assert_eq!(p.dir.find(&p.pool, 10), None);
        assert!(p.dir.find(&p.pool, 11).is_some());
    }
}
