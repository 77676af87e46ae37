#![no_main]

use dptcache::store::free_list::{FreeList, GRANULE};
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary allocate/release sequences on FreeList
//
// Live allocations are tracked alongside the list; after every step the
// free bytes plus live bytes must equal the store length and the list must
// pass its own ordering and adjacency checks.
fuzz_target!(|data: &[u8]| {
    let Some((&units, ops)) = data.split_first() else {
        return;
    };
    let store_length = (1 + units as usize) * GRANULE;
    let Ok(mut free) = FreeList::try_new(store_length) else {
        return;
    };
    let mut live: Vec<(usize, usize)> = Vec::new();

    for pair in ops.chunks_exact(2) {
        let (op, arg) = (pair[0], pair[1] as usize);
        if op % 2 == 0 {
            let length = (1 + arg % 8) * GRANULE;
            if let Some(offset) = free.allocate(length) {
                assert_eq!(offset % GRANULE, 0);
                assert!(offset + length <= store_length);
                live.push((offset, length));
            }
        } else if !live.is_empty() {
            let (offset, length) = live.swap_remove(arg % live.len());
            free.release(offset, length);
        }

        let used: usize = live.iter().map(|&(_, len)| len).sum();
        assert_eq!(used + free.free_bytes(), store_length);
        if let Err(err) = free.check_invariants() {
            panic!("free list invariant violated: {err}");
        }
    }

    for (offset, length) in live.drain(..) {
        free.release(offset, length);
    }
    assert_eq!(free.len(), 1);
    assert_eq!(free.free_bytes(), store_length);
});
