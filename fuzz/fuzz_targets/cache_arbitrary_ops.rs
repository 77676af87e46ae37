#![no_main]

use dptcache::error::CacheError;
use dptcache::CacheConfig;
use dptcache::Cache;
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

// Fuzz arbitrary operation sequences on Cache
//
// The first two bytes pick the configuration; the rest drive put, get,
// empty and stats. A model map tracks the last value put per key: any hit
// must return exactly that value.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let config = CacheConfig::default()
        .with_hash_chain_length(1 + (data[0] % 8) as usize)
        .with_nentries_percentage(5 + (data[1] % 91) as usize);
    let Ok(mut cache) = Cache::create_with(config, 512 + (data[0] as usize) * 16) else {
        // Some combinations cannot fit a directory in a small budget.
        return;
    };
    let mut model: HashMap<u32, Vec<u8>> = HashMap::new();

    let mut idx = 2;
    while idx + 1 < data.len() {
        let op = data[idx] % 5;
        let arg = data[idx + 1];
        let key = u32::from(arg % 32);

        match op {
            0 | 1 => {
                // put
                let len = 1 + (arg as usize * 3) % 400;
                let value = vec![arg; len];
                match cache.put(key, &value) {
                    Ok(stored) => {
                        assert_eq!(stored, &value[..]);
                        model.insert(key, value);
                    }
                    Err(CacheError::TooBig { max_length, .. }) => {
                        assert!(len > max_length);
                    }
                    Err(other) => panic!("unexpected put error: {other:?}"),
                }
            }
            2 => {
                // get
                if let Some(bytes) = cache.get(key) {
                    assert_eq!(Some(bytes), model.get(&key).map(Vec::as_slice));
                }
            }
            3 => {
                // empty
                cache.empty();
                model.clear();
                assert!(cache.is_empty());
            }
            4 => {
                // stats, optionally resetting
                let reset = arg % 2 == 0;
                cache.stats(reset);
                if reset {
                    let stats = cache.stats(false);
                    assert_eq!(stats.hits + stats.misses + stats.evictions, 0);
                }
            }
            _ => unreachable!(),
        }

        if let Err(err) = cache.check_invariants() {
            panic!("invariant violated: {err}");
        }

        idx += 2;
    }
});
