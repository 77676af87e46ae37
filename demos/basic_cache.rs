//! Fills a small cache past capacity and prints what survived.
//!
//! Run with: `RUST_LOG=dptcache=trace cargo run --example basic_cache`

use dptcache::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), CacheError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut cache = CacheBuilder::new(1536)
        .hash_chain_length(4)
        .nentries_percentage(25)
        .detailed_stats(true)
        .build()?;

    println!("layout: {:?}", cache.layout());
    println!("max item: {} bytes", cache.get_info().max_length);

    for i in 0..970u32 {
        cache.put(i, format!("({i})").as_bytes())?;
    }

    let survivors: Vec<u32> = (0..970).filter(|&k| cache.contains(k)).collect();
    println!("resident keys: {survivors:?}");
    for key in &survivors {
        if let Some(bytes) = cache.get(*key) {
            println!("  {key} => {}", String::from_utf8_lossy(bytes));
        }
    }
    println!("key 0 => {:?}", cache.get(0));

    let stats = cache.stats(true);
    println!(
        "hits={} misses={} evictions={} hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.hit_rate()
    );
    if let Some(report) = stats.occupancy {
        println!(
            "bins {}/{} entries {}/{} store {}/{} chain mean {:.2} var {:.2}",
            report.occupied_bins,
            report.nbins,
            report.used_entries,
            report.nentries,
            report.store_used,
            report.store_length,
            report.mean_chain_length,
            report.chain_length_variance
        );
    }

    cache.empty();
    let max = cache.get_info().max_length;
    cache.put(1, &vec![b'#'; max])?;
    println!("after empty, stored a full-size item of {max} bytes");

    cache.destroy();
    Ok(())
}
