/// Point-in-time view of a cache's counters.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,

    // only filled when the cache was configured with `detailed_stats`
    pub occupancy: Option<OccupancyReport>,
}

impl CacheStats {
    /// `hits / (hits + misses)`, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Diagnostic walk of every chain and the free list.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OccupancyReport {
    pub nbins: usize,
    pub occupied_bins: usize,
    pub nentries: usize,
    pub used_entries: usize,
    pub store_length: usize,
    pub store_used: usize,
    pub free_blocks: usize,
    pub largest_free_block: usize,
    pub longest_chain: usize,

    // averaged over all bins, empty ones included
    pub mean_chain_length: f64,
    pub chain_length_variance: f64,
}

impl OccupancyReport {
    /// Builds a report from per-bin chain lengths and store figures.
    pub fn from_chain_lengths(
        chain_lengths: &[usize],
        nentries: usize,
        store_length: usize,
        free_bytes: usize,
        free_blocks: usize,
        largest_free_block: usize,
    ) -> Self {
        let nbins = chain_lengths.len();
        let used_entries: usize = chain_lengths.iter().sum();
        let (mean, variance) = if nbins == 0 {
            (0.0, 0.0)
        } else {
            let mean = used_entries as f64 / nbins as f64;
            let variance = chain_lengths
                .iter()
                .map(|&len| {
                    let d = len as f64 - mean;
                    d * d
                })
                .sum::<f64>()
                / nbins as f64;
            (mean, variance)
        };

        Self {
            nbins,
            occupied_bins: chain_lengths.iter().filter(|&&len| len > 0).count(),
            nentries,
            used_entries,
            store_length,
            store_used: store_length - free_bytes,
            free_blocks,
            largest_free_block,
            longest_chain: chain_lengths.iter().copied().max().unwrap_or(0),
            mean_chain_length: mean,
            chain_length_variance: variance,
        }
    }

    pub fn bin_occupancy(&self) -> f64 {
        ratio(self.occupied_bins, self.nbins)
    }

    pub fn entry_occupancy(&self) -> f64 {
        ratio(self.used_entries, self.nentries)
    }

    pub fn store_occupancy(&self) -> f64 {
        ratio(self.store_used, self.store_length)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
