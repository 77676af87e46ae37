pub mod eviction;

pub use eviction::{evict_one, select_victim, Evicted};
