//! dptcache: a single-block cache allocator.
//!
//! One fixed byte budget is carved into a hash-indexed entry directory and a
//! sub-allocated byte store. Insertion evicts the oldest bin head until the
//! item fits; freed store ranges coalesce with their neighbours. Nothing is
//! allocated after construction.
//!
//! ```
//! use dptcache::prelude::*;
//!
//! let mut cache = Cache::create(1536).unwrap();
//! cache.put(42, b"answer").unwrap();
//! assert_eq!(cache.get(42), Some(&b"answer"[..]));
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod ds;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod store;

pub use cache::{Cache, CacheInfo};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
