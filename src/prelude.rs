pub use crate::builder::CacheBuilder;
pub use crate::cache::{Cache, CacheInfo};
pub use crate::config::CacheConfig;
pub use crate::error::{CacheError, InvariantError};
pub use crate::metrics::{CacheStats, OccupancyReport};
