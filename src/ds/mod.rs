pub mod entry_pool;
pub mod hash_directory;

pub use entry_pool::{ChainIter, Entry, EntryId, EntryPool, ENTRY_SIZE};
pub use hash_directory::{hash_key, HashDirectory};
