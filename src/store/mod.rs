pub mod buffer;
pub mod free_list;
pub mod layout;

pub use buffer::StoreBuffer;
pub use free_list::{FreeBlock, FreeList, GRANULE};
pub use layout::Layout;
