//! Record store, where candidate records are mirrored.

pub mod memory;
pub mod notion;
pub mod traits;

pub use memory::MemoryStore;
pub use notion::NotionStore;
pub use traits::{RecordStore, RecordUpdate, StoredRecord};
