//! Key-value store implementations.

pub mod json_file_store;
pub mod memory_store;
mod quota;

pub use json_file_store::JsonFileStore;
pub use memory_store::MemoryStore;
