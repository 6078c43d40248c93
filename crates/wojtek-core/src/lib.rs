pub mod config;
pub mod error;
pub mod message;
pub mod persona;
pub mod request_state;
pub mod secret;
pub mod slot;
pub mod storage;

// Re-export common types
pub use error::{Result, WojtekError};
pub use message::{ChatMessage, MessageRole};
pub use persona::PersonaMode;
pub use request_state::{RequestGuard, RequestPermit, RequestState};
pub use slot::{DataUri, ImageSlot};
pub use storage::{KeyValueStore, StorageChange, StorageError};
