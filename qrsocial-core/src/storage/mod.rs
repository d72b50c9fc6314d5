//! Durable key-value storage for the session record.
//!
//! Two backends:
//! - **File** ([`FileStore`]): a JSON object on disk, surviving restarts
//!   (the CLI's equivalent of browser `localStorage`).
//! - **Memory** ([`MemoryStore`]): process-local, lost on exit. Useful for
//!   tests and for embedding where the host owns persistence.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Storage serialization error: {0}")]
    Serialization(String),
}

/// Synchronous string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Whether values survive a process restart.
    fn is_persistent(&self) -> bool;
}
