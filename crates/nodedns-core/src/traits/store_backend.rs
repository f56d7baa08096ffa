// # Store Backend Trait
//
// Defines where the store document is persisted.
//
// ## Implementations
//
// - File-based: the JSON config file (`FileBackend`)
// - In-memory: tests and embedding (`MemoryBackend`)
//
// The in-process owner of the document is `SharedStore`; a backend only
// knows how to read and write the whole thing.

use async_trait::async_trait;

use crate::config::Store;

/// Trait for store persistence
///
/// Both operations work on the full document. There is no partial update:
/// `save` overwrites whatever was stored before.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Read the full document
    ///
    /// # Returns
    ///
    /// - `Ok(Store)`: The stored document, or `Store::default()` if nothing
    ///   has been stored yet
    /// - `Err(Error)`: Storage or parse error
    async fn load(&self) -> Result<Store, crate::Error>;

    /// Replace the stored document
    async fn save(&self, store: &Store) -> Result<(), crate::Error>;

    /// Human-readable location (for logging)
    fn describe(&self) -> String;
}
