// # Memory Store Backend
//
// In-memory implementation of StoreBackend.
//
// Nothing survives a restart. Used by tests and by embedders that manage
// persistence themselves.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::config::Store;
use crate::traits::StoreBackend;

/// In-memory store backend
///
/// Clones share the same document, so a test can keep a clone to inspect
/// what was saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<Store>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that already holds `store`
    pub fn with_store(store: Store) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Copy of the last saved document
    pub async fn stored(&self) -> Store {
        self.inner.read().await.clone()
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self) -> Result<Store, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, store: &Store) -> Result<(), Error> {
        *self.inner.write().await = store.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
