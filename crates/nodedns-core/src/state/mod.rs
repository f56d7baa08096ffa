// # Store Ownership
//
// `SharedStore` is the single in-process owner of the store document.
// Readers get snapshots; writers go through the operations below, which
// hold the write lock across mutate-and-save so a concurrent reload from
// the file watcher can never interleave with a reconciliation write.

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{Store, forward_label};
use crate::error::{Error, Result};
use crate::traits::StoreBackend;

/// Cloneable handle to the process-wide store
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<Store>>,
    backend: Arc<dyn StoreBackend>,
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("backend", &self.backend.describe())
            .finish_non_exhaustive()
    }
}

impl SharedStore {
    /// Load the document from `backend` and take ownership of it
    pub async fn open(backend: Arc<dyn StoreBackend>) -> Result<Self> {
        let store = backend.load().await?;
        tracing::info!(
            "Store opened from {}: {} node(s)",
            backend.describe(),
            store.nodes.len()
        );
        Ok(Self {
            inner: Arc::new(RwLock::new(store)),
            backend,
        })
    }

    /// Copy of the current document
    pub async fn snapshot(&self) -> Store {
        self.inner.read().await.clone()
    }

    /// Run `f` against the current document without cloning it
    pub async fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        f(&*self.inner.read().await)
    }

    /// Re-read the document from the backend, replacing the in-memory copy
    ///
    /// On error the current document is kept.
    pub async fn reload(&self) -> Result<()> {
        let mut guard = self.inner.write().await;
        let fresh = self.backend.load().await?;
        *guard = fresh;
        tracing::info!(
            "Store reloaded from {}: {} node(s)",
            self.backend.describe(),
            guard.nodes.len()
        );
        Ok(())
    }

    /// Record a successful update on a node and persist the document
    ///
    /// `dns_name` is the node's name as resolved before the provider call.
    /// A reload may have reordered or shrunk the node list since then, so the
    /// node is located again under the write lock: at `index` if it still
    /// carries that name, otherwise at the first node that does.
    pub async fn set_forward_name(
        &self,
        index: i64,
        dns_name: &str,
        value: &str,
        host_type: &str,
    ) -> Result<()> {
        let mut guard = self.inner.write().await;
        let position = locate_node(&guard, index, dns_name)?;
        let label = forward_label(value, host_type);
        let previous = std::mem::replace(&mut guard.nodes[position].forward_name, label);

        if let Err(e) = self.backend.save(&guard).await {
            // Keep memory consistent with what is on disk
            guard.nodes[position].forward_name = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Backend location (for logging)
    pub fn describe(&self) -> String {
        self.backend.describe()
    }
}

fn locate_node(store: &Store, index: i64, dns_name: &str) -> Result<usize> {
    let at_index = usize::try_from(index)
        .ok()
        .filter(|&i| store.nodes.get(i).is_some_and(|n| n.dns_name == dns_name));
    if let Some(position) = at_index {
        return Ok(position);
    }

    if let Some(position) = store.nodes.iter().position(|n| n.dns_name == dns_name) {
        tracing::warn!(
            "Node {} moved to index {} during update, writing there",
            dns_name,
            position
        );
        return Ok(position);
    }

    store.node(index)?;
    Err(Error::state_store(format!(
        "Node {} no longer names {}",
        index, dns_name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Node;

    fn two_nodes() -> Store {
        Store {
            nodes: vec![
                Node::new("home", "home.example.com"),
                Node::new("nas", "nas.example.com"),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_set_forward_name_persists() {
        let backend = MemoryBackend::with_store(two_nodes());
        let shared = SharedStore::open(Arc::new(backend.clone())).await.unwrap();

        shared.set_forward_name(1, "nas.example.com", "1.2.3.4", "A").await.unwrap();

        assert_eq!(shared.snapshot().await.nodes[1].forward_name, "1.2.3.4#A");
        assert_eq!(backend.stored().await.nodes[1].forward_name, "1.2.3.4#A");
        assert_eq!(backend.save_count(), 1);
    }

    #[tokio::test]
    async fn test_set_forward_name_out_of_range_does_not_save() {
        let backend = MemoryBackend::with_store(two_nodes());
        let shared = SharedStore::open(Arc::new(backend.clone())).await.unwrap();

        let result = shared.set_forward_name(2, "gone.example.com", "1.2.3.4", "A").await;

        assert!(matches!(result, Err(crate::Error::OutOfRange { .. })));
        assert_eq!(backend.save_count(), 0);
    }

    #[tokio::test]
    async fn test_reload_picks_up_external_changes() {
        let backend = MemoryBackend::with_store(two_nodes());
        let shared = SharedStore::open(Arc::new(backend.clone())).await.unwrap();

        let mut edited = two_nodes();
        edited.port = Some("9000".to_string());
        backend.save(&edited).await.unwrap();

        assert_eq!(shared.read(|s| s.listen_port()).await, crate::config::DEFAULT_PORT);
        shared.reload().await.unwrap();
        assert_eq!(shared.read(|s| s.listen_port()).await, 9000);
    }

    #[tokio::test]
    async fn test_set_forward_name_follows_reordered_node() {
        let backend = MemoryBackend::with_store(two_nodes());
        let shared = SharedStore::open(Arc::new(backend.clone())).await.unwrap();

        // External edit swaps the nodes between resolution and write-back
        let mut edited = two_nodes();
        edited.nodes.reverse();
        backend.save(&edited).await.unwrap();
        shared.reload().await.unwrap();

        shared
            .set_forward_name(0, "home.example.com", "1.2.3.4", "A")
            .await
            .unwrap();

        let stored = backend.stored().await;
        assert_eq!(stored.nodes[0].dns_name, "nas.example.com");
        assert_eq!(stored.nodes[0].forward_name, "");
        assert_eq!(stored.nodes[1].forward_name, "1.2.3.4#A");
    }

    #[tokio::test]
    async fn test_set_forward_name_for_removed_node_fails() {
        let backend = MemoryBackend::with_store(two_nodes());
        let shared = SharedStore::open(Arc::new(backend.clone())).await.unwrap();

        let mut edited = two_nodes();
        edited.nodes[0] = Node::new("other", "other.example.com");
        backend.save(&edited).await.unwrap();
        shared.reload().await.unwrap();
        let saves = backend.save_count();

        let result = shared
            .set_forward_name(0, "home.example.com", "1.2.3.4", "A")
            .await;

        assert!(matches!(result, Err(Error::StateStore(_))));
        assert_eq!(backend.save_count(), saves);
        assert_eq!(shared.snapshot().await.nodes[0].forward_name, "");
    }
}
