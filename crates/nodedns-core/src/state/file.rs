// # File Store Backend
//
// Persists the store document as a pretty-printed JSON file.
//
// ## Behaviour
//
// - Missing file: loads as an empty document (port default applies later)
// - Corrupt file: load fails; the caller decides whether to keep its
//   current in-memory copy
// - Save: full overwrite (truncate-and-write); the parent directory is
//   created if it does not exist
//
// The file is written in place rather than through a temp-file rename so
// that a watcher on the path keeps seeing the same inode.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::Error;
use crate::config::Store;
use crate::traits::StoreBackend;

/// JSON file backend
///
/// # Example
///
/// ```rust,no_run
/// use nodedns_core::state::FileBackend;
/// use nodedns_core::traits::StoreBackend;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = FileBackend::new("data.json");
///     let mut store = backend.load().await?;
///     store.port = Some("9000".to_string());
///     backend.save(&store).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend for the given path (nothing is read yet)
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl StoreBackend for FileBackend {
    async fn load(&self) -> Result<Store, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Store file does not exist: {}. Starting with an empty store.",
                    self.path.display()
                );
                return Ok(Store::default());
            }
            Err(e) => {
                return Err(Error::state_store(format!(
                    "Failed to read store file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let store: Store = serde_json::from_str(&content).map_err(|e| {
            Error::state_store(format!(
                "Failed to parse store file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(
            "Loaded store from {}: {} node(s), {} forward(s), {} provider config(s)",
            self.path.display(),
            store.nodes.len(),
            store.forwards.len(),
            store.provider_configs.len()
        );
        Ok(store)
    }

    async fn save(&self, store: &Store) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(store)
            .map_err(|e| Error::state_store(format!("Failed to serialize store: {}", e)))?;

        fs::write(&self.path, json.as_bytes()).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to write store file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::info!("Store written to {}", self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Forward, Node, ProviderSettings};
    use tempfile::tempdir;

    fn populated_store() -> Store {
        let mut cloudflare = ProviderSettings::new();
        cloudflare.insert("email".to_string(), "ops@example.com".to_string());
        cloudflare.insert("key".to_string(), "secret".to_string());
        cloudflare.insert("zoneID".to_string(), "zone".to_string());

        let mut store = Store {
            nodes: vec![
                Node::new("home", "home.example.com"),
                Node::new("nas", "nas.example.cn").with_provider("aliyun"),
            ],
            forwards: vec![Forward {
                name: "office".to_string(),
                forward_name: "5.6.7.8".to_string(),
                host_type: "A".to_string(),
            }],
            port: Some("9000".to_string()),
            ..Default::default()
        };
        store.nodes[0].forward_name = "1.2.3.4#A".to_string();
        store.provider_configs.insert("cloudflare".to_string(), cloudflare);
        store
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("data.json"));

        let store = backend.load().await.unwrap();
        assert_eq!(store, Store::default());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("data.json"));
        let store = populated_store();

        backend.save(&store).await.unwrap();
        let loaded = backend.load().await.unwrap();

        assert_eq!(loaded, store);
    }

    #[tokio::test]
    async fn test_save_is_pretty_printed_full_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let backend = FileBackend::new(&path);

        backend.save(&populated_store()).await.unwrap();
        backend.save(&Store::default()).await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("\n  \"nodeCollection\": []"));
        assert!(!content.contains("home.example.com"));
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let backend = FileBackend::new(&path);

        backend.save(&populated_store()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, b"{ not json").await.unwrap();

        let result = FileBackend::new(&path).load().await;
        assert!(matches!(result, Err(Error::StateStore(_))));
    }
}
