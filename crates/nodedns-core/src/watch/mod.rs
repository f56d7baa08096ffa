//! Store file watcher for hot reload.
//!
//! The notify callback runs on notify's own thread; it only forwards a
//! signal over a channel. The reload itself happens on a tokio task that
//! goes through [`SharedStore::reload`], so it is serialized with every
//! other store access.
//!
//! The parent directory is watched rather than the file, so editors that
//! save by writing a new file and renaming it over the old one are still
//! picked up.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::state::SharedStore;

/// A watcher that reloads a [`SharedStore`] when its file changes.
pub struct StoreWatcher {
    path: PathBuf,
    store: SharedStore,
}

/// Running watcher. Dropping it stops both the notify watcher and the
/// reload task.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl StoreWatcher {
    /// Create a watcher for `path` that reloads `store`.
    pub fn new(path: &Path, store: SharedStore) -> Self {
        Self {
            path: path.to_path_buf(),
            store,
        }
    }

    /// Start watching. Must be called from within a tokio runtime.
    pub fn run(self) -> Result<WatchHandle, notify::Error> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let file_name = self.path.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if relevant {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let watch_dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        let store = self.store;
        let path = self.path.clone();
        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                tracing::info!(path = %path.display(), "Store file changed, reloading");
                if let Err(e) = store.reload().await {
                    tracing::error!(
                        "Failed to reload store: {}. Keeping current configuration.",
                        e
                    );
                }
            }
        });

        tracing::info!(path = %self.path.display(), "Store watcher started");
        Ok(WatchHandle {
            _watcher: watcher,
            task,
        })
    }
}
