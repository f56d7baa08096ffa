// # nodedns-core
//
// Core library for the nodedns record updater.
//
// ## Architecture Overview
//
// A node is a DNS name managed through one provider. This library keeps a
// provider's record pointed at whatever target the node is given:
// - **DnsProvider**: Trait for looking up, updating and creating records
// - **ProviderRegistry**: Plugin-based registry mapping provider tags to factories
// - **SharedStore**: Single owner of the persisted JSON document
// - **StoreWatcher**: Reloads the document when the file is edited externally
// - **Reconciler**: Create-or-update flow for one node, persisting on success
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Vendor API clients live in their own crates
// 2. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 3. **Library-First**: The daemon is a thin layer over this crate
// 4. **Single Owner**: All store access goes through one lock-guarded handle

pub mod config;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod state;
pub mod traits;
pub mod watch;

// Re-export core types for convenience
pub use config::{Forward, Node, ProviderSettings, Store};
pub use error::{Error, Result};
pub use reconcile::{ReconcileOutcome, ReconcileRequest, Reconciler};
pub use registry::ProviderRegistry;
pub use state::{FileBackend, MemoryBackend, SharedStore};
pub use traits::{DnsProvider, DnsProviderFactory, StoreBackend};
pub use watch::{StoreWatcher, WatchHandle};
