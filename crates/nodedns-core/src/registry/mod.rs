//! Plugin-based provider registry
//!
//! The registry maps provider type tags (the keys used in `providerConfigs`
//! and in a node's `provider` field) to factories, avoiding hardcoded
//! if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nodedns_core::registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! nodedns_provider_cloudflare::register(&registry);
//! nodedns_provider_aliyun::register(&registry);
//!
//! let settings = store.provider_settings("aliyun")?;
//! let provider = registry.create_provider("aliyun", settings)?;
//! ```
//!
//! ## Registration
//!
//! Provider crates register themselves during initialization:
//!
//! ```rust,ignore
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("cloudflare", Box::new(CloudflareFactory));
//! }
//! ```

use crate::config::ProviderSettings;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Provider registry for plugin-based DNS provider creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory
    ///
    /// Registering the same name twice replaces the earlier factory.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use nodedns_core::registry::ProviderRegistry;
    /// # use nodedns_core::traits::DnsProviderFactory;
    /// # struct MyFactory;
    /// # impl DnsProviderFactory for MyFactory {
    /// #     fn create(&self, settings: &nodedns_core::config::ProviderSettings) -> nodedns_core::Result<Box<dyn nodedns_core::DnsProvider>> { unimplemented!() }
    /// # }
    /// let registry = ProviderRegistry::new();
    /// registry.register_provider("myprovider", Box::new(MyFactory));
    /// ```
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let name = name.into();
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.insert(name, factory);
    }

    /// Create a DNS provider from its type tag and settings
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error::UnsupportedProvider)`: No factory registered for the tag
    /// - `Err(Error::MissingConfig)`: The factory rejected the settings
    pub fn create_provider(
        &self,
        provider_type: &str,
        settings: &ProviderSettings,
    ) -> Result<Box<dyn DnsProvider>> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::unsupported_provider(provider_type))?;

        factory.create(settings)
    }

    /// List all registered provider types, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.contains_key(name)
    }
}
