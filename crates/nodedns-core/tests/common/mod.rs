//! Test doubles and common utilities for contract tests
//!
//! The mock provider records every call so tests can assert which path the
//! reconciler took without any network access.

#![allow(dead_code)]

use nodedns_core::config::ProviderSettings;
use nodedns_core::error::{Error, Result};
use nodedns_core::traits::{DnsProvider, DnsProviderFactory};
use nodedns_core::{MemoryBackend, Node, ProviderRegistry, Reconciler, SharedStore, Store};
use std::sync::{Arc, Mutex};

/// A call observed by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetRecordId {
        dns_name: String,
        host_type: String,
    },
    UpdateRecord {
        record_id: String,
        dns_name: String,
        host_type: String,
        value: String,
    },
    AddRecord {
        dns_name: String,
        host_type: String,
        value: String,
    },
}

/// Scripted behaviour shared between the factory and every provider it builds
#[derive(Default)]
pub struct Script {
    /// Record id returned by lookups; `None` means "not found"
    pub existing_record: Option<String>,
    /// Make update/add fail with a remote error
    pub fail_writes: bool,
    /// Every call, in order
    pub calls: Vec<Call>,
    /// Number of providers the factory built
    pub built: usize,
}

/// A mock DnsProvider that tracks calls
pub struct MockDnsProvider {
    script: Arc<Mutex<Script>>,
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn get_record_id(&self, dns_name: &str, host_type: &str) -> Result<String> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::GetRecordId {
            dns_name: dns_name.to_string(),
            host_type: host_type.to_string(),
        });
        script
            .existing_record
            .clone()
            .ok_or_else(|| Error::not_found(format!("{} ({})", dns_name, host_type)))
    }

    async fn update_record(
        &self,
        record_id: &str,
        dns_name: &str,
        host_type: &str,
        value: &str,
    ) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::UpdateRecord {
            record_id: record_id.to_string(),
            dns_name: dns_name.to_string(),
            host_type: host_type.to_string(),
            value: value.to_string(),
        });
        if script.fail_writes {
            return Err(Error::remote("mock", "HTTP 500"));
        }
        Ok(())
    }

    async fn add_record(&self, dns_name: &str, host_type: &str, value: &str) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::AddRecord {
            dns_name: dns_name.to_string(),
            host_type: host_type.to_string(),
            value: value.to_string(),
        });
        if script.fail_writes {
            return Err(Error::remote("mock", "HTTP 500"));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Factory that requires a `token` key and hands out scripted providers
pub struct MockFactory {
    pub script: Arc<Mutex<Script>>,
}

impl DnsProviderFactory for MockFactory {
    fn create(&self, settings: &ProviderSettings) -> Result<Box<dyn DnsProvider>> {
        nodedns_core::traits::require_settings("mock", settings, ["token"])?;
        self.script.lock().unwrap().built += 1;
        Ok(Box::new(MockDnsProvider {
            script: Arc::clone(&self.script),
        }))
    }
}

/// Everything a reconciliation test needs
pub struct Harness {
    pub reconciler: Reconciler,
    pub store: SharedStore,
    pub backend: MemoryBackend,
    pub script: Arc<Mutex<Script>>,
}

impl Harness {
    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn providers_built(&self) -> usize {
        self.script.lock().unwrap().built
    }
}

/// Settings map accepted by [`MockFactory`]
pub fn mock_settings() -> ProviderSettings {
    let mut settings = ProviderSettings::new();
    settings.insert("token".to_string(), "test-token".to_string());
    settings
}

/// A store with two nodes on the mock provider and one on "cloudflare"
pub fn minimal_store() -> Store {
    let mut store = Store {
        nodes: vec![
            Node::new("home", "home.example.com").with_provider("mock"),
            Node::new("nas", "nas.example.com").with_provider("mock"),
            Node::new("legacy", "legacy.example.com"),
        ],
        ..Default::default()
    };
    store
        .provider_configs
        .insert("mock".to_string(), mock_settings());
    store
}

/// Build a reconciler over `store` with the mock provider registered as "mock"
pub async fn harness(store: Store, script: Script) -> Harness {
    let script = Arc::new(Mutex::new(script));
    let registry = ProviderRegistry::new();
    registry.register_provider(
        "mock",
        Box::new(MockFactory {
            script: Arc::clone(&script),
        }),
    );

    let backend = MemoryBackend::with_store(store);
    let shared = SharedStore::open(Arc::new(backend.clone()))
        .await
        .expect("memory backend always loads");

    Harness {
        reconciler: Reconciler::new(Arc::new(registry), shared.clone()),
        store: shared,
        backend,
        script,
    }
}
