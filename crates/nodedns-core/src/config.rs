//! Configuration and data model for the nodedns system
//!
//! The whole runtime configuration lives in one JSON document (the "store"):
//!
//! ```json
//! {
//!   "nodeCollection": [
//!     { "name": "home", "dnsName": "home.example.com", "forwardName": "1.2.3.4#A", "provider": "aliyun" }
//!   ],
//!   "forwardCollection": [
//!     { "name": "office", "forwardName": "5.6.7.8", "hostType": "A" }
//!   ],
//!   "providerConfigs": {
//!     "cloudflare": { "email": "ops@example.com", "key": "...", "zoneID": "..." },
//!     "aliyun": { "accessKeyId": "...", "accessKeySecret": "..." }
//!   },
//!   "port": "8082"
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Provider type used when a node does not name one
pub const DEFAULT_PROVIDER: &str = "cloudflare";

/// Listen port used when the store does not set one
pub const DEFAULT_PORT: u16 = 8082;

/// Flat credential/config mapping for one provider type
pub type ProviderSettings = BTreeMap<String, String>;

/// The persisted document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    /// Nodes, addressed by index from the HTTP API
    #[serde(rename = "nodeCollection", default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Node>,

    /// Forward rules (persisted only)
    #[serde(rename = "forwardCollection", default, deserialize_with = "null_as_default")]
    pub forwards: Vec<Forward>,

    /// Provider type tag -> settings
    #[serde(
        rename = "providerConfigs",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub provider_configs: BTreeMap<String, ProviderSettings>,

    /// HTTP listen port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl Store {
    /// Look up a node by its API index
    ///
    /// Negative indices are accepted here so callers can pass the raw
    /// request value; they are rejected the same way as indices past the end.
    pub fn node(&self, index: i64) -> Result<&Node, crate::Error> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.nodes.get(i))
            .ok_or(crate::Error::OutOfRange {
                index,
                len: self.nodes.len(),
            })
    }

    /// Mutable variant of [`Store::node`]
    pub fn node_mut(&mut self, index: i64) -> Result<&mut Node, crate::Error> {
        let len = self.nodes.len();
        usize::try_from(index)
            .ok()
            .and_then(|i| self.nodes.get_mut(i))
            .ok_or(crate::Error::OutOfRange { index, len })
    }

    /// Settings for a provider type
    pub fn provider_settings(&self, provider_type: &str) -> Result<&ProviderSettings, crate::Error> {
        self.provider_configs.get(provider_type).ok_or_else(|| {
            crate::Error::missing_config(format!(
                "no settings for provider '{}' in providerConfigs",
                provider_type
            ))
        })
    }

    /// Port the HTTP surface should listen on
    ///
    /// Falls back to [`DEFAULT_PORT`] when unset, empty or unparsable.
    pub fn listen_port(&self) -> u16 {
        match self.port.as_deref().map(str::trim) {
            Some(port) if !port.is_empty() => port.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid port '{}' in store, using {}", port, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            _ => DEFAULT_PORT,
        }
    }
}

/// A DNS name managed through one provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Display name
    #[serde(default)]
    pub name: String,

    /// Fully-qualified DNS name
    #[serde(rename = "dnsName", default)]
    pub dns_name: String,

    /// Last applied target, `"<value>#<hostType>"`
    #[serde(rename = "forwardName", default)]
    pub forward_name: String,

    /// Provider type tag (defaults to cloudflare)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl Node {
    /// Create a node using the default provider
    pub fn new(name: impl Into<String>, dns_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dns_name: dns_name.into(),
            forward_name: String::new(),
            provider: None,
        }
    }

    /// Set the provider type
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Effective provider type tag
    ///
    /// An empty string counts as unset.
    pub fn provider_type(&self) -> &str {
        match self.provider.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => DEFAULT_PROVIDER,
        }
    }
}

/// Forward rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forward {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "forwardName", default)]
    pub forward_name: String,

    #[serde(rename = "hostType", default)]
    pub host_type: String,
}

/// Treat an explicit `null` like a missing key
///
/// Writers that marshal empty collections as `null` are common, and such
/// documents must still load.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Value written into [`Node::forward_name`] after a successful update
pub fn forward_label(value: &str, host_type: &str) -> String {
    format!("{}#{}", value, host_type)
}
