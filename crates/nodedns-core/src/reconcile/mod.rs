//! Node reconciliation
//!
//! The Reconciler makes a provider's record match what a node should point at:
//! - Resolving the node and its provider settings from the store
//! - Building the provider through the registry
//! - Updating the record if it exists, creating it otherwise
//! - Persisting the applied target after the provider call succeeds
//!
//! ## Flow
//!
//! ```text
//!  reconcile(index, dnsName, hostType, value)
//!        │
//!        ▼
//!  ┌─────────────┐   node + settings   ┌──────────────────┐
//!  │ SharedStore │ ──────────────────▶ │ ProviderRegistry │
//!  └─────────────┘                     └──────────────────┘
//!        ▲                                      │ DnsProvider
//!        │ forwardName = "value#hostType"       ▼
//!        │                        get_record_id ─┬─ Ok(id) ─▶ update_record
//!        └─────────── on success ────────────────┴─ Err    ─▶ add_record
//! ```
//!
//! Nothing is written to the store when the provider call fails. If the
//! process dies between the provider call and the store write, the
//! provider holds the new value while the store still has the old one;
//! the next reconciliation of the node converges them.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::registry::ProviderRegistry;
use crate::state::SharedStore;

/// What the caller wants a node's record to become
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    /// Index into the node collection
    pub node_index: i64,
    /// Fully-qualified record name
    pub dns_name: String,
    /// Record type
    pub host_type: String,
    /// Record content
    pub value: String,
}

impl ReconcileRequest {
    /// Request that node `node_index` point `dns_name` at `value`
    pub fn new(
        node_index: i64,
        dns_name: impl Into<String>,
        host_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            node_index,
            dns_name: dns_name.into(),
            host_type: host_type.into(),
            value: value.into(),
        }
    }
}

/// Which path reconciliation took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No record existed; one was created
    Created,
    /// The record with this id was overwritten
    Updated { record_id: String },
}

/// Reconciles nodes against their DNS providers
#[derive(Clone)]
pub struct Reconciler {
    registry: Arc<ProviderRegistry>,
    store: SharedStore,
}

impl Reconciler {
    /// Create a reconciler building providers from `registry` and writing to `store`
    pub fn new(registry: Arc<ProviderRegistry>, store: SharedStore) -> Self {
        Self { registry, store }
    }

    /// Handle to the store this reconciler writes to
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Reconcile one node
    ///
    /// # Errors
    ///
    /// - `OutOfRange`: no node at `node_index` (the provider is never built)
    /// - `MissingConfig`: no or incomplete settings for the node's provider
    /// - `UnsupportedProvider`: the node names an unregistered provider
    /// - Any error from the create or update call
    pub async fn reconcile(&self, request: &ReconcileRequest) -> Result<ReconcileOutcome> {
        let result = self.try_reconcile(request).await;
        if let Err(e) = &result {
            error!(
                node = request.node_index,
                dns_name = %request.dns_name,
                "Reconciliation failed: {}",
                e
            );
        }
        result
    }

    async fn try_reconcile(&self, request: &ReconcileRequest) -> Result<ReconcileOutcome> {
        // Resolve node and settings under a short read lock; provider calls
        // run without holding it.
        let (node_dns_name, provider_type, settings) = self
            .store
            .read(|store| -> Result<_> {
                let node = store.node(request.node_index)?;
                let provider_type = node.provider_type().to_string();
                let settings = store.provider_settings(&provider_type)?.clone();
                Ok((node.dns_name.clone(), provider_type, settings))
            })
            .await?;

        let provider = self.registry.create_provider(&provider_type, &settings)?;
        debug!(
            node = request.node_index,
            provider = provider.provider_name(),
            "Provider ready"
        );

        let outcome = match provider
            .get_record_id(&request.dns_name, &request.host_type)
            .await
        {
            Ok(record_id) => {
                provider
                    .update_record(
                        &record_id,
                        &request.dns_name,
                        &request.host_type,
                        &request.value,
                    )
                    .await?;
                info!(
                    "Updated {} ({}) to {} via {}",
                    request.dns_name,
                    request.host_type,
                    request.value,
                    provider.provider_name()
                );
                ReconcileOutcome::Updated { record_id }
            }
            Err(lookup_err) => {
                debug!(
                    "No usable record for {} ({}): {}. Creating one.",
                    request.dns_name, request.host_type, lookup_err
                );
                provider
                    .add_record(&request.dns_name, &request.host_type, &request.value)
                    .await?;
                info!(
                    "Created {} ({}) as {} via {}",
                    request.dns_name,
                    request.host_type,
                    request.value,
                    provider.provider_name()
                );
                ReconcileOutcome::Created
            }
        };

        self.store
            .set_forward_name(
                request.node_index,
                &node_dns_name,
                &request.value,
                &request.host_type,
            )
            .await?;

        Ok(outcome)
    }
}
