// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for nodedns.
//
// ## Behaviour
//
// - One HTTP request per trait call
// - Errors are returned to the caller as-is (no retry, no backoff)
// - HTTP timeout configured (30 seconds)
// - Records are written with a fixed TTL of 120 seconds and proxying off
// - The full DNS name is used as the record name
//
// ## Security Requirements
//
// - The API key NEVER appears in logs or `Debug` output
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=...&name=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
//
// Authentication uses the global API key (`X-Auth-Email` + `X-Auth-Key`).

use async_trait::async_trait;
use nodedns_core::config::ProviderSettings;
use nodedns_core::traits::{DnsProvider, DnsProviderFactory, require_settings};
use nodedns_core::{Error, ProviderRegistry, Result};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Provider type tag used in `providerConfigs` and node `provider` fields
pub const PROVIDER_NAME: &str = "cloudflare";

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL written on create/update
const RECORD_TTL: u32 = 120;

/// Request body for create and update
#[derive(Debug, Serialize)]
struct RecordPayload<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

impl<'a> RecordPayload<'a> {
    fn new(dns_name: &'a str, host_type: &'a str, value: &'a str) -> Self {
        Self {
            record_type: host_type,
            name: dns_name,
            content: value,
            ttl: RECORD_TTL,
            proxied: false,
        }
    }
}

/// Cloudflare DNS provider
///
/// Stateless: every call goes to the API. The zone is fixed by
/// configuration; no zone discovery is attempted.
pub struct CloudflareProvider {
    /// Account email (`X-Auth-Email`)
    email: String,

    /// Global API key (`X-Auth-Key`)
    /// ⚠️ NEVER log this value
    key: String,

    /// Zone holding the managed records
    zone_id: String,

    /// API base URL (overridable for tests and API proxies)
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("email", &self.email)
            .field("key", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider against the public API
    pub fn new(
        email: impl Into<String>,
        key: impl Into<String>,
        zone_id: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::remote(PROVIDER_NAME, format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            email: email.into(),
            key: key.into(),
            zone_id: zone_id.into(),
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, self.zone_id)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-Auth-Email", &self.email)
            .header("X-Auth-Key", &self.key)
            .header("Content-Type", "application/json")
    }

    /// Send a request and return the parsed body of a successful response
    ///
    /// Non-2xx statuses and `"success": false` bodies are both errors.
    async fn send(&self, request: reqwest::RequestBuilder, action: &str) -> Result<Value> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| Error::remote(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(match status.as_u16() {
                401 | 403 => Error::remote(
                    PROVIDER_NAME,
                    format!(
                        "Authentication failed: Invalid email/key or insufficient permissions. Status: {}",
                        status
                    ),
                ),
                429 => Error::remote(
                    PROVIDER_NAME,
                    format!("Rate limit exceeded. Status: {}", status),
                ),
                500..=599 => Error::remote(
                    PROVIDER_NAME,
                    format!("Cloudflare server error: {} - {}", status, error_text),
                ),
                _ => Error::remote(
                    PROVIDER_NAME,
                    format!("{} failed: {} - {}", action, status, error_text),
                ),
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::remote(PROVIDER_NAME, format!("Failed to parse response: {}", e)))?;

        if json["success"] == Value::Bool(false) {
            return Err(Error::remote(
                PROVIDER_NAME,
                format!("{} rejected: {}", action, api_error_messages(&json)),
            ));
        }

        Ok(json)
    }
}

/// Join the `errors[].message` entries of an API response
fn api_error_messages(json: &Value) -> String {
    let messages: Vec<&str> = json["errors"]
        .as_array()
        .map(|errors| errors.iter().filter_map(|e| e["message"].as_str()).collect())
        .unwrap_or_default();

    if messages.is_empty() {
        "unknown error".to_string()
    } else {
        messages.join("; ")
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// ```
    async fn get_record_id(&self, dns_name: &str, host_type: &str) -> Result<String> {
        tracing::debug!("Looking up record ID: {} (type: {})", dns_name, host_type);

        let request = self
            .client
            .get(self.records_url())
            .query(&[("type", host_type), ("name", dns_name)]);
        let json = self.send(request, "Record lookup").await?;

        let records = json["result"].as_array().ok_or_else(|| {
            Error::remote(PROVIDER_NAME, "Invalid response format: result is not an array")
        })?;

        let record = records.first().ok_or_else(|| {
            Error::not_found(format!("DNS record not found: {} (type: {})", dns_name, host_type))
        })?;

        let record_id = record["id"].as_str().ok_or_else(|| {
            Error::remote(PROVIDER_NAME, "Invalid response format: record.id is not a string")
        })?;

        tracing::debug!("Found record ID: {}", record_id);
        Ok(record_id.to_string())
    }

    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// { "type": "A", "name": "...", "content": "...", "ttl": 120, "proxied": false }
    /// ```
    async fn update_record(
        &self,
        record_id: &str,
        dns_name: &str,
        host_type: &str,
        value: &str,
    ) -> Result<()> {
        tracing::info!(
            "Updating Cloudflare DNS record: {} -> {} ({})",
            dns_name,
            value,
            host_type
        );

        let request = self
            .client
            .put(format!("{}/{}", self.records_url(), record_id))
            .json(&RecordPayload::new(dns_name, host_type, value));
        self.send(request, "Record update").await?;

        tracing::info!("DNS record updated successfully: {} -> {}", dns_name, value);
        Ok(())
    }

    /// # API Call
    ///
    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// { "type": "A", "name": "...", "content": "...", "ttl": 120, "proxied": false }
    /// ```
    async fn add_record(&self, dns_name: &str, host_type: &str, value: &str) -> Result<()> {
        tracing::info!(
            "Creating Cloudflare DNS record: {} -> {} ({})",
            dns_name,
            value,
            host_type
        );

        let request = self
            .client
            .post(self.records_url())
            .json(&RecordPayload::new(dns_name, host_type, value));
        self.send(request, "Record creation").await?;

        tracing::info!("DNS record created successfully: {} -> {}", dns_name, value);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Cloudflare providers
///
/// Required settings: `email`, `key`, `zoneID`. Optional: `apiBase`.
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, settings: &ProviderSettings) -> Result<Box<dyn DnsProvider>> {
        let [email, key, zone_id] = require_settings(PROVIDER_NAME, settings, ["email", "key", "zoneID"])?;

        let mut provider = CloudflareProvider::new(email, key, zone_id)?;
        if let Some(api_base) = settings.get("apiBase").filter(|b| !b.is_empty()) {
            tracing::debug!("Using Cloudflare API base {}", api_base);
            provider = provider.with_api_base(api_base.as_str());
        }

        Ok(Box::new(provider))
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use nodedns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// nodedns_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(CloudflareFactory));
}
