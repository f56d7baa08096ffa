// # Aliyun DNS Provider
//
// This crate provides an Aliyun (Alidns) DNS provider implementation for
// nodedns.
//
// ## Behaviour
//
// - One signed OpenAPI call per trait method
// - Errors are returned to the caller as-is (no retry, no backoff)
// - HTTP timeout configured (30 seconds)
// - Names are split into a root domain (last two labels) and an RR; the
//   apex RR is sent as `@`
//
// ## Security Requirements
//
// - The access key secret NEVER appears in logs or `Debug` output
//
// ## API Reference
//
// - Alidns API 2015-01-09, RPC style: https://help.aliyun.com/document_detail/29739.html
// - DescribeDomainRecords: DomainName, RRKeyWord, Type
// - UpdateDomainRecord: RecordId, RR, Type, Value
// - AddDomainRecord: Lang, DomainName, RR, Type, Value
//
// Requests are signed with ACS3-HMAC-SHA256, see [`signer`].

pub mod signer;

use async_trait::async_trait;
use nodedns_core::config::ProviderSettings;
use nodedns_core::traits::{DnsProvider, DnsProviderFactory, require_settings};
use nodedns_core::{Error, ProviderRegistry, Result};
use serde::Deserialize;
use serde_json::Value;
use signer::AcsRequest;
use std::time::Duration;

/// Provider type tag used in `providerConfigs` and node `provider` fields
pub const PROVIDER_NAME: &str = "aliyun";

/// Alidns OpenAPI endpoint
const ALIDNS_ENDPOINT: &str = "alidns.aliyuncs.com";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// RR used on the wire for the zone apex
const APEX_RR: &str = "@";

/// Largest page DescribeDomainRecords accepts
const DESCRIBE_PAGE_SIZE: &str = "500";

/// Split a fully-qualified name into `(root domain, subdomain)`
///
/// The root domain is the last two labels; the subdomain is everything in
/// front of it and empty for an apex name.
///
/// ```
/// use nodedns_provider_aliyun::split_domain;
///
/// assert_eq!(
///     split_domain("a.b.example.com").unwrap(),
///     ("example.com".to_string(), "a.b".to_string())
/// );
/// ```
pub fn split_domain(dns_name: &str) -> Result<(String, String)> {
    let labels: Vec<&str> = dns_name.split('.').collect();
    if labels.len() < 2 {
        return Err(Error::invalid_input(format!(
            "Malformed domain name: {}",
            dns_name
        )));
    }

    let split_at = labels.len() - 2;
    Ok((labels[split_at..].join("."), labels[..split_at].join(".")))
}

fn wire_rr(subdomain: &str) -> &str {
    if subdomain.is_empty() {
        APEX_RR
    } else {
        subdomain
    }
}

#[derive(Debug, Deserialize)]
struct DescribeDomainRecordsResponse {
    #[serde(rename = "DomainRecords", default)]
    domain_records: DomainRecords,
}

#[derive(Debug, Default, Deserialize)]
struct DomainRecords {
    #[serde(rename = "Record", default)]
    record: Vec<DomainRecord>,
}

#[derive(Debug, Deserialize)]
struct DomainRecord {
    #[serde(rename = "RecordId")]
    record_id: String,
    #[serde(rename = "RR")]
    rr: String,
    #[serde(rename = "Type")]
    record_type: String,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

/// Aliyun DNS provider
pub struct AliyunProvider {
    access_key_id: String,

    /// ⚠️ NEVER log this value
    access_key_secret: String,

    /// Scheme + authority requests are sent to
    base_url: String,

    /// Host as signed (`host[:port]`)
    host: String,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the secret
impl std::fmt::Debug for AliyunProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliyunProvider")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AliyunProvider {
    /// Create a provider against the public Alidns endpoint
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::remote(PROVIDER_NAME, format!("Failed to build HTTP client: {}", e)))?;

        let mut provider = Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            base_url: String::new(),
            host: String::new(),
            client,
        };
        provider.set_endpoint(ALIDNS_ENDPOINT)?;
        Ok(provider)
    }

    /// Send requests to another endpoint
    ///
    /// Accepts a bare host (`alidns.cn-hangzhou.aliyuncs.com`, HTTPS is
    /// assumed) or a full base URL (`http://127.0.0.1:8080`).
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.set_endpoint(endpoint)?;
        Ok(self)
    }

    fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        let base = if endpoint.contains("://") {
            endpoint.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", endpoint.trim_end_matches('/'))
        };

        let url = reqwest::Url::parse(&base)
            .map_err(|e| Error::invalid_input(format!("Invalid Aliyun endpoint {}: {}", endpoint, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::invalid_input(format!("Aliyun endpoint has no host: {}", endpoint)))?;

        self.host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        self.base_url = base;
        Ok(())
    }

    fn request(&self, action: &str) -> AcsRequest {
        AcsRequest::new(self.host.as_str(), action)
    }

    /// Sign and send one call, returning the parsed body
    async fn call(&self, request: AcsRequest) -> Result<Value> {
        let action = request.action().to_string();
        let url = format!("{}/?{}", self.base_url, request.canonical_query());

        let mut builder = self.client.post(url);
        for (name, value) in request.headers(&self.access_key_id, &self.access_key_secret)? {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::remote(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let api_error: ApiError = serde_json::from_str(&body).unwrap_or_default();
            let detail = if api_error.code.is_empty() {
                body
            } else {
                format!("{}: {}", api_error.code, api_error.message)
            };

            return Err(match status.as_u16() {
                401 | 403 => Error::remote(
                    PROVIDER_NAME,
                    format!("Authentication failed: {} - {}", status, detail),
                ),
                500..=599 => Error::remote(
                    PROVIDER_NAME,
                    format!("Aliyun server error: {} - {}", status, detail),
                ),
                _ => Error::remote(
                    PROVIDER_NAME,
                    format!("{} failed: {} - {}", action, status, detail),
                ),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::remote(PROVIDER_NAME, format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl DnsProvider for AliyunProvider {
    async fn get_record_id(&self, dns_name: &str, host_type: &str) -> Result<String> {
        let (domain, subdomain) = split_domain(dns_name)?;
        let rr = wire_rr(&subdomain);
        tracing::debug!("Looking up record ID: {} in {} (type: {})", rr, domain, host_type);

        let request = self
            .request("DescribeDomainRecords")
            .param("DomainName", domain.as_str())
            .param("RRKeyWord", rr)
            .param("Type", host_type)
            .param("PageSize", DESCRIBE_PAGE_SIZE);
        let body = self.call(request).await?;

        let parsed: DescribeDomainRecordsResponse = serde_json::from_value(body)
            .map_err(|e| Error::remote(PROVIDER_NAME, format!("Invalid response format: {}", e)))?;

        // RRKeyWord is a fuzzy match
        let record = parsed
            .domain_records
            .record
            .into_iter()
            .find(|r| {
                r.rr.eq_ignore_ascii_case(rr) && r.record_type.eq_ignore_ascii_case(host_type)
            })
            .ok_or_else(|| {
                Error::not_found(format!("DNS record not found: {} (type: {})", dns_name, host_type))
            })?;

        tracing::debug!("Found record ID: {}", record.record_id);
        Ok(record.record_id)
    }

    async fn update_record(
        &self,
        record_id: &str,
        dns_name: &str,
        host_type: &str,
        value: &str,
    ) -> Result<()> {
        let (_, subdomain) = split_domain(dns_name)?;
        tracing::info!("Updating Aliyun DNS record: {} -> {} ({})", dns_name, value, host_type);

        let request = self
            .request("UpdateDomainRecord")
            .param("RecordId", record_id)
            .param("RR", wire_rr(&subdomain))
            .param("Type", host_type)
            .param("Value", value);
        self.call(request).await?;

        tracing::info!("DNS record updated successfully: {} -> {}", dns_name, value);
        Ok(())
    }

    async fn add_record(&self, dns_name: &str, host_type: &str, value: &str) -> Result<()> {
        let (domain, subdomain) = split_domain(dns_name)?;
        tracing::info!("Creating Aliyun DNS record: {} -> {} ({})", dns_name, value, host_type);

        let request = self
            .request("AddDomainRecord")
            .param("Lang", "zh")
            .param("DomainName", domain.as_str())
            .param("RR", wire_rr(&subdomain))
            .param("Type", host_type)
            .param("Value", value);
        self.call(request).await?;

        tracing::info!("DNS record created successfully: {} -> {}", dns_name, value);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Aliyun providers
///
/// Required settings: `accessKeyId`, `accessKeySecret`. Optional: `endpoint`.
pub struct AliyunFactory;

impl DnsProviderFactory for AliyunFactory {
    fn create(&self, settings: &ProviderSettings) -> Result<Box<dyn DnsProvider>> {
        let [access_key_id, access_key_secret] =
            require_settings(PROVIDER_NAME, settings, ["accessKeyId", "accessKeySecret"])?;

        let mut provider = AliyunProvider::new(access_key_id, access_key_secret)?;
        if let Some(endpoint) = settings.get("endpoint").filter(|e| !e.is_empty()) {
            tracing::debug!("Using Aliyun endpoint {}", endpoint);
            provider = provider.with_endpoint(endpoint)?;
        }

        Ok(Box::new(provider))
    }
}

/// Register the Aliyun provider with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(AliyunFactory));
}
