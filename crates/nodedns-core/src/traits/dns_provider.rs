// # DNS Provider Trait
//
// Defines the interface for managing DNS records via provider APIs.
//
// ## Implementations
//
// - Cloudflare: `nodedns-provider-cloudflare` crate
// - Aliyun: `nodedns-provider-aliyun` crate
//
// ## Usage
//
// ```rust,ignore
// use nodedns_core::DnsProvider;
//
// async fn point(provider: &dyn DnsProvider) -> nodedns_core::Result<()> {
//     match provider.get_record_id("home.example.com", "A").await {
//         Ok(id) => provider.update_record(&id, "home.example.com", "A", "1.2.3.4").await,
//         Err(_) => provider.add_record("home.example.com", "A", "1.2.3.4").await,
//     }
// }
// ```

use async_trait::async_trait;

/// Trait for DNS provider implementations
///
/// A provider is a thin, stateless client over one vendor API. Each method
/// performs the API call(s) for a single operation and reports the outcome;
/// the [`Reconciler`](crate::Reconciler) decides between create and update.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Errors
///
/// - [`Error::NotFound`](crate::Error::NotFound): no record matches
/// - [`Error::Remote`](crate::Error::Remote): transport failure, unparsable
///   response or non-success status
/// - [`Error::InvalidInput`](crate::Error::InvalidInput): the name cannot be
///   expressed in this provider's API
///
/// Providers never retry. A failed call is returned to the caller as-is.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Find the id of the record matching `dns_name` and `host_type`
    ///
    /// # Parameters
    ///
    /// - `dns_name`: Fully-qualified record name (e.g., "home.example.com")
    /// - `host_type`: Record type (e.g., "A", "AAAA", "CNAME")
    async fn get_record_id(&self, dns_name: &str, host_type: &str) -> Result<String, crate::Error>;

    /// Overwrite the content of an existing record
    ///
    /// # Parameters
    ///
    /// - `record_id`: Id returned by [`DnsProvider::get_record_id`]
    /// - `dns_name`: Fully-qualified record name
    /// - `host_type`: Record type
    /// - `value`: New record content
    async fn update_record(
        &self,
        record_id: &str,
        dns_name: &str,
        host_type: &str,
        value: &str,
    ) -> Result<(), crate::Error>;

    /// Create a new record
    async fn add_record(&self, dns_name: &str, host_type: &str, value: &str)
    -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "cloudflare", "aliyun")
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from the provider's settings map
    ///
    /// # Parameters
    ///
    /// - `settings`: The `providerConfigs` entry for this provider type
    ///
    /// # Returns
    ///
    /// A boxed DnsProvider trait object, or
    /// [`Error::MissingConfig`](crate::Error::MissingConfig) when a required
    /// key is absent
    fn create(
        &self,
        settings: &crate::config::ProviderSettings,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}

/// Collect the values of required settings keys
///
/// Returns them in the order requested, or a
/// [`Error::MissingConfig`](crate::Error::MissingConfig) naming every absent
/// key.
pub fn require_settings<'a, const N: usize>(
    provider: &str,
    settings: &'a crate::config::ProviderSettings,
    keys: [&str; N],
) -> Result<[&'a str; N], crate::Error> {
    let missing: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|k| !settings.contains_key(*k))
        .collect();

    if !missing.is_empty() {
        return Err(crate::Error::missing_config(format!(
            "{} settings missing required keys: {}",
            provider,
            missing.join(", ")
        )));
    }

    Ok(keys.map(|k| settings[k].as_str()))
}
