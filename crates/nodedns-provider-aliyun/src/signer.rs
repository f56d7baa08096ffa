//! ACS3-HMAC-SHA256 request signing for the Alidns OpenAPI
//!
//! RPC-style calls carry their parameters in the query string and an empty
//! body. The canonical request covers the method, the sorted query string,
//! every `host`/`x-acs-*` header and the hashed payload:
//!
//! ```text
//! POST
//! /
//! DomainName=example.com&RRKeyWord=home&Type=A
//! host:alidns.aliyuncs.com
//! x-acs-action:DescribeDomainRecords
//! ...
//!
//! host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version
//! e3b0c442...
//! ```

use chrono::Utc;
use hmac::{Hmac, Mac};
use nodedns_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm name, also the `Authorization` scheme
pub const ALGORITHM: &str = "ACS3-HMAC-SHA256";

/// Alidns API version
pub const API_VERSION: &str = "2015-01-09";

const HTTP_METHOD: &str = "POST";

/// One unsigned API call
#[derive(Debug, Clone)]
pub struct AcsRequest {
    host: String,
    action: String,
    params: BTreeMap<String, String>,
    date: String,
    nonce: String,
}

impl AcsRequest {
    /// Start a call to `action` on `host`, stamped with the current time
    pub fn new(host: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            action: action.into(),
            params: BTreeMap::new(),
            date: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            nonce: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[cfg(test)]
    fn stamped(mut self, date: &str, nonce: &str) -> Self {
        self.date = date.to_string();
        self.nonce = nonce.to_string();
        self
    }

    /// API action name (`x-acs-action`)
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Query string with keys sorted and both sides percent-encoded (RFC 3986)
    pub fn canonical_query(&self) -> String {
        let mut pairs: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| (urlencoding::encode(k).into_owned(), urlencoding::encode(v).into_owned()))
            .collect();
        pairs.sort();

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Signed headers in canonical (lowercase, sorted) order
    fn signed_headers(&self) -> [(&'static str, String); 6] {
        [
            ("host", self.host.clone()),
            ("x-acs-action", self.action.clone()),
            ("x-acs-content-sha256", sha256_hex(b"")),
            ("x-acs-date", self.date.clone()),
            ("x-acs-signature-nonce", self.nonce.clone()),
            ("x-acs-version", API_VERSION.to_string()),
        ]
    }

    fn signed_header_names(&self) -> String {
        self.signed_headers()
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Canonical request that the signature covers
    pub fn canonical_request(&self) -> String {
        let canonical_headers: String = self
            .signed_headers()
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();

        format!(
            "{}\n/\n{}\n{}\n{}\n{}",
            HTTP_METHOD,
            self.canonical_query(),
            canonical_headers,
            self.signed_header_names(),
            sha256_hex(b"")
        )
    }

    /// Algorithm name plus the hex SHA-256 of the canonical request
    pub fn string_to_sign(&self) -> String {
        format!(
            "{}\n{}",
            ALGORITHM,
            sha256_hex(self.canonical_request().as_bytes())
        )
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self, access_key_id: &str, access_key_secret: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(access_key_secret.as_bytes())
            .map_err(|e| Error::invalid_input(format!("Unusable access key secret: {}", e)))?;
        mac.update(self.string_to_sign().as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!(
            "{} Credential={},SignedHeaders={},Signature={}",
            ALGORITHM,
            access_key_id,
            self.signed_header_names(),
            signature
        ))
    }

    /// Headers to attach to the HTTP request
    ///
    /// `host` is left to the HTTP client, which sends the same value.
    pub fn headers(
        &self,
        access_key_id: &str,
        access_key_secret: &str,
    ) -> Result<Vec<(&'static str, String)>> {
        let mut headers: Vec<(&'static str, String)> = self
            .signed_headers()
            .into_iter()
            .filter(|(name, _)| *name != "host")
            .collect();
        headers.push((
            "authorization",
            self.authorization(access_key_id, access_key_secret)?,
        ));
        Ok(headers)
    }
}

fn sha256_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}
