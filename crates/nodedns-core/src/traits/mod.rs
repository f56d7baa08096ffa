//! Core traits for the nodedns system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsProvider`]: Look up, update and create DNS records via provider APIs
//! - [`StoreBackend`]: Persistence for the store document

pub mod dns_provider;
pub mod store_backend;

pub use dns_provider::{DnsProvider, DnsProviderFactory, require_settings};
pub use store_backend::StoreBackend;
