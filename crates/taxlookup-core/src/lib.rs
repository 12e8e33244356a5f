//! Core library for company registry lookups.
//!
//! This crate provides:
//! - Registry page fetching with a configurable browser identity
//! - Table-driven, fault-tolerant field extraction from registry HTML
//! - A lookup pipeline returning one-shot company records
//! - A local record store consulted before the registry

pub mod error;
pub mod models;
pub mod fetch;
pub mod extract;
pub mod lookup;
pub mod store;

pub use error::{NetworkError, Result, StoreError, TaxLookupError};
pub use models::company::{CompanyRecord, Field, FieldId};
pub use models::config::{BrowserHeaders, FetchConfig, LookupConfig, StoreConfig};
pub use fetch::{PageFetcher, RegistryFetcher, search_url};
pub use extract::{FieldRule, RecordExtractor, RuleExtractor, REGISTRY_RULES, extract};
pub use lookup::{CompanyLookup, LookupResult, RecordSource, Resolver};
pub use store::{CompanyStore, JsonFileStore, MemoryStore};

/// Look up a company by tax code or name on the public registry.
///
/// Convenience wrapper over [`CompanyLookup::from_config`] with the default
/// [`FetchConfig`]; build a [`CompanyLookup`] directly to use another origin
/// or timeouts.
pub async fn lookup_company(query: &str) -> std::result::Result<CompanyRecord, NetworkError> {
    CompanyLookup::from_config(&FetchConfig::default())?
        .lookup_record(query)
        .await
}
