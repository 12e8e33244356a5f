//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod lookup;
pub mod store;

use std::path::PathBuf;

use clap::Args;
use tracing::warn;

use taxlookup_core::models::config::LookupConfig;
use taxlookup_core::{JsonFileStore, LookupResult, RecordSource, Resolver};

/// Resolver used by the CLI: optional JSON store, then the registry.
pub type RegistryResolver = Resolver<Option<JsonFileStore>>;

/// Registry and store options shared by lookup commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Registry origin to query instead of the configured one
    #[arg(long)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Local store file consulted before the registry
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Save registry results into the local store
    #[arg(long)]
    pub save: bool,
}

impl FetchArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut LookupConfig) {
        if let Some(base_url) = &self.base_url {
            config.fetch.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.fetch.timeout_secs = timeout;
        }
        if let Some(store) = &self.store {
            config.store.path = Some(store.clone());
        }
    }
}

/// Build the resolver for a configuration.
pub fn open_resolver(config: &LookupConfig) -> anyhow::Result<RegistryResolver> {
    Ok(Resolver::from_config(config)?)
}

/// Reject queries the registry cannot meaningfully search for.
///
/// Returns the query with surrounding whitespace removed.
pub fn validate_query(query: &str) -> anyhow::Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Query must not be empty");
    }
    if query.chars().any(char::is_control) {
        anyhow::bail!("Query must not contain control characters");
    }
    Ok(query)
}

/// Add a registry result to the resolver's store.
///
/// Returns `true` when the store changed and needs saving.
pub fn remember(resolver: &mut RegistryResolver, result: &LookupResult) -> bool {
    if result.source != RecordSource::Registry {
        return false;
    }
    let Some(store) = resolver.store_mut() else {
        return false;
    };
    if store.insert(result.record.clone()) {
        true
    } else {
        warn!("Result for {:?} has no tax id; not saved", result.query);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_query() {
        assert_eq!(validate_query("  0101234567 ").unwrap(), "0101234567");
        assert_eq!(validate_query("Công ty A&B").unwrap(), "Công ty A&B");
        assert!(validate_query("   ").is_err());
        assert!(validate_query("abc\u{7}").is_err());
    }

    #[test]
    fn test_fetch_args_override_config() {
        let args = FetchArgs {
            base_url: Some("http://127.0.0.1:9000".to_string()),
            timeout: Some(3),
            store: Some(PathBuf::from("companies.json")),
            save: false,
        };
        let mut config = LookupConfig::default();
        args.apply(&mut config);

        assert_eq!(config.fetch.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.fetch.timeout_secs, 3);
        assert_eq!(config.store.path, Some(PathBuf::from("companies.json")));
    }
}
