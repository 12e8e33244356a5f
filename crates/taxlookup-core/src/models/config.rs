//! Configuration structures for registry lookups.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, TaxLookupError};

fn invalid(message: &str) -> TaxLookupError {
    TaxLookupError::Config(message.to_string())
}

/// Main configuration for the taxlookup pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Registry fetch configuration.
    pub fetch: FetchConfig,

    /// Local record store configuration.
    pub store: StoreConfig,
}

/// Outbound registry request configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Registry origin, without trailing slash.
    pub base_url: String,

    /// Total request timeout in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Browser identity sent with every request.
    pub headers: BrowserHeaders,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://masothue.com".to_string(),
            timeout_secs: 15,
            connect_timeout_secs: 10,
            headers: BrowserHeaders::default(),
        }
    }
}

impl FetchConfig {
    /// Reject an empty origin or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(invalid("fetch.base_url must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("fetch.timeout_secs must be greater than zero"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(invalid("fetch.connect_timeout_secs must be greater than zero"));
        }
        Ok(())
    }
}

/// Request headers that make the fetch look like an ordinary desktop browser.
///
/// The registry may reject or vary responses for requests that look
/// automated. Refresh `user_agent` when the upstream starts refusing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserHeaders {
    /// `User-Agent` header.
    pub user_agent: String,

    /// `Accept` header.
    pub accept: String,

    /// `Accept-Language` header.
    pub accept_language: String,

    /// `Referer` header, the registry's own search page.
    pub referer: String,
}

impl Default for BrowserHeaders {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .to_string(),
            accept_language: "vi,en;q=0.9".to_string(),
            referer: "https://masothue.com/".to_string(),
        }
    }
}

/// Local record store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file of known records, consulted before the registry.
    pub path: Option<PathBuf>,
}

impl LookupConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> std::result::Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Reject settings no lookup could succeed with.
    pub fn validate(&self) -> Result<()> {
        self.fetch.validate()
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: LookupConfig =
            serde_json::from_str(r#"{"fetch": {"timeout_secs": 3}}"#).unwrap();

        assert_eq!(config.fetch.timeout_secs, 3);
        assert_eq!(config.fetch.base_url, "https://masothue.com");
        assert_eq!(config.fetch.headers, BrowserHeaders::default());
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = LookupConfig::default();
        config.fetch.headers.accept_language = "en".to_string();
        config.save(&path).unwrap();

        let loaded = LookupConfig::from_file(&path).unwrap();
        assert_eq!(loaded.fetch.headers.accept_language, "en");
    }

    #[test]
    fn test_validate() {
        assert!(LookupConfig::default().validate().is_ok());

        let mut config = LookupConfig::default();
        config.fetch.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(TaxLookupError::Config(_))));

        let mut config = LookupConfig::default();
        config.fetch.base_url = " ".to_string();
        assert!(matches!(config.validate(), Err(TaxLookupError::Config(_))));

        let mut config = LookupConfig::default();
        config.fetch.connect_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn test_invalid_file_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let err = LookupConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
