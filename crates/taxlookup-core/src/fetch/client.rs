//! HTTP fetcher for the public company registry.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use tracing::{debug, warn};

use crate::error::NetworkError;
use crate::models::config::{BrowserHeaders, FetchConfig};

use super::{PageFetcher, Result, search_url};

/// Fetches registry search pages over HTTPS.
///
/// Sends the configured browser headers with every request and applies a
/// bounded timeout. A failed request is reported once, never retried.
#[derive(Debug, Clone)]
pub struct RegistryFetcher {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
    connect_timeout_secs: u64,
}

impl RegistryFetcher {
    /// Create a fetcher from configuration.
    ///
    /// Rejects an empty origin or zero timeouts before building the client.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| NetworkError::Client(e.to_string()))?;

        let client = reqwest::Client::builder()
            .default_headers(browser_header_map(&config.headers)?)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| NetworkError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            connect_timeout_secs: config.connect_timeout_secs,
        })
    }

    /// Limit that expired: the connect timeout while connecting, the total
    /// timeout otherwise.
    fn timeout_limit(&self, connecting: bool) -> u64 {
        if connecting {
            self.connect_timeout_secs
        } else {
            self.timeout_secs
        }
    }

    fn map_error(&self, err: reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            NetworkError::Timeout(self.timeout_limit(err.is_connect()))
        } else {
            NetworkError::Transport(err.to_string())
        }
    }
}

impl PageFetcher for RegistryFetcher {
    async fn fetch(&self, query: &str) -> Result<String> {
        let url = search_url(&self.base_url, query);
        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;

        debug!("GET {}", parsed);

        let resp = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Registry answered {} for query {:?}", status, query);
            return Err(NetworkError::Status {
                status: status.as_u16(),
                url,
            });
        }

        resp.text().await.map_err(|e| self.map_error(e))
    }
}

fn browser_header_map(headers: &BrowserHeaders) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in [
        (USER_AGENT, &headers.user_agent),
        (ACCEPT, &headers.accept),
        (ACCEPT_LANGUAGE, &headers.accept_language),
        (REFERER, &headers.referer),
    ] {
        let value = HeaderValue::from_str(value)
            .map_err(|e| NetworkError::Client(format!("invalid {name} header: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}
