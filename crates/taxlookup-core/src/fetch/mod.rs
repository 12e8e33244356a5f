//! Registry page fetching.

mod client;

pub use client::RegistryFetcher;

use std::future::Future;

use crate::error::NetworkError;

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Path and fixed parameters of the registry search endpoint.
const SEARCH_PATH: &str = "/Search/";
const SEARCH_PARAMS: &str = "type=auto&force-search=1";

/// Trait for anything that can turn a search query into raw registry HTML.
pub trait PageFetcher {
    /// Fetch the registry page for a tax code or company name.
    ///
    /// Performs at most one request; failures are not retried.
    fn fetch(&self, query: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Build the registry search URL for a query.
///
/// The query is percent-encoded as a whole, so reserved characters such as
/// `&`, `?` and spaces reach the registry literally.
pub fn search_url(base_url: &str, query: &str) -> String {
    format!(
        "{}{}?q={}&{}",
        base_url.trim_end_matches('/'),
        SEARCH_PATH,
        urlencoding::encode(query),
        SEARCH_PARAMS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_tax_code() {
        assert_eq!(
            search_url("https://masothue.com", "0101234567"),
            "https://masothue.com/Search/?q=0101234567&type=auto&force-search=1"
        );
    }

    #[test]
    fn test_search_url_encodes_reserved() {
        assert_eq!(
            search_url("https://masothue.com/", "A&B ?c=d"),
            "https://masothue.com/Search/?q=A%26B%20%3Fc%3Dd&type=auto&force-search=1"
        );
    }

    #[test]
    fn test_search_url_encodes_unicode() {
        let url = search_url("https://masothue.com", "Công ty");
        assert_eq!(
            url,
            "https://masothue.com/Search/?q=C%C3%B4ng%20ty&type=auto&force-search=1"
        );
    }
}
