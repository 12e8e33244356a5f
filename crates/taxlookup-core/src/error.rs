//! Error types for the taxlookup-core library.
//!
//! Extraction has no error type: every field resolves to present or absent,
//! so once a page has been fetched the lookup cannot fail.

use thiserror::Error;

/// Main error type for the taxlookup library.
#[derive(Error, Debug)]
pub enum TaxLookupError {
    /// Registry page could not be fetched.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Local record store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while fetching a registry page.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Connection failed or the body could not be read.
    #[error("request failed: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The registry answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The search URL could not be built from the configured base.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be built (e.g. invalid header value).
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Errors related to the local record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store file is not a valid JSON record list.
    #[error("invalid store format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for the taxlookup library.
pub type Result<T> = std::result::Result<T, TaxLookupError>;
