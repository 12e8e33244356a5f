//! Company lookup pipeline: fetch the registry page, parse it, extract.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::NetworkError;
use crate::extract::{RecordExtractor, RuleExtractor};
use crate::fetch::{PageFetcher, RegistryFetcher};
use crate::models::company::{CompanyRecord, FieldId};
use crate::models::config::{FetchConfig, LookupConfig};
use crate::store::{CompanyStore, JsonFileStore};

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// Fetched and extracted from the public registry.
    Registry,
    /// Found in the local store.
    Store,
}

/// Result of a lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResult {
    /// Query as given by the caller.
    pub query: String,
    /// Extracted record.
    pub record: CompanyRecord,
    /// Where the record came from.
    pub source: RecordSource,
    /// When the lookup completed.
    pub retrieved_at: DateTime<Utc>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Looks up a company on the registry.
///
/// Each call is one fetch followed by one extraction; nothing is shared
/// between calls besides the HTTP client.
#[derive(Debug, Clone)]
pub struct CompanyLookup<F = RegistryFetcher, E = RuleExtractor> {
    fetcher: F,
    extractor: E,
}

impl CompanyLookup {
    /// Create a lookup against the configured registry with the default rules.
    pub fn from_config(config: &FetchConfig) -> Result<Self, NetworkError> {
        Ok(Self::new(RegistryFetcher::new(config)?, RuleExtractor::default()))
    }
}

impl<F: PageFetcher, E: RecordExtractor> CompanyLookup<F, E> {
    pub fn new(fetcher: F, extractor: E) -> Self {
        Self { fetcher, extractor }
    }

    /// Fetch and extract the record for a tax code or company name.
    ///
    /// Fails only when the fetch fails; a fetched page always yields a
    /// record, possibly with every field absent.
    pub async fn lookup_record(&self, query: &str) -> Result<CompanyRecord, NetworkError> {
        let html = self.fetcher.fetch(query).await?;
        debug!("Fetched {} bytes for {:?}", html.len(), query);
        Ok(self.extractor.extract_from_html(&html))
    }

    /// Like [`lookup_record`](Self::lookup_record), wrapped with metadata.
    pub async fn lookup(&self, query: &str) -> Result<LookupResult, NetworkError> {
        let start = Instant::now();
        info!("Looking up {:?} on the registry", query);

        let record = self.lookup_record(query).await?;
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Lookup of {:?} found {}/{} fields in {}ms",
            query,
            record.present_fields().len(),
            FieldId::ALL.len(),
            processing_time_ms
        );

        Ok(LookupResult {
            query: query.to_string(),
            record,
            source: RecordSource::Registry,
            retrieved_at: Utc::now(),
            processing_time_ms,
        })
    }
}

/// Resolves a query from the local store first, then the registry.
///
/// The store is consulted with the query as given; no normalisation is done.
pub struct Resolver<S, F = RegistryFetcher, E = RuleExtractor> {
    store: S,
    lookup: CompanyLookup<F, E>,
}

impl Resolver<Option<JsonFileStore>> {
    /// Resolver over the configured store file, if any, and registry.
    pub fn from_config(config: &LookupConfig) -> crate::Result<Self> {
        config.validate()?;
        let lookup = CompanyLookup::from_config(&config.fetch)?;
        let store = config
            .store
            .path
            .as_ref()
            .map(JsonFileStore::open)
            .transpose()?;

        if let Some(store) = &store {
            info!(
                "Using local store {} ({} records)",
                store.path().display(),
                store.len()
            );
        }

        Ok(Self::new(store, lookup))
    }
}

impl<S: CompanyStore, F: PageFetcher, E: RecordExtractor> Resolver<S, F, E> {
    pub fn new(store: S, lookup: CompanyLookup<F, E>) -> Self {
        Self { store, lookup }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub async fn resolve(&self, query: &str) -> Result<LookupResult, NetworkError> {
        let start = Instant::now();

        if let Some(record) = self.store.get(query) {
            info!("Found {:?} in local store", query);
            return Ok(LookupResult {
                query: query.to_string(),
                record,
                source: RecordSource::Store,
                retrieved_at: Utc::now(),
                processing_time_ms: start.elapsed().as_millis() as u64,
            });
        }

        self.lookup.lookup(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::fetch;
    use crate::models::company::Field;
    use crate::store::MemoryStore;

    const FIXTURE: &str = include_str!("../tests/fixtures/company_page.html");

    /// Serves a canned page, or fails with HTTP 500 when `page` is `None`.
    struct CannedFetcher {
        page: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl CannedFetcher {
        fn new(page: Option<&'static str>) -> Self {
            Self {
                page,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PageFetcher for &CannedFetcher {
        async fn fetch(&self, _query: &str) -> fetch::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.page
                .map(str::to_string)
                .ok_or_else(|| NetworkError::Status {
                    status: 500,
                    url: "https://masothue.com/Search/".to_string(),
                })
        }
    }

    #[tokio::test]
    async fn test_lookup_extracts_record() {
        let fetcher = CannedFetcher::new(Some(FIXTURE));
        let lookup = CompanyLookup::new(&fetcher, RuleExtractor::default());

        let result = lookup.lookup("0101234567").await.unwrap();

        assert_eq!(result.source, RecordSource::Registry);
        assert_eq!(result.query, "0101234567");
        assert_eq!(result.record.tax_id.as_deref(), Some("0101234567"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_single_error() {
        let fetcher = CannedFetcher::new(None);
        let lookup = CompanyLookup::new(&fetcher, RuleExtractor::default());

        let err = lookup.lookup_record("0101234567").await.unwrap_err();

        assert!(matches!(err, NetworkError::Status { status: 500, .. }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unrelated_page_is_empty_record_not_error() {
        let fetcher = CannedFetcher::new(Some("<html><body>Không tìm thấy</body></html>"));
        let lookup = CompanyLookup::new(&fetcher, RuleExtractor::default());

        let record = lookup.lookup_record("nothing").await.unwrap();
        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn test_resolver_prefers_store() {
        let fetcher = CannedFetcher::new(None);
        let mut store = MemoryStore::new();
        store.insert(CompanyRecord {
            tax_id: Field::Present("0101234567".to_string()),
            name: Field::Present("CÔNG TY LƯU SẴN".to_string()),
            ..CompanyRecord::default()
        });

        let resolver = Resolver::new(store, CompanyLookup::new(&fetcher, RuleExtractor::default()));
        let result = resolver.resolve("0101234567").await.unwrap();

        assert_eq!(result.source, RecordSource::Store);
        assert_eq!(result.record.name.as_deref(), Some("CÔNG TY LƯU SẴN"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolver_falls_back_to_registry() {
        let fetcher = CannedFetcher::new(Some(FIXTURE));
        let resolver = Resolver::new(
            MemoryStore::new(),
            CompanyLookup::new(&fetcher, RuleExtractor::default()),
        );

        let result = resolver.resolve("0101234567").await.unwrap();

        assert_eq!(result.source, RecordSource::Registry);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
