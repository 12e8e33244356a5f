//! Local store of known company records, keyed by tax code.
//!
//! The lookup pipeline never touches a store; [`Resolver`](crate::Resolver)
//! consults one before falling back to the registry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::company::CompanyRecord;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Trait for keyed record lookup.
pub trait CompanyStore {
    /// Record stored under this tax code, if any.
    fn get(&self, tax_code: &str) -> Option<CompanyRecord>;

    /// Every stored record, ordered by tax code.
    fn all(&self) -> Vec<CompanyRecord>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, CompanyRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record under its tax id.
    ///
    /// Returns `false` and stores nothing when the record has no tax id.
    pub fn insert(&mut self, record: CompanyRecord) -> bool {
        let key = match record.tax_id.as_deref().map(str::trim) {
            Some(tax_code) if !tax_code.is_empty() => tax_code.to_string(),
            _ => return false,
        };
        self.records.insert(key, record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CompanyStore for MemoryStore {
    fn get(&self, tax_code: &str) -> Option<CompanyRecord> {
        self.records.get(tax_code).cloned()
    }

    fn all(&self) -> Vec<CompanyRecord> {
        self.records.values().cloned().collect()
    }
}

/// Store backed by a JSON array of records on disk.
///
/// Loaded once on open; changes are written back by [`save`](Self::save).
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    records: MemoryStore,
}

impl JsonFileStore {
    /// Open a store file. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut records = MemoryStore::new();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let loaded: Vec<CompanyRecord> = serde_json::from_str(&content)?;
            let total = loaded.len();
            for record in loaded {
                if !records.insert(record) {
                    warn!("Skipping stored record without tax id in {}", path.display());
                }
            }
            debug!("Loaded {}/{} records from {}", records.len(), total, path.display());
        }

        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace a record; see [`MemoryStore::insert`].
    pub fn insert(&mut self, record: CompanyRecord) -> bool {
        self.records.insert(record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write all records back to the store file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.records.all())?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl CompanyStore for JsonFileStore {
    fn get(&self, tax_code: &str) -> Option<CompanyRecord> {
        self.records.get(tax_code)
    }

    fn all(&self) -> Vec<CompanyRecord> {
        self.records.all()
    }
}

impl<S: CompanyStore> CompanyStore for &S {
    fn get(&self, tax_code: &str) -> Option<CompanyRecord> {
        (**self).get(tax_code)
    }

    fn all(&self) -> Vec<CompanyRecord> {
        (**self).all()
    }
}

/// An unconfigured store never has a record.
impl<S: CompanyStore> CompanyStore for Option<S> {
    fn get(&self, tax_code: &str) -> Option<CompanyRecord> {
        self.as_ref().and_then(|store| store.get(tax_code))
    }

    fn all(&self) -> Vec<CompanyRecord> {
        self.as_ref().map(|store| store.all()).unwrap_or_default()
    }
}
