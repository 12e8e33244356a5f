//! Data models for registry lookups.

pub mod company;
pub mod config;

pub use company::{CompanyRecord, Field, FieldId};
pub use config::{BrowserHeaders, FetchConfig, LookupConfig, StoreConfig};
