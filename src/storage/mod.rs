//! Storage abstractions for ledgers and enriched records.
//!
//! Each source owns one ledger and one record directory:
//!
//! ```text
//! {root}/
//! ├── jobs.json             # Ledger: every listing seen from `jobs`
//! ├── jobs/                 # Records: one file per enriched posting
//! │   ├── accountant-123.json
//! │   └── developer-456.json
//! ├── wazifaha.json
//! └── wazifaha/
//!     └── 25664-marketing-officer.json
//! ```
//!
//! Ledgers follow load-merge-store per run: loaded once, merged in memory,
//! saved once. Every save replaces the whole file atomically.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EnrichedRecord, IdentityLedger};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for job storage backends.
#[async_trait]
pub trait JobStorage: Send + Sync {
    /// Load the ledger for a source; a missing ledger is empty.
    async fn load_ledger(&self, source: &str) -> Result<IdentityLedger>;

    /// Replace the ledger for a source.
    ///
    /// Fails without writing if the new ledger would lose any identity
    /// already stored.
    async fn save_ledger(&self, source: &str, ledger: &IdentityLedger) -> Result<()>;

    /// Write a record, returning where it was stored.
    async fn write_record(
        &self,
        source: &str,
        key: &str,
        record: &EnrichedRecord,
    ) -> Result<String>;

    /// Load a record if it exists.
    async fn load_record(&self, source: &str, key: &str) -> Result<Option<EnrichedRecord>>;

    /// Whether a record exists for `key`.
    async fn record_exists(&self, source: &str, key: &str) -> Result<bool>;

    /// Number of records stored for a source.
    async fn record_count(&self, source: &str) -> Result<usize>;
}
