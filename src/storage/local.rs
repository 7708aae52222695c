//! Local filesystem storage implementation.
//!
//! Ledgers and records are JSON files under a root directory. Writes go to
//! a temp file first and are renamed into place, so readers never observe a
//! half-written ledger.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{EnrichedRecord, IdentityLedger};
use crate::storage::JobStorage;
use crate::utils::sanitize_key;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    fn ledger_key(source: &str) -> String {
        format!("{}.json", sanitize_key(source))
    }

    fn record_key(source: &str, key: &str) -> String {
        format!("{}/{}.json", sanitize_key(source), sanitize_key(key))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl JobStorage for LocalStorage {
    async fn load_ledger(&self, source: &str) -> Result<IdentityLedger> {
        match self.read_json::<IdentityLedger>(&Self::ledger_key(source)).await? {
            Some(ledger) => Ok(ledger),
            None => {
                log::info!("No ledger for '{}' yet, starting empty", source);
                Ok(IdentityLedger::new())
            }
        }
    }

    async fn save_ledger(&self, source: &str, ledger: &IdentityLedger) -> Result<()> {
        let key = Self::ledger_key(source);
        if let Some(stored) = self.read_json::<IdentityLedger>(&key).await? {
            let lost = stored.missing_from(ledger);
            if !lost.is_empty() {
                return Err(AppError::validation(format!(
                    "refusing to save ledger for '{}': {} identities would be dropped (first: {})",
                    source,
                    lost.len(),
                    lost[0]
                )));
            }
        }

        self.write_json(&key, ledger).await?;
        log::debug!("Ledger for '{}' saved with {} entries", source, ledger.len());
        Ok(())
    }

    async fn write_record(
        &self,
        source: &str,
        key: &str,
        record: &EnrichedRecord,
    ) -> Result<String> {
        let record_key = Self::record_key(source, key);
        self.write_json(&record_key, record).await?;
        Ok(self.path(&record_key).display().to_string())
    }

    async fn load_record(&self, source: &str, key: &str) -> Result<Option<EnrichedRecord>> {
        self.read_json(&Self::record_key(source, key)).await
    }

    async fn record_exists(&self, source: &str, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path(&Self::record_key(source, key))).await?)
    }

    async fn record_count(&self, source: &str) -> Result<usize> {
        let dir = self.path(&sanitize_key(source));
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }
}
