//! Hit/miss decisions and key derivation. All access to the store goes
//! through here; the policy owns the in-memory document for the run.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{key_for, CacheFile, CacheKey, CacheRecord, CacheStore};

/// Read-only aggregate over the cache document.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub total: usize,
    /// Records carrying an error (fallback queries from failed translations)
    pub errors: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// Mediates the cache document. Constructed per run and passed to the
/// translator by handle, so tests can inject isolated instances.
pub struct CachePolicy {
    store: CacheStore,
    file: CacheFile,
}

impl CachePolicy {
    /// Load the persisted document (or start empty) and take ownership of it
    /// for the run.
    pub fn open(store: CacheStore) -> Self {
        let file = store.load();
        debug!(entries = file.entries.len(), "query cache opened");
        Self { store, file }
    }

    pub fn key_for(topic: &str) -> CacheKey {
        key_for(topic)
    }

    /// Look up a topic. A record whose `error` is set still counts as a hit:
    /// failed translations are cached permanently and the fallback query is
    /// reused instead of re-spending on the LLM. Retry requires `clear()`.
    pub fn get(&self, topic: &str) -> Option<&CacheRecord> {
        self.file.entries.get(&key_for(topic))
    }

    /// Insert or overwrite the record for a topic, then persist the snapshot.
    /// On a save error the in-memory insert stands and the error is returned;
    /// the caller decides whether persistence failure matters (it never
    /// aborts a translation).
    pub fn put(&mut self, topic: &str, record: CacheRecord) -> Result<()> {
        self.file.entries.insert(key_for(topic), record);
        self.store.save(&self.file)
    }

    /// Reset the cache to empty and persist. Irreversible; this is the only
    /// way to force re-translation of previously failed topics.
    pub fn clear(&mut self) -> Result<()> {
        let dropped = self.file.entries.len();
        self.file = CacheFile::default();
        self.store.save(&self.file)?;
        info!(dropped, "query cache cleared");
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let records = self.file.entries.values();
        CacheStats {
            total: self.file.entries.len(),
            errors: records.clone().filter(|r| r.error.is_some()).count(),
            oldest: records.clone().map(|r| r.created_at).min(),
            newest: records.map(|r| r.created_at).max(),
        }
    }
}
