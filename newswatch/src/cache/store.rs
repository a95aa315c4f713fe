//! Durable persistence for the cache document.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::CacheFile;

/// Reads and writes the cache document at a fixed path. Saves go through a
/// temp file + rename so a crash mid-write cannot leave a half-written
/// document readable by the next load.
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache document. Never fails the pipeline: a missing,
    /// unreadable or malformed file degrades to an empty cache (every topic
    /// becomes a miss and gets re-translated).
    pub fn load(&self) -> CacheFile {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cache file yet, starting empty");
                return CacheFile::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), %e, "cache file unreadable, starting empty");
                return CacheFile::default();
            }
        };

        match serde_json::from_str(&data) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %self.path.display(), %e, "cache file malformed, starting empty");
                CacheFile::default()
            }
        }
    }

    /// Persist the full cache document, replacing any previous snapshot.
    pub fn save(&self, file: &CacheFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create cache directory: {}", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(file).context("Failed to serialize cache")?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write cache temp file: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace cache file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), entries = file.entries.len(), "cache saved");
        Ok(())
    }
}
