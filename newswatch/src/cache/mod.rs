//! Query translation cache: a persisted topic -> generated-query mapping
//! used to avoid repeated calls to the LLM for the same topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

pub mod policy;
pub mod store;

pub use policy::{CachePolicy, CacheStats};
pub use store::CacheStore;

/// Hex SHA-256 digest of the normalized topic string.
pub type CacheKey = String;

/// One cached translation. `generated_query` is always usable: on a failed
/// translation it holds the locally derived fallback and `error` records why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// The raw topic string as configured by the user
    pub original_query: String,
    /// Search query handed to the news API (LLM output, or fallback on error)
    pub generated_query: String,
    /// When this record was written
    pub created_at: DateTime<Utc>,
    /// Full LLM response payload, kept for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<serde_json::Value>,
    /// Failure details; present only when the translation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The whole cache document. Held in memory for the run, persisted as a
/// single JSON snapshot after each write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheFile {
    #[serde(default)]
    pub entries: HashMap<CacheKey, CacheRecord>,
}

/// Derive the cache key for a topic: lowercase, collapse whitespace, hash.
/// Topics differing only in case or whitespace map to the same key.
pub fn key_for(topic: &str) -> CacheKey {
    let normalized = normalize_topic(topic);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn normalize_topic(topic: &str) -> String {
    topic
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
