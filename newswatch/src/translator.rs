//! Topic -> search-query translation, memoized through the cache.
//!
//! A hit never re-invokes the LLM, including hits on records written for a
//! failed translation: failures are cached permanently (with a fallback
//! query) to bound API spend. An operator clears the cache to force retry.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CachePolicy, CacheRecord};
use crate::llm::{extract_query_from_text, LlmProvider, LlmRequest};

const TRANSLATE_MAX_TOKENS: usize = 60;
const TRANSLATE_TEMPERATURE: f32 = 0.3;

/// Result of one LLM translation attempt, after the response has been
/// parsed. Anything without a usable query string is a Failure.
#[derive(Debug)]
enum TranslationOutcome {
    Success {
        query: String,
        raw: serde_json::Value,
    },
    Failure {
        reason: String,
        raw: Option<serde_json::Value>,
    },
}

pub struct QueryTranslator {
    provider: Arc<dyn LlmProvider>,
    cache: CachePolicy,
}

impl QueryTranslator {
    pub fn new(provider: Arc<dyn LlmProvider>, cache: CachePolicy) -> Self {
        Self { provider, cache }
    }

    /// Hand back the cache at end of run (e.g. to print stats).
    pub fn into_cache(self) -> CachePolicy {
        self.cache
    }

    /// Produce a search query for the topic. Infallible: on any translation
    /// problem the deterministic fallback query is returned (and cached, so
    /// the failure is not retried on the next run).
    pub async fn translate(&mut self, topic: &str) -> String {
        if let Some(record) = self.cache.get(topic) {
            debug!(topic, query = %record.generated_query, cached_error = record.error.is_some(),
                "query cache hit");
            return record.generated_query.clone();
        }

        info!(topic, "query cache miss, asking LLM for a search query");

        let record = match self.request_translation(topic).await {
            TranslationOutcome::Success { query, raw } => {
                info!(topic, %query, "LLM translated topic");
                CacheRecord {
                    original_query: topic.to_string(),
                    generated_query: query,
                    created_at: Utc::now(),
                    raw_response: Some(raw),
                    error: None,
                }
            }
            TranslationOutcome::Failure { reason, raw } => {
                let fallback = fallback_query(topic);
                warn!(topic, %reason, %fallback, "translation failed, caching fallback query");
                CacheRecord {
                    original_query: topic.to_string(),
                    generated_query: fallback,
                    created_at: Utc::now(),
                    raw_response: raw,
                    error: Some(reason),
                }
            }
        };

        let query = record.generated_query.clone();
        // Persistence failure must not break the run; the query is still good
        if let Err(e) = self.cache.put(topic, record) {
            warn!(topic, %e, "failed to persist query cache");
        }
        query
    }

    async fn request_translation(&self, topic: &str) -> TranslationOutcome {
        let request = LlmRequest {
            prompt: translation_prompt(topic),
            max_tokens: Some(TRANSLATE_MAX_TOKENS),
            temperature: Some(TRANSLATE_TEMPERATURE),
            timeout_seconds: None,
        };

        let response = match self.provider.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                return TranslationOutcome::Failure {
                    reason: format!("{:#}", e),
                    raw: None,
                }
            }
        };

        match extract_query_from_text(&response.content) {
            Some(query) => TranslationOutcome::Success {
                query,
                raw: response.raw,
            },
            None => TranslationOutcome::Failure {
                reason: format!("no usable query in LLM reply: {:?}", response.content),
                raw: Some(response.raw),
            },
        }
    }
}

fn translation_prompt(topic: &str) -> String {
    format!(
        r#"You are a search strategy expert. Convert the user request below into one effective news search query.

Rules:
- Return ONLY the query, no other text
- The query should be 2-4 words, suitable for a news search API
- Include industry-specific terms when relevant
- Avoid overly broad or overly specific terms

User request: "{}""#,
        topic
    )
}

/// Deterministic local fallback when translation fails: drop the filler
/// words a person puts in a topic ("news", "headlines") and keep the rest.
pub fn fallback_query(topic: &str) -> String {
    let cleaned: Vec<&str> = topic
        .split_whitespace()
        .filter(|w| {
            let w = w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            w != "news" && w != "headlines"
        })
        .collect();

    if cleaned.is_empty() {
        topic.trim().to_string()
    } else {
        cleaned.join(" ")
    }
}
