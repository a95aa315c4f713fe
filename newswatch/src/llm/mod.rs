use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Core trait for LLM providers (local or remote)
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate completion for a given prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

/// Response from LLM generation. `raw` keeps the full wire payload so
/// callers can retain it for diagnostics.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
    pub raw: serde_json::Value,
}

/// Token usage metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

pub mod remote;

/// Helper to extract a single search query from model output that might
/// contain markdown fences, surrounding quotes or preamble lines.
pub fn extract_query_from_text(text: &str) -> Option<String> {
    let mut body = text.trim();

    // Strip a fenced block if the whole reply is wrapped in one
    if let Some(start) = body.find("```") {
        let rest = &body[start + 3..];
        // Skip an optional language tag on the opening fence
        let rest = rest.split_once('\n').map(|(_, r)| r).unwrap_or(rest);
        if let Some(end) = rest.find("```") {
            body = rest[..end].trim();
        }
    }

    // The query is the first non-empty line; later lines are explanation
    let line = body.lines().map(str::trim).find(|l| !l.is_empty())?;

    // Models like to quote the query they return
    let line = line.trim_matches(|c| c == '"' || c == '\'' || c == '`').trim();

    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_query_passes_through() {
        assert_eq!(
            extract_query_from_text("quantum computing breakthrough research"),
            Some("quantum computing breakthrough research".to_string())
        );
    }

    #[test]
    fn quotes_and_whitespace_are_stripped() {
        assert_eq!(
            extract_query_from_text("  \"nfl playoffs\"\n"),
            Some("nfl playoffs".to_string())
        );
    }

    #[test]
    fn fenced_reply_is_unwrapped() {
        assert_eq!(
            extract_query_from_text("```text\nxbox gaming\n```"),
            Some("xbox gaming".to_string())
        );
    }

    #[test]
    fn first_line_wins_over_explanation() {
        let reply = "ufc mma\n\nThis query focuses on the octagon.";
        assert_eq!(extract_query_from_text(reply), Some("ufc mma".to_string()));
    }

    #[test]
    fn empty_or_blank_reply_is_rejected() {
        assert_eq!(extract_query_from_text(""), None);
        assert_eq!(extract_query_from_text("  \n\t\n"), None);
        assert_eq!(extract_query_from_text("\"\""), None);
    }
}
