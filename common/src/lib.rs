/*!
common/src/lib.rs

Shared configuration types for Newswatch.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file
- Layered loading: a defaults file merged with an optional override file
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// News search configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the NewsAPI-compatible endpoint (e.g. "https://newsapi.org/v2")
    pub api_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Lookback window in days
    pub days_back: Option<i64>,
    /// Article language filter ("en", "fr", ...)
    pub language: Option<String>,
    /// Max results requested per search
    pub page_size: Option<u32>,
    /// Optional comma-separated source allow-list (e.g. "reuters,bbc-news")
    pub sources: Option<String>,
}

/// Remote LLM configuration (OpenAI-compatible chat completions endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
}

/// Query translation cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Path to the cache document (e.g. "data/query_cache.json")
    pub path: String,
}

/// Report shaping options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of headlines the synthesized digest should contain
    pub max_headlines: Option<usize>,
}

/// GitHub notification configuration. The section is optional; when absent
/// the pipeline runs without publishing anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Target repository in "owner/name" form
    pub repo: String,
    /// Name of the environment variable holding the API token
    pub token_env: Option<String>,
    /// Base URL of the GitHub API (overridable for tests)
    pub api_url: Option<String>,
    /// "per-run" = new issue per pipeline run, "single-issue" = comment on issue_number
    pub mode: Option<String>,
    /// Issue to comment on when mode = "single-issue"
    pub issue_number: Option<u64>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Usernames to @mention in the report body
    #[serde(default)]
    pub mentions: Vec<String>,
    /// Usernames to assign on created issues
    #[serde(default)]
    pub assignees: Vec<String>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Topics to aggregate news for, in natural language
    #[serde(default)]
    pub topics: Vec<String>,
    pub search: SearchConfig,
    pub llm: Option<LlmConfig>,
    pub cache: CacheConfig,
    pub report: Option<ReportConfig>,
    pub github: Option<GithubConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BASE: &str = r#"
        topics = ["quantum computing breakthroughs"]

        [search]
        api_url = "https://newsapi.org/v2"
        api_key_env = "NEWSAPI_KEY"
        days_back = 1
        language = "en"
        page_size = 20

        [cache]
        path = "data/query_cache.json"

        [report]
        max_headlines = 5
    "#;

    #[test]
    fn config_parses_from_toml() {
        let cfg: Config = toml::from_str(BASE).expect("parse config");
        assert_eq!(cfg.topics.len(), 1);
        assert_eq!(cfg.search.days_back, Some(1));
        assert_eq!(cfg.cache.path, "data/query_cache.json");
        assert!(cfg.github.is_none());
    }

    #[tokio::test]
    async fn override_file_wins_on_merge() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.toml");
        let override_path = dir.path().join("config.toml");

        std::fs::File::create(&default_path)
            .and_then(|mut f| f.write_all(BASE.as_bytes()))
            .expect("write default");
        std::fs::File::create(&override_path)
            .and_then(|mut f| {
                f.write_all(
                    br#"
                        topics = ["chicago bears"]

                        [search]
                        days_back = 3

                        [github]
                        repo = "someone/news"
                        token_env = "GITHUB_TOKEN"
                    "#,
                )
            })
            .expect("write override");

        let cfg = Config::load_with_defaults(Some(&default_path), Some(&override_path))
            .await
            .expect("load merged config");

        // Overridden values
        assert_eq!(cfg.topics, vec!["chicago bears".to_string()]);
        assert_eq!(cfg.search.days_back, Some(3));
        // Values only present in defaults survive the merge
        assert_eq!(cfg.search.language.as_deref(), Some("en"));
        assert_eq!(cfg.cache.path, "data/query_cache.json");
        // Section only present in the override
        assert_eq!(cfg.github.expect("github section").repo, "someone/news");
    }
}
