//! NewsAPI-compatible article search client.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// One article as handed to synthesis. Flattened from the wire format.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub description: Option<String>,
    pub source: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
}

pub struct NewsClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
    page_size: u32,
}

impl NewsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("Newswatch/0.1.0")
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            language: "en".to_string(),
            page_size: 20,
        })
    }

    pub fn with_options(mut self, language: impl Into<String>, page_size: u32) -> Self {
        self.language = language.into();
        self.page_size = page_size;
        self
    }

    /// Search articles matching `query` published within the last `days_back`
    /// days, optionally restricted to a comma-separated source allow-list.
    /// Results are deduplicated by URL, newest first (API sort order).
    pub async fn search(
        &self,
        query: &str,
        days_back: i64,
        sources: Option<&str>,
    ) -> Result<Vec<Article>> {
        let from_date = (Utc::now() - Duration::days(days_back))
            .format("%Y-%m-%d")
            .to_string();

        debug!(%query, %from_date, "searching news");

        let mut params = vec![
            ("q", query.to_string()),
            ("from", from_date),
            ("language", self.language.clone()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", self.page_size.to_string()),
            ("apiKey", self.api_key.clone()),
        ];
        if let Some(sources) = sources {
            params.push(("sources", sources.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/everything", self.base_url))
            .query(&params)
            .send()
            .await
            .context("news search request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            match status.as_u16() {
                401 => anyhow::bail!("news API rejected the key (401): {}", body),
                429 => anyhow::bail!("news API rate limit exceeded (429): {}", body),
                _ => anyhow::bail!("news API error {}: {}", status, body),
            }
        }

        let resp_body: NewsApiResponse = response
            .json()
            .await
            .context("failed to parse news API response")?;

        let articles = dedupe_by_url(resp_body.articles);
        info!(
            %query,
            found = articles.len(),
            total_available = resp_body.total_results,
            "news search done"
        );
        Ok(articles)
    }
}

/// Drop entries without a URL and keep the first occurrence of each URL,
/// preserving order. The same story often comes back via several sources.
fn dedupe_by_url(wire: Vec<WireArticle>) -> Vec<Article> {
    let mut seen = HashSet::new();
    wire.into_iter()
        .filter_map(|a| {
            let url = a.url?;
            if url.is_empty() || !seen.insert(url.clone()) {
                return None;
            }
            Some(Article {
                title: a.title.unwrap_or_default(),
                description: a.description,
                source: a.source.and_then(|s| s.name).unwrap_or_default(),
                url,
                published_at: a.published_at,
                content: a.content,
            })
        })
        .collect()
}

// NewsAPI wire structures
#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    #[allow(dead_code)]
    status: Option<String>,
    #[serde(rename = "totalResults", default)]
    total_results: u64,
    #[serde(default)]
    articles: Vec<WireArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireArticle {
    title: Option<String>,
    description: Option<String>,
    source: Option<WireSource>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSource {
    name: Option<String>,
}
