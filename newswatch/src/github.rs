//! GitHub issue notifications. GitHub fans the report out by email to
//! watchers, assignees and mentioned users, so no mailer is needed here.

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where a report lands: a fresh issue per run, or a comment appended to a
/// long-lived issue for ongoing updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyTarget {
    NewIssue,
    ExistingIssue(u64),
}

pub struct GithubNotifier {
    client: Client,
    api_base: String,
    repo: String,
    token: String,
    labels: Vec<String>,
    assignees: Vec<String>,
}

impl GithubNotifier {
    pub fn new(
        api_base: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            // GitHub rejects requests without a user agent
            .user_agent("Newswatch/0.1.0")
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            repo: repo.into(),
            token: token.into(),
            labels: vec!["news-summary".to_string(), "automated".to_string()],
            assignees: Vec::new(),
        })
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        if !labels.is_empty() {
            self.labels = labels;
        }
        self
    }

    pub fn with_assignees(mut self, assignees: Vec<String>) -> Self {
        self.assignees = assignees;
        self
    }

    /// Publish a report and return the created resource's URL.
    pub async fn publish(
        &self,
        target: NotifyTarget,
        title: &str,
        body: &str,
    ) -> Result<String> {
        match target {
            NotifyTarget::NewIssue => self.create_issue(title, body).await,
            NotifyTarget::ExistingIssue(number) => self.add_comment(number, body).await,
        }
    }

    async fn create_issue(&self, title: &str, body: &str) -> Result<String> {
        let url = format!("{}/repos/{}/issues", self.api_base, self.repo);
        let request = IssueRequest {
            title,
            body,
            labels: &self.labels,
            assignees: &self.assignees,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&request)
            .send()
            .await
            .context("GitHub issue request failed")?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("GitHub issue creation failed {}: {}", status, body);
        }

        let issue: CreatedResource = response
            .json()
            .await
            .context("failed to parse GitHub issue response")?;

        info!(url = %issue.html_url, "GitHub issue created");
        Ok(issue.html_url)
    }

    async fn add_comment(&self, issue_number: u64, body: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{}/issues/{}/comments",
            self.api_base, self.repo, issue_number
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&CommentRequest { body })
            .send()
            .await
            .context("GitHub comment request failed")?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "GitHub comment on issue #{} failed {}: {}",
                issue_number,
                status,
                body
            );
        }

        let comment: CreatedResource = response
            .json()
            .await
            .context("failed to parse GitHub comment response")?;

        info!(issue_number, url = %comment.html_url, "GitHub comment added");
        Ok(comment.html_url)
    }
}

/// Markdown body for an issue or comment: optional @mentions, report header
/// with generation time, the digest itself, and a provenance footer.
pub fn format_report(topic: &str, summary: &str, mentions: &[String]) -> String {
    let mut body = String::new();

    if !mentions.is_empty() {
        let mentions: Vec<String> = mentions.iter().map(|u| format!("@{}", u)).collect();
        body.push_str(&mentions.join(" "));
        body.push_str("\n\n");
    }

    body.push_str(&format!("## Daily News Intelligence: {}\n\n", topic));
    body.push_str(&format!(
        "**Generated:** {}\n\n---\n\n",
        Utc::now().format("%B %d, %Y at %H:%M UTC")
    ));
    body.push_str(summary);
    body.push_str(
        "\n\n---\n\n<details>\n<summary>About this report</summary>\n\n\
         This summary was automatically generated from a topic-driven news search\n\
         with LLM query planning and synthesis. To change the topics, edit the\n\
         `topics` list in the configuration file.\n</details>\n",
    );
    body
}

/// Issue title for a per-run report, e.g. "Chicago Bears - 2026-08-07".
pub fn issue_title(topic: &str) -> String {
    format!("{} - {}", title_case(topic), Utc::now().format("%Y-%m-%d"))
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Serialize)]
struct IssueRequest<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a [String],
    assignees: &'a [String],
}

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedResource {
    html_url: String,
}
