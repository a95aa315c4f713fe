//! Sequential per-topic pipeline: translate, fetch, synthesize, notify.
//! One topic failing never stops the remaining topics.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::github::{format_report, issue_title, GithubNotifier, NotifyTarget};
use crate::llm::LlmProvider;
use crate::news::NewsClient;
use crate::synthesis::synthesize_report;
use crate::translator::QueryTranslator;

pub struct PipelineOptions {
    pub days_back: i64,
    pub sources: Option<String>,
    pub max_headlines: usize,
    pub target: NotifyTarget,
    pub mentions: Vec<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            days_back: 1,
            sources: None,
            max_headlines: 5,
            target: NotifyTarget::NewIssue,
            mentions: Vec::new(),
        }
    }
}

/// Per-run outcome counts for the operator log line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub topics: usize,
    pub published: usize,
    /// Topics that produced no articles (nothing to report)
    pub skipped: usize,
    /// Topics whose fetch or publish step failed
    pub failed: usize,
}

pub struct Pipeline {
    translator: QueryTranslator,
    news: NewsClient,
    llm: Arc<dyn LlmProvider>,
    /// None = dry run; reports are logged instead of published
    notifier: Option<GithubNotifier>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        translator: QueryTranslator,
        news: NewsClient,
        llm: Arc<dyn LlmProvider>,
        notifier: Option<GithubNotifier>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            translator,
            news,
            llm,
            notifier,
            options,
        }
    }

    /// Tear down the pipeline, releasing the translator (and its cache).
    pub fn into_translator(self) -> QueryTranslator {
        self.translator
    }

    /// Process every topic in order. Never fails as a whole; per-topic
    /// problems are logged and counted.
    pub async fn run(&mut self, topics: &[String]) -> RunSummary {
        let mut summary = RunSummary {
            topics: topics.len(),
            ..RunSummary::default()
        };

        for topic in topics {
            info!(topic, "processing topic");
            match self.run_topic(topic).await {
                TopicOutcome::Published => summary.published += 1,
                TopicOutcome::NoArticles => summary.skipped += 1,
                TopicOutcome::Failed => summary.failed += 1,
            }
        }

        info!(
            topics = summary.topics,
            published = summary.published,
            skipped = summary.skipped,
            failed = summary.failed,
            "pipeline run complete"
        );
        summary
    }

    async fn run_topic(&mut self, topic: &str) -> TopicOutcome {
        // Step 1: topic -> query (infallible, cached)
        let query = self.translator.translate(topic).await;

        // Step 2: fetch articles; a failing topic must not stop the rest
        let articles = match self
            .news
            .search(&query, self.options.days_back, self.options.sources.as_deref())
            .await
        {
            Ok(articles) => articles,
            Err(e) => {
                error!(topic, %query, err = %format!("{:#}", e), "news fetch failed, skipping topic");
                return TopicOutcome::Failed;
            }
        };

        if articles.is_empty() {
            info!(topic, %query, "no articles found, skipping notification");
            return TopicOutcome::NoArticles;
        }

        // Step 3: synthesize (degrades internally, never fails)
        let report = synthesize_report(
            self.llm.as_ref(),
            topic,
            &articles,
            self.options.max_headlines,
        )
        .await;

        // Step 4: publish
        let body = format_report(topic, &report, &self.options.mentions);
        match &self.notifier {
            Some(notifier) => {
                let title = issue_title(topic);
                match notifier.publish(self.options.target, &title, &body).await {
                    Ok(url) => {
                        info!(topic, %url, "report published");
                        TopicOutcome::Published
                    }
                    Err(e) => {
                        error!(topic, err = %format!("{:#}", e), "publish failed");
                        TopicOutcome::Failed
                    }
                }
            }
            None => {
                warn!(topic, "dry run, not publishing");
                println!("{}", body);
                TopicOutcome::Published
            }
        }
    }
}

enum TopicOutcome {
    Published,
    NoArticles,
    Failed,
}
