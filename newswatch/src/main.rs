/*
newswatch - single-binary main.rs
Runs the topic -> query -> fetch -> synthesize -> notify pipeline once.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newswatch::cache::{CachePolicy, CacheStore};
use newswatch::github::{GithubNotifier, NotifyTarget};
use newswatch::llm::remote::RemoteLlmProvider;
use newswatch::llm::LlmProvider;
use newswatch::news::NewsClient;
use newswatch::pipeline::{Pipeline, PipelineOptions};
use newswatch::translator::QueryTranslator;

#[derive(Parser, Debug)]
#[command(name = "newswatch", about = "Newswatch topic-driven news pipeline")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print query cache statistics and exit
    #[arg(long)]
    cache_stats: bool,

    /// Reset the query cache to empty and exit
    #[arg(long)]
    clear_cache: bool,

    /// Run the pipeline without publishing to GitHub
    #[arg(long)]
    dry_run: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    // Load configuration with defaults
    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    // The query cache lives wherever the config points it
    let store = CacheStore::new(&config.cache.path);

    // Cache maintenance fast paths
    if args.cache_stats {
        let policy = CachePolicy::open(store);
        let stats = policy.stats();
        println!("query cache: {}", config.cache.path);
        println!("  entries: {}", stats.total);
        println!("  errors:  {}", stats.errors);
        if let Some(oldest) = stats.oldest {
            println!("  oldest:  {}", oldest.to_rfc3339());
        }
        if let Some(newest) = stats.newest {
            println!("  newest:  {}", newest.to_rfc3339());
        }
        return Ok(());
    }
    if args.clear_cache {
        let mut policy = CachePolicy::open(store);
        policy.clear().context("failed to clear query cache")?;
        println!("query cache cleared: {}", config.cache.path);
        return Ok(());
    }

    if config.topics.is_empty() {
        error!("no topics configured, nothing to do");
        return Ok(());
    }

    // Build collaborators from config; API keys come from the environment
    let llm: Arc<dyn LlmProvider> = Arc::from(create_llm_provider(&config)?);
    let news = create_news_client(&config)?;

    let notifier = if args.dry_run {
        info!("dry run requested, GitHub publishing disabled");
        None
    } else {
        create_notifier(&config)?
    };

    let target = notify_target(&config);
    let options = PipelineOptions {
        days_back: config.search.days_back.unwrap_or(1),
        sources: config.search.sources.clone(),
        max_headlines: config
            .report
            .as_ref()
            .and_then(|r| r.max_headlines)
            .unwrap_or(5),
        target,
        mentions: config
            .github
            .as_ref()
            .map(|g| g.mentions.clone())
            .unwrap_or_default(),
    };

    let translator = QueryTranslator::new(llm.clone(), CachePolicy::open(store));
    let mut pipeline = Pipeline::new(translator, news, llm, notifier, options);

    let summary = pipeline.run(&config.topics).await;

    // Leave a final stats line so the cache's state is visible per run
    let cache = pipeline.into_translator().into_cache();
    let stats = cache.stats();
    info!(
        cached_queries = stats.total,
        cached_errors = stats.errors,
        "run finished"
    );

    if summary.failed > 0 {
        info!(failed = summary.failed, "some topics failed; see log above");
    }
    Ok(())
}

/// Create the LLM provider from configuration, resolving the API key from
/// the environment variable the config names.
fn create_llm_provider(config: &Config) -> Result<Box<dyn LlmProvider>> {
    let llm_config = config
        .llm
        .as_ref()
        .context("missing [llm] section in configuration")?;

    let api_key_env = llm_config
        .api_key_env
        .as_deref()
        .context("Missing api_key_env in [llm] config")?;
    let api_key = std::env::var(api_key_env)
        .with_context(|| format!("LLM API key env var '{}' not set", api_key_env))?;

    let model = llm_config
        .model
        .clone()
        .unwrap_or_else(|| "gpt-4o-mini".to_string());
    let api_url = llm_config
        .api_url
        .clone()
        .unwrap_or_else(|| "http://localhost:11434/v1/chat/completions".to_string());
    let timeout_secs = llm_config.timeout_seconds.unwrap_or(30);
    let max_tokens = llm_config.max_tokens.unwrap_or(500);

    info!(%model, %api_url, "LLM provider initialized");
    let provider =
        RemoteLlmProvider::new(api_url, api_key, model).with_defaults(timeout_secs, max_tokens, 0.7);
    Ok(Box::new(provider))
}

fn create_news_client(config: &Config) -> Result<NewsClient> {
    let api_url = config
        .search
        .api_url
        .clone()
        .unwrap_or_else(|| "https://newsapi.org/v2".to_string());
    let api_key_env = config
        .search
        .api_key_env
        .as_deref()
        .context("Missing api_key_env in [search] config")?;
    let api_key = std::env::var(api_key_env)
        .with_context(|| format!("News API key env var '{}' not set", api_key_env))?;

    let language = config
        .search
        .language
        .clone()
        .unwrap_or_else(|| "en".to_string());
    let page_size = config.search.page_size.unwrap_or(20);

    Ok(NewsClient::new(api_url, api_key)?.with_options(language, page_size))
}

/// Build the notifier when a [github] section is present; without one the
/// pipeline runs as if --dry-run were passed.
fn create_notifier(config: &Config) -> Result<Option<GithubNotifier>> {
    let github = match &config.github {
        Some(github) => github,
        None => {
            info!("no [github] section configured, reports will not be published");
            return Ok(None);
        }
    };

    let token_env = github
        .token_env
        .as_deref()
        .context("Missing token_env in [github] config")?;
    let token = std::env::var(token_env)
        .with_context(|| format!("GitHub token env var '{}' not set", token_env))?;
    let api_url = github
        .api_url
        .clone()
        .unwrap_or_else(|| "https://api.github.com".to_string());

    let notifier = GithubNotifier::new(api_url, github.repo.clone(), token)?
        .with_labels(github.labels.clone())
        .with_assignees(github.assignees.clone());
    Ok(Some(notifier))
}

fn notify_target(config: &Config) -> NotifyTarget {
    match config.github.as_ref() {
        Some(github) if github.mode.as_deref() == Some("single-issue") => {
            match github.issue_number {
                Some(number) => NotifyTarget::ExistingIssue(number),
                None => {
                    error!("github.mode is 'single-issue' but issue_number is missing; creating new issues instead");
                    NotifyTarget::NewIssue
                }
            }
        }
        _ => NotifyTarget::NewIssue,
    }
}
