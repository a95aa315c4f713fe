use mockito::Matcher;
use std::path::Path;
use std::sync::Arc;

use newswatch::cache::{CachePolicy, CacheStore};
use newswatch::github::{GithubNotifier, NotifyTarget};
use newswatch::llm::remote::RemoteLlmProvider;
use newswatch::llm::LlmProvider;
use newswatch::news::NewsClient;
use newswatch::pipeline::{Pipeline, PipelineOptions};
use newswatch::translator::QueryTranslator;

fn build_pipeline(server_url: &str, cache_path: &Path, target: NotifyTarget) -> Pipeline {
    let llm: Arc<dyn LlmProvider> = Arc::new(RemoteLlmProvider::new(
        format!("{}/llm", server_url),
        "fake-llm-key",
        "gpt-4o-mini",
    ));
    let news = NewsClient::new(server_url.to_string(), "fake-news-key").expect("news client");
    let notifier =
        GithubNotifier::new(server_url.to_string(), "someone/news", "fake-token").expect("notifier");
    let translator = QueryTranslator::new(llm.clone(), CachePolicy::open(CacheStore::new(cache_path)));

    Pipeline::new(
        translator,
        news,
        llm,
        Some(notifier),
        PipelineOptions {
            target,
            ..PipelineOptions::default()
        },
    )
}

fn llm_reply(content: &str) -> String {
    serde_json::json!({
        "model": "gpt-4o-mini",
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 10, "total_tokens": 20}
    })
    .to_string()
}

fn one_article_body() -> &'static str {
    r#"{
        "status": "ok",
        "totalResults": 1,
        "articles": [{
            "source": {"id": "reuters", "name": "Reuters"},
            "title": "Qubit count record broken",
            "description": "A 1,024-qubit processor was announced.",
            "url": "https://example.com/qubits",
            "publishedAt": "2026-08-06T12:00:00Z",
            "content": "The processor..."
        }]
    }"#
}

// First run translates and publishes; second run reuses the cached query
// with the translation endpoint gone dark.
#[tokio::test]
async fn test_cached_query_survives_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_path = dir.path().join("query_cache.json");
    let topics = vec!["quantum computing breakthroughs".to_string()];

    // --- Run 1: cache is empty, the LLM plans the query ---
    {
        let mut server = mockito::Server::new_async().await;

        let translate = server
            .mock("POST", "/llm")
            .match_body(Matcher::Regex("search strategy expert".to_string()))
            .with_status(200)
            .with_body(llm_reply("quantum computing breakthrough research"))
            .create_async()
            .await;
        let synthesize = server
            .mock("POST", "/llm")
            .match_body(Matcher::Regex("news analyst".to_string()))
            .with_status(200)
            .with_body(llm_reply("**Qubit leap**\nA record was set. It matters."))
            .create_async()
            .await;
        let news = server
            .mock("GET", "/everything")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "quantum computing breakthrough research".into(),
            ))
            .with_status(200)
            .with_body(one_article_body())
            .create_async()
            .await;
        let github = server
            .mock("POST", "/repos/someone/news/issues")
            .with_status(201)
            .with_body(r#"{"number": 1, "html_url": "https://github.com/someone/news/issues/1"}"#)
            .create_async()
            .await;

        let mut pipeline = build_pipeline(&server.url(), &cache_path, NotifyTarget::NewIssue);
        let summary = pipeline.run(&topics).await;

        assert_eq!(summary.topics, 1);
        assert_eq!(summary.published, 1);
        assert_eq!(summary.failed, 0);

        translate.assert_async().await;
        synthesize.assert_async().await;
        news.assert_async().await;
        github.assert_async().await;
    }

    // --- Run 2: translation must come from the cache ---
    {
        let mut server = mockito::Server::new_async().await;

        let translate = server
            .mock("POST", "/llm")
            .match_body(Matcher::Regex("search strategy expert".to_string()))
            .expect(0)
            .create_async()
            .await;
        let synthesize = server
            .mock("POST", "/llm")
            .match_body(Matcher::Regex("news analyst".to_string()))
            .with_status(200)
            .with_body(llm_reply("**Qubit leap**\nStill a record. Still matters."))
            .create_async()
            .await;
        // The query handed to the news API is the one cached in run 1
        let news = server
            .mock("GET", "/everything")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "quantum computing breakthrough research".into(),
            ))
            .with_status(200)
            .with_body(one_article_body())
            .create_async()
            .await;
        let github = server
            .mock("POST", "/repos/someone/news/issues/7/comments")
            .with_status(201)
            .with_body(
                r#"{"id": 1, "html_url": "https://github.com/someone/news/issues/7#issuecomment-1"}"#,
            )
            .create_async()
            .await;

        let mut pipeline = build_pipeline(&server.url(), &cache_path, NotifyTarget::ExistingIssue(7));
        let summary = pipeline.run(&topics).await;

        assert_eq!(summary.published, 1);
        assert_eq!(summary.failed, 0);

        translate.assert_async().await;
        synthesize.assert_async().await;
        news.assert_async().await;
        github.assert_async().await;
    }
}

// One topic's news fetch blowing up must not stop the other topics.
#[tokio::test]
async fn test_topic_failures_are_isolated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_path = dir.path().join("query_cache.json");
    let mut server = mockito::Server::new_async().await;

    let _translate_alpha = server
        .mock("POST", "/llm")
        .match_body(Matcher::Regex("search strategy expert.*alpha subject".to_string()))
        .with_status(200)
        .with_body(llm_reply("alpha query"))
        .create_async()
        .await;
    let _translate_beta = server
        .mock("POST", "/llm")
        .match_body(Matcher::Regex("search strategy expert.*beta subject".to_string()))
        .with_status(200)
        .with_body(llm_reply("beta query"))
        .create_async()
        .await;
    let _news_alpha = server
        .mock("GET", "/everything")
        .match_query(Matcher::UrlEncoded("q".into(), "alpha query".into()))
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;
    let _news_beta = server
        .mock("GET", "/everything")
        .match_query(Matcher::UrlEncoded("q".into(), "beta query".into()))
        .with_status(200)
        .with_body(one_article_body())
        .create_async()
        .await;
    let _synthesize = server
        .mock("POST", "/llm")
        .match_body(Matcher::Regex("news analyst".to_string()))
        .with_status(200)
        .with_body(llm_reply("**Beta happened**\nTwice, in fact. Numbers inside."))
        .create_async()
        .await;
    let github = server
        .mock("POST", "/repos/someone/news/issues")
        .with_status(201)
        .with_body(r#"{"number": 2, "html_url": "https://github.com/someone/news/issues/2"}"#)
        .create_async()
        .await;

    let topics = vec!["alpha subject".to_string(), "beta subject".to_string()];
    let mut pipeline = build_pipeline(&server.url(), &cache_path, NotifyTarget::NewIssue);
    let summary = pipeline.run(&topics).await;

    assert_eq!(summary.topics, 2);
    assert_eq!(summary.published, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);

    // Only the beta report was published
    github.assert_async().await;
}

// Zero articles means no notification, not a failure.
#[tokio::test]
async fn test_empty_search_skips_notification() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_path = dir.path().join("query_cache.json");
    let mut server = mockito::Server::new_async().await;

    let _translate = server
        .mock("POST", "/llm")
        .match_body(Matcher::Regex("search strategy expert".to_string()))
        .with_status(200)
        .with_body(llm_reply("quiet query"))
        .create_async()
        .await;
    let _news = server
        .mock("GET", "/everything")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status": "ok", "totalResults": 0, "articles": []}"#)
        .create_async()
        .await;
    let github = server
        .mock("POST", "/repos/someone/news/issues")
        .expect(0)
        .create_async()
        .await;

    let topics = vec!["a very quiet subject".to_string()];
    let mut pipeline = build_pipeline(&server.url(), &cache_path, NotifyTarget::NewIssue);
    let summary = pipeline.run(&topics).await;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.published, 0);

    github.assert_async().await;
}
