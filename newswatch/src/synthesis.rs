//! Turns a pile of fetched articles into a headline digest via the LLM,
//! degrading to a locally built list when the LLM is unavailable.

use tracing::{info, warn};

use crate::llm::{LlmProvider, LlmRequest};
use crate::news::Article;

/// Articles beyond this many are left out of the prompt to bound context.
const MAX_PROMPT_ARTICLES: usize = 25;

/// Synthesize a digest for `topic`. Never fails: LLM trouble produces a
/// plain headline list instead (a degraded report beats no report).
pub async fn synthesize_report(
    provider: &dyn LlmProvider,
    topic: &str,
    articles: &[Article],
    max_headlines: usize,
) -> String {
    if articles.is_empty() {
        return "No recent news articles found for your query.".to_string();
    }

    let request = LlmRequest {
        prompt: synthesis_prompt(topic, articles, max_headlines),
        max_tokens: Some(2000),
        temperature: Some(0.3),
        timeout_seconds: Some(60),
    };

    match provider.generate(request).await {
        Ok(response) => {
            info!(
                topic,
                articles = articles.len(),
                tokens = response.usage.total_tokens,
                "synthesis complete"
            );
            response.content.trim().to_string()
        }
        Err(e) => {
            warn!(topic, %e, "synthesis failed, falling back to headline digest");
            headline_digest(articles, max_headlines)
        }
    }
}

fn synthesis_prompt(topic: &str, articles: &[Article], max_headlines: usize) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are a news analyst. Synthesize the provided articles into a clean summary.\n\n",
    );
    prompt.push_str(&format!(
        "Requirements:\n\
         - Return the top {} most important/relevant headlines\n\
         - For each headline, provide exactly 2 sentences of summary\n\
         - Include specific numbers, percentages, dollar amounts when mentioned\n\
         - Focus on the most newsworthy and recent information\n",
        max_headlines
    ));
    prompt.push_str(
        "- Use this format:\n\n\
         **[Headline]**\n\
         [2-sentence summary with numbers if available]\n\n\
         Do not include any other text, explanations, or meta-commentary.\n\n",
    );
    prompt.push_str(&format!("Original request: \"{}\"\n\n", topic));
    prompt.push_str("Here are the news articles to synthesize:\n");

    for (i, article) in articles.iter().take(MAX_PROMPT_ARTICLES).enumerate() {
        prompt.push_str(&format!("\nArticle {}:\n", i + 1));
        prompt.push_str(&format!("Headline: {}\n", article.title));
        if let Some(description) = &article.description {
            prompt.push_str(&format!("Description: {}\n", description));
        }
        prompt.push_str(&format!("Source: {}\n", article.source));
        if let Some(published) = article.published_at {
            prompt.push_str(&format!("Published: {}\n", published.to_rfc3339()));
        }
        if let Some(content) = &article.content {
            let preview: String = content.chars().take(200).collect();
            prompt.push_str(&format!("Content Preview: {}\n", preview));
        }
    }

    prompt.push_str(&format!(
        "\nPlease provide the top {} headlines with summaries as specified.",
        max_headlines
    ));
    prompt
}

/// Fallback digest built purely from article metadata.
fn headline_digest(articles: &[Article], max_headlines: usize) -> String {
    let mut digest = String::new();
    for article in articles.iter().take(max_headlines) {
        digest.push_str(&format!("**{}**\n", article.title));
        if let Some(description) = &article.description {
            digest.push_str(description);
            digest.push('\n');
        }
        match article.published_at {
            Some(published) => digest.push_str(&format!(
                "_{} — {}_\n\n",
                article.source,
                published.format("%Y-%m-%d")
            )),
            None => digest.push_str(&format!("_{}_\n\n", article.source)),
        }
    }
    digest.trim_end().to_string()
}
