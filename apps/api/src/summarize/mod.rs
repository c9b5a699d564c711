//! LLM summarization with a degrade-gracefully fallback.
//!
//! A malformed or unavailable LLM must never block the save pipeline: any
//! HTTP, API, or parse failure yields a raw-text excerpt and no tags.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::extract::ExtractedContent;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;

pub mod prompts;

use prompts::{SUMMARIZE_PROMPT_TEMPLATE, SUMMARIZE_SYSTEM_ROLE};

/// Max characters of cleaned page text included in the prompt.
const PROMPT_TEXT_CHARS: usize = 4000;
/// Max characters of raw text used for the fallback summary.
const FALLBACK_EXCERPT_CHARS: usize = 2000;
const MAX_TAGS: usize = 5;
const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.3;

/// Structured summarizer output: a markdown summary and up to 5 tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    #[serde(rename = "SummarizedText")]
    pub summarized_text: String,
    #[serde(rename = "suggestedTags", default)]
    pub suggested_tags: Vec<String>,
}

/// Summarizes extracted content against the current tag vocabulary.
/// Suggested tags are capped at 5 but NOT filtered against the vocabulary;
/// the prompt only asks the model to prefer it.
pub async fn summarize(
    content: &ExtractedContent,
    vocabulary: &[String],
    llm: &LlmClient,
) -> SummaryResult {
    let prompt = build_prompt(content, vocabulary);
    let system = format!("{SUMMARIZE_SYSTEM_ROLE} {JSON_ONLY_SYSTEM}");

    match llm
        .call_json::<SummaryResult>(&prompt, &system, MAX_TOKENS, TEMPERATURE)
        .await
    {
        Ok(mut result) => {
            if result.summarized_text.trim().is_empty() {
                warn!("LLM returned an empty summary, falling back to raw excerpt");
                return fallback_summary(content);
            }
            result.suggested_tags.truncate(MAX_TAGS);
            result
        }
        Err(e) => {
            warn!("Summarization failed, falling back to raw excerpt: {e}");
            fallback_summary(content)
        }
    }
}

/// Deterministic placeholder used when the LLM call or its response parsing
/// fails: the first ~2000 characters of the cleaned text, no tags.
pub fn fallback_summary(content: &ExtractedContent) -> SummaryResult {
    SummaryResult {
        summarized_text: truncate_chars(&content.text, FALLBACK_EXCERPT_CHARS).to_string(),
        suggested_tags: Vec::new(),
    }
}

fn build_prompt(content: &ExtractedContent, vocabulary: &[String]) -> String {
    SUMMARIZE_PROMPT_TEMPLATE
        .replace("{existing_tags}", &vocabulary.join(", "))
        .replace("{title}", &content.title)
        .replace("{url}", &content.url)
        .replace("{text}", truncate_chars(&content.text, PROMPT_TEXT_CHARS))
}

/// Char-boundary-safe prefix, so multibyte text never splits mid-character.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_fixture(text: &str) -> ExtractedContent {
        ExtractedContent {
            text: text.to_string(),
            word_count: text.split_whitespace().count(),
            title: "Understanding Async Rust".to_string(),
            url: "https://blog.example.com/posts/async-rust".to_string(),
            domain: "blog.example.com".to_string(),
            description: None,
            author: None,
            published_date: None,
        }
    }

    #[test]
    fn test_summary_result_parses_model_response() {
        let json = r###"{"SummarizedText":"## X\n\nY","suggestedTags":["go","new-tag"]}"###;
        let result: SummaryResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.summarized_text, "## X\n\nY");
        // Tags outside the supplied vocabulary are kept as-is.
        assert_eq!(result.suggested_tags, vec!["go", "new-tag"]);
    }

    #[test]
    fn test_summary_result_missing_tags_defaults_empty() {
        let json = r#"{"SummarizedText":"summary"}"#;
        let result: SummaryResult = serde_json::from_str(json).unwrap();
        assert!(result.suggested_tags.is_empty());
    }

    #[test]
    fn test_fallback_summary_derived_from_content() {
        let content = content_fixture("The quick brown fox jumps over the lazy dog.");
        let result = fallback_summary(&content);
        assert!(result.suggested_tags.is_empty());
        assert_eq!(
            result.summarized_text,
            "The quick brown fox jumps over the lazy dog."
        );
    }

    #[test]
    fn test_fallback_summary_truncates_long_content() {
        let content = content_fixture(&"word ".repeat(1000));
        let result = fallback_summary(&content);
        assert!(!result.summarized_text.is_empty());
        assert_eq!(result.summarized_text.chars().count(), 2000);
    }

    #[test]
    fn test_truncate_chars_is_char_boundary_safe() {
        let text = "é".repeat(3000);
        let truncated = truncate_chars(&text, 2000);
        assert_eq!(truncated.chars().count(), 2000);
    }

    #[test]
    fn test_build_prompt_substitutes_placeholders() {
        let content = content_fixture("Body text here.");
        let vocabulary = vec!["rust".to_string(), "async".to_string()];
        let prompt = build_prompt(&content, &vocabulary);
        assert!(prompt.contains("[rust, async]"));
        assert!(prompt.contains("Title: Understanding Async Rust"));
        assert!(prompt.contains("URL: https://blog.example.com/posts/async-rust"));
        assert!(prompt.contains("Text: Body text here."));
    }

    #[test]
    fn test_build_prompt_truncates_page_text() {
        let content = content_fixture(&"a".repeat(10_000));
        let prompt = build_prompt(&content, &[]);
        assert!(prompt.len() < 10_000);
    }
}
