//! Save pipeline.
//!
//! Flow per save action: extract → tag vocabulary → summarize → to_blocks →
//! create page. Enrichment failures (vocabulary, summary
//! quality) degrade silently inside their modules; extraction and the final
//! write are the two mandatory steps and surface as errors.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::errors::AppError;
use crate::extract::{extract, ExtractionRules};
use crate::llm_client::LlmClient;
use crate::notion::blocks::to_blocks;
use crate::notion::NotionClient;
use crate::state::AppState;
use crate::summarize::summarize;

/// Body sent by the browser extension: the tab's raw HTML and location.
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub html: String,
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub page_id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub word_count: usize,
}

/// POST /api/v1/save
pub async fn handle_save(
    State(state): State<AppState>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, AppError> {
    let response = save_bookmark(
        &state.llm,
        &state.notion,
        &state.config.notion_database_id,
        req,
    )
    .await?;
    Ok(Json(response))
}

/// Runs the full save pipeline once. Repeating a save creates a duplicate
/// page; deduplication happens later in the sync importer.
pub async fn save_bookmark(
    llm: &LlmClient,
    notion: &NotionClient,
    database_id: &str,
    req: SaveRequest,
) -> Result<SaveResponse, AppError> {
    let url = Url::parse(&req.url)
        .map_err(|e| AppError::Validation(format!("Invalid URL '{}': {e}", req.url)))?;

    let content = extract(&req.html, &url, &ExtractionRules::default())
        .map_err(|e| AppError::NoContent(e.to_string()))?;

    // The tab title sent by the extension wins over whatever <title>
    // parsing found; it is what the user saw when saving.
    let title = choose_title(req.title, &content.title);

    let vocabulary = notion.tag_vocabulary(database_id).await;
    let summary = summarize(&content, &vocabulary, llm).await;
    let content_blocks = to_blocks(&summary.summarized_text);

    let page_id = notion
        .create_record(
            database_id,
            &title,
            &content.url,
            &summary.suggested_tags,
            &content_blocks,
        )
        .await?;

    info!(
        "Saved '{title}' to Notion: {} words, {} tags, {} blocks",
        content.word_count,
        summary.suggested_tags.len(),
        content_blocks.len()
    );

    Ok(SaveResponse {
        page_id,
        title,
        tags: summary.suggested_tags,
        word_count: content.word_count,
    })
}

fn choose_title(requested: Option<String>, extracted: &str) -> String {
    requested
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| extracted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_title_prefers_request_title() {
        let title = choose_title(Some("Tab Title".to_string()), "Parsed Title");
        assert_eq!(title, "Tab Title");
    }

    #[test]
    fn test_choose_title_falls_back_to_extracted() {
        assert_eq!(choose_title(None, "Parsed Title"), "Parsed Title");
        assert_eq!(
            choose_title(Some("   ".to_string()), "Parsed Title"),
            "Parsed Title"
        );
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_url() {
        let llm = LlmClient::new("test-key".to_string());
        let notion = NotionClient::new("test-key".to_string());
        let req = SaveRequest {
            html: "<html><body><p>text</p></body></html>".to_string(),
            url: "not a url".to_string(),
            title: None,
        };
        let err = save_bookmark(&llm, &notion, "db", req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_save_fails_on_empty_page() {
        let llm = LlmClient::new("test-key".to_string());
        let notion = NotionClient::new("test-key".to_string());
        let req = SaveRequest {
            html: "<html><body></body></html>".to_string(),
            url: "https://example.com".to_string(),
            title: None,
        };
        let err = save_bookmark(&llm, &notion, "db", req).await.unwrap_err();
        assert!(matches!(err, AppError::NoContent(_)));
    }
}
