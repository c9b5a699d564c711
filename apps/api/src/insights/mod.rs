//! Learning insights: an LLM-written profile of the mirror's reading
//! history. Unlike the summarizer, an LLM failure here is surfaced; the
//! narrative IS the endpoint's output, there is nothing to degrade to.

use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::bookmark::ReadingHistoryRow;
use crate::state::AppState;

pub mod prompts;

use prompts::{INSIGHTS_PROMPT_TEMPLATE, INSIGHTS_SYSTEM};

const MAX_TOKENS: u32 = 500;
/// Higher temperature than the summarizer: this is narrative, not extraction.
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: String,
    pub bookmark_count: usize,
}

/// GET /api/v1/insights
pub async fn handle_insights(
    State(state): State<AppState>,
) -> Result<Json<InsightsResponse>, AppError> {
    let history = reading_history(&state.db).await?;
    if history.is_empty() {
        return Err(AppError::NotFound("No bookmarks to analyze yet".to_string()));
    }

    let prompt = build_prompt(&history);
    let response = state
        .llm
        .call(&prompt, INSIGHTS_SYSTEM, MAX_TOKENS, TEMPERATURE)
        .await
        .map_err(|e| AppError::Llm(format!("Insights generation failed: {e}")))?;

    let insights = response
        .text()
        .ok_or_else(|| AppError::Llm("LLM returned empty content".to_string()))?
        .trim()
        .to_string();

    Ok(Json(InsightsResponse {
        insights,
        bookmark_count: history.len(),
    }))
}

/// Reading history oldest-first, so the narrative can see the arc.
async fn reading_history(pool: &PgPool) -> Result<Vec<ReadingHistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, ReadingHistoryRow>(
        r#"
        SELECT b.title, b.created_at,
               mt.name AS main_tag,
               COALESCE(array_agg(t.name) FILTER (WHERE t.name IS NOT NULL), '{}') AS tags
        FROM bookmarks b
        LEFT JOIN main_tags mt ON mt.id = b.main_tag_id
        LEFT JOIN bookmark_tags bt ON bt.bookmark_id = b.id
        LEFT JOIN tags t ON t.id = bt.tag_id
        GROUP BY b.id, mt.name
        ORDER BY b.created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

fn build_prompt(history: &[ReadingHistoryRow]) -> String {
    let lines: Vec<String> = history
        .iter()
        .map(|row| {
            let mut tags = row.tags.clone();
            if let Some(main) = &row.main_tag {
                tags.push(main.clone());
            }
            format!(
                "- \"{}\" ({}) [{}]",
                row.title,
                row.created_at.format("%Y-%m-%d"),
                tags.join(", ")
            )
        })
        .collect();

    INSIGHTS_PROMPT_TEMPLATE.replace("{reading_data}", &lines.join("\n"))
}
