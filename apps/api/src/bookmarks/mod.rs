//! Local-mirror reads backing the dashboard: the bookmark listing and
//! lightweight analytics (counts, topic frequency).

use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::bookmark::{BookmarkListing, TopicCount};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_bookmarks: i64,
    pub unique_tags: i64,
    pub topics: Vec<TopicCount>,
}

/// GET /api/v1/bookmarks
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<BookmarkListing>>, AppError> {
    Ok(Json(list_bookmarks(&state.db).await?))
}

/// GET /api/v1/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    Ok(Json(stats(&state.db).await?))
}

/// All mirrored bookmarks with tags and main tag joined in, newest first.
pub async fn list_bookmarks(pool: &PgPool) -> Result<Vec<BookmarkListing>, sqlx::Error> {
    sqlx::query_as::<_, BookmarkListing>(
        r#"
        SELECT b.id, b.title, b.url, b.summarized_text, b.created_at,
               mt.name AS main_tag,
               COALESCE(array_agg(t.name) FILTER (WHERE t.name IS NOT NULL), '{}') AS tags
        FROM bookmarks b
        LEFT JOIN main_tags mt ON mt.id = b.main_tag_id
        LEFT JOIN bookmark_tags bt ON bt.bookmark_id = b.id
        LEFT JOIN tags t ON t.id = bt.tag_id
        GROUP BY b.id, mt.name
        ORDER BY b.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn stats(pool: &PgPool) -> Result<StatsResponse, sqlx::Error> {
    let (total_bookmarks,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookmarks")
        .fetch_one(pool)
        .await?;

    let (unique_tags,): (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT tag_id) FROM bookmark_tags")
        .fetch_one(pool)
        .await?;

    let topics = sqlx::query_as::<_, TopicCount>(
        r#"
        SELECT mt.name, COUNT(*) AS count
        FROM bookmarks b
        JOIN main_tags mt ON mt.id = b.main_tag_id
        GROUP BY mt.name
        ORDER BY count DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(StatsResponse {
        total_bookmarks,
        unique_tags,
        topics,
    })
}
