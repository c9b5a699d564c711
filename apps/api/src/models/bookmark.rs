use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One local-mirror bookmark with its tags joined in, as served to the
/// dashboard listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookmarkListing {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub main_tag: Option<String>,
    pub tags: Vec<String>,
    pub summarized_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-main-tag bookmark count for the topic widget.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TopicCount {
    pub name: String,
    pub count: i64,
}

/// Minimal reading-history row fed into the insights prompt.
#[derive(Debug, Clone, FromRow)]
pub struct ReadingHistoryRow {
    pub title: String,
    pub main_tag: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}
