//! Sync importer: mirrors the Notion bookmark listing into the local
//! relational store.
//!
//! Monotonic append-only with duplicate suppression, not upsert: a
//! (url, title) pair that has been mirrored once is frozen, and upstream
//! edits to it do not propagate. The per-record loop is sequential; one
//! record's tag upserts complete before the next record starts. Concurrent
//! sync runs are not defended against — the caller schedules one at a time.

use std::collections::HashSet;

use axum::{extract::State, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::notion::{NotionClient, SourceRecord};
use crate::state::AppState;

/// Category assigned when a record's main tag matches no known category.
const FALLBACK_MAIN_TAG: &str = "Miscellaneous";
/// Mirrored bookmarks default to the article type.
const DEFAULT_BOOKMARK_TYPE: &str = "article";

#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub new_count: u32,
    pub skipped_count: u32,
    pub total_processed: u32,
}

/// POST /api/v1/sync
pub async fn handle_sync(State(state): State<AppState>) -> Result<Json<SyncReport>, AppError> {
    let report = sync(&state.db, &state.notion, &state.config.notion_database_id).await?;
    Ok(Json(report))
}

/// Local (url, title) pairs already mirrored. A match on EITHER field
/// suppresses import: a title match alone is enough to skip, so
/// near-duplicates survive upstream URL normalization changes.
#[derive(Debug, Default)]
pub struct ExistingPairs {
    urls: HashSet<String>,
    titles: HashSet<String>,
}

impl ExistingPairs {
    pub fn contains(&self, url: &str, title: &str) -> bool {
        self.urls.contains(url) || self.titles.contains(title)
    }

    pub fn insert(&mut self, url: &str, title: &str) {
        self.urls.insert(url.to_string());
        self.titles.insert(title.to_string());
    }
}

/// Runs one sync pass against the destination store.
pub async fn sync(
    pool: &PgPool,
    notion: &NotionClient,
    database_id: &str,
) -> Result<SyncReport, AppError> {
    let mut existing = load_existing_pairs(pool).await?;

    let categories = notion.main_tag_vocabulary(database_id).await;
    upsert_main_tags(pool, &categories).await?;

    let records = notion.query_bookmarks(database_id).await?;

    let mut report = SyncReport::default();
    for record in records {
        report.total_processed += 1;

        if existing.contains(&record.url, &record.title) {
            report.skipped_count += 1;
            continue;
        }

        match import_record(pool, &record).await {
            Ok(()) => {
                existing.insert(&record.url, &record.title);
                report.new_count += 1;
            }
            Err(e) => {
                warn!("Skipping record '{}': {e}", record.title);
                report.skipped_count += 1;
            }
        }
    }

    info!(
        "Sync complete: {} new, {} skipped, {} processed",
        report.new_count, report.skipped_count, report.total_processed
    );
    Ok(report)
}

async fn load_existing_pairs(pool: &PgPool) -> Result<ExistingPairs, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT url, title FROM bookmarks")
        .fetch_all(pool)
        .await?;

    let mut pairs = ExistingPairs::default();
    for (url, title) in &rows {
        pairs.insert(url, title);
    }
    Ok(pairs)
}

/// Idempotent upsert keyed on name. The fallback category is always ensured.
async fn upsert_main_tags(pool: &PgPool, names: &[String]) -> Result<(), sqlx::Error> {
    for name in names
        .iter()
        .map(String::as_str)
        .chain([FALLBACK_MAIN_TAG])
    {
        sqlx::query("INSERT INTO main_tags (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(Uuid::new_v4())
            .bind(name)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Inserts one source record plus its tag associations. A failure here is
/// logged and skipped by the caller, never fatal to the run.
async fn import_record(pool: &PgPool, record: &SourceRecord) -> Result<(), sqlx::Error> {
    let main_tag_id = resolve_main_tag(pool, record.main_tag.as_deref()).await?;
    let bookmark_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO bookmarks (id, title, url, main_tag_id, type, summarized_text, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(bookmark_id)
    .bind(&record.title)
    .bind(&record.url)
    .bind(main_tag_id)
    .bind(DEFAULT_BOOKMARK_TYPE)
    .bind(&record.summary)
    .bind(parse_created(&record.created))
    .execute(pool)
    .await?;

    for tag in &record.tags {
        let tag_id = upsert_tag(pool, tag).await?;
        sqlx::query(
            "INSERT INTO bookmark_tags (bookmark_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(bookmark_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Maps a source main-tag name to a local id, falling back to the
/// Miscellaneous category when unresolved.
async fn resolve_main_tag(pool: &PgPool, name: Option<&str>) -> Result<Uuid, sqlx::Error> {
    if let Some(name) = name {
        let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM main_tags WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if let Some((id,)) = found {
            return Ok(id);
        }
    }

    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM main_tags WHERE name = $1")
        .bind(FALLBACK_MAIN_TAG)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// Upserts a free tag by name and returns its id.
async fn upsert_tag(pool: &PgPool, name: &str) -> Result<Uuid, sqlx::Error> {
    sqlx::query("INSERT INTO tags (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
        .bind(Uuid::new_v4())
        .bind(name)
        .execute(pool)
        .await?;

    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM tags WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// Source timestamps arrive as RFC 3339 or a bare date; anything else
/// falls back to the sync time.
fn parse_created(raw: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return DateTime::from_naive_utc_and_offset(ndt, Utc);
        }
    }
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn pairs_fixture() -> ExistingPairs {
        let mut pairs = ExistingPairs::default();
        pairs.insert("https://example.com/a", "Post A");
        pairs.insert("https://example.com/b", "Post B");
        pairs
    }

    #[test]
    fn test_url_match_alone_is_a_duplicate() {
        let pairs = pairs_fixture();
        assert!(pairs.contains("https://example.com/a", "Renamed Post"));
    }

    #[test]
    fn test_title_match_alone_is_a_duplicate() {
        let pairs = pairs_fixture();
        assert!(pairs.contains("https://example.com/a?utm_source=feed", "Post A"));
    }

    #[test]
    fn test_unseen_pair_is_not_a_duplicate() {
        let pairs = pairs_fixture();
        assert!(!pairs.contains("https://example.com/c", "Post C"));
    }

    #[test]
    fn test_parse_created_rfc3339() {
        let dt = parse_created("2024-02-02T12:00:00.000Z");
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 2, 2));
    }

    #[test]
    fn test_parse_created_bare_date() {
        let dt = parse_created("2023-11-05");
        assert_eq!((dt.year(), dt.month(), dt.day()), (2023, 11, 5));
    }

    #[test]
    fn test_parse_created_garbage_falls_back_to_now() {
        let dt = parse_created("not a date");
        assert!(dt.year() >= 2024);
    }
}
