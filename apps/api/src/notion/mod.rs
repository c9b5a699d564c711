/// Notion Client — the single point of entry for all destination-store calls.
///
/// Three call shapes: database-schema reads (tag vocabularies), the paged
/// record query consumed by sync, and page creation for new bookmarks.
/// Property shapes follow the 2022-06-28 API version.
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub mod blocks;

use blocks::Block;

const NOTION_API_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
/// Free-text marker distinguishing bookmark records in the shared database.
pub const BOOKMARK_TYPE_MARKER: &str = "Bookmarks";
const QUERY_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notion API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct NotionApiError {
    message: Option<String>,
}

/// A bookmark record as listed by the destination store. Input to sync.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub title: String,
    pub url: String,
    pub tags: Vec<String>,
    pub main_tag: Option<String>,
    pub created: String,
    pub summary: Option<String>,
}

/// The single Notion client shared by all services, cloned into `AppState`.
#[derive(Clone)]
pub struct NotionClient {
    client: Client,
    api_key: String,
}

impl NotionClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Current tag vocabulary on the database's "Tags" multi-select property.
    ///
    /// Never fails the caller: an empty vocabulary only degrades tag
    /// suggestions, not the save itself. Retrieval and shape errors are
    /// logged and swallowed.
    pub async fn tag_vocabulary(&self, database_id: &str) -> Vec<String> {
        match self.fetch_database(database_id).await {
            Ok(schema) => select_option_names(&schema, "Tags", "multi_select"),
            Err(e) => {
                warn!("Failed to fetch tag vocabulary: {e}");
                Vec::new()
            }
        }
    }

    /// Main-tag category names from the database's "MainTag" select property.
    /// Same never-fail policy as `tag_vocabulary`: an empty list just routes
    /// everything to the fallback category.
    pub async fn main_tag_vocabulary(&self, database_id: &str) -> Vec<String> {
        match self.fetch_database(database_id).await {
            Ok(schema) => select_option_names(&schema, "MainTag", "select"),
            Err(e) => {
                warn!("Failed to fetch main tag vocabulary: {e}");
                Vec::new()
            }
        }
    }

    async fn fetch_database(&self, database_id: &str) -> Result<Value, NotionError> {
        let response = self
            .client
            .get(format!("{NOTION_API_URL}/databases/{database_id}"))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await?;
        read_json(response).await
    }

    /// All records flagged as bookmarks, via the database query endpoint.
    pub async fn query_bookmarks(
        &self,
        database_id: &str,
    ) -> Result<Vec<SourceRecord>, NotionError> {
        let body = json!({
            "page_size": QUERY_PAGE_SIZE,
            "filter": {
                "property": "Type",
                "rich_text": { "equals": BOOKMARK_TYPE_MARKER }
            }
        });

        let response = self
            .client
            .post(format!("{NOTION_API_URL}/databases/{database_id}/query"))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?;

        let data = read_json(response).await?;
        let records: Vec<SourceRecord> = data["results"]
            .as_array()
            .map(|results| results.iter().map(parse_source_record).collect())
            .unwrap_or_default();

        debug!("Notion query returned {} bookmark records", records.len());
        Ok(records)
    }

    /// Creates exactly one new page in the database. NOT idempotent: repeated
    /// calls with identical inputs create duplicates — duplicate suppression
    /// is the sync importer's job, not the writer's.
    pub async fn create_record(
        &self,
        database_id: &str,
        title: &str,
        url: &str,
        tags: &[String],
        content_blocks: &[Block],
    ) -> Result<String, NotionError> {
        let payload = page_payload(database_id, title, url, tags, content_blocks, Utc::now());

        let response = self
            .client
            .post(format!("{NOTION_API_URL}/pages"))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&payload)
            .send()
            .await?;

        let created = read_json(response).await?;
        let page_id = created["id"].as_str().unwrap_or_default().to_string();
        debug!("Created Notion page {page_id}");
        Ok(page_id)
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, NotionError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<NotionApiError>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or(body);
        return Err(NotionError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

/// Option names of a select-flavored property, or empty when the schema
/// does not carry the expected shape.
fn select_option_names(schema: &Value, property: &str, kind: &str) -> Vec<String> {
    schema["properties"][property][kind]["options"]
        .as_array()
        .map(|options| {
            options
                .iter()
                .filter_map(|o| o["name"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// One listed page → SourceRecord. Missing property shapes degrade to
/// empty/absent fields; `created` falls back to the page's created_time.
fn parse_source_record(page: &Value) -> SourceRecord {
    let props = &page["properties"];
    SourceRecord {
        title: props["Name"]["title"][0]["plain_text"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        url: props["URL"]["url"].as_str().unwrap_or("").to_string(),
        tags: props["Tags"]["multi_select"]
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t["name"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default(),
        main_tag: props["MainTag"]["select"]["name"].as_str().map(String::from),
        created: props["Created"]["date"]["start"]
            .as_str()
            .or_else(|| page["created_time"].as_str())
            .unwrap_or("")
            .to_string(),
        summary: props["SummarizedText"]["rich_text"][0]["plain_text"]
            .as_str()
            .map(String::from),
    }
}

/// Page-creation payload: title, url, multi-select tags, creation date, the
/// bookmark type marker, and the block tree as children.
fn page_payload(
    database_id: &str,
    title: &str,
    url: &str,
    tags: &[String],
    content_blocks: &[Block],
    created: DateTime<Utc>,
) -> Value {
    let title = if title.trim().is_empty() {
        "Untitled"
    } else {
        title
    };

    json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Name": {
                "title": [ { "text": { "content": title } } ]
            },
            "URL": { "url": url },
            "Tags": {
                "multi_select": tags.iter().map(|t| json!({ "name": t })).collect::<Vec<_>>()
            },
            "Created": {
                "date": { "start": created.to_rfc3339() }
            },
            "Type": {
                "rich_text": [ { "text": { "content": BOOKMARK_TYPE_MARKER } } ]
            }
        },
        "children": content_blocks.iter().map(Block::to_notion_json).collect::<Vec<_>>()
    })
}
