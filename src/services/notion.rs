//! Notion API client for the watchlist database
//!
//! The database is expected to have at least these properties:
//! - `Title` (title) display title, filled in by the sync
//! - `Link` (url) the IMDb page for the item, entered by the user
//! - `Poster` (url) poster image, filled in by the sync
//! - `Genres` (rich text) comma separated genres, filled in by the sync

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::http_client::{build_client, transport_status};
use super::traits::WatchlistStore;
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::models::{ExternalMetadata, GENRE_SEPARATOR, UpdateConfirmation, WatchlistRecord};

/// One page of a database query
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<NotionPage>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub properties: WatchlistProperties,
}

/// The database properties this tool reads. Other columns are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct WatchlistProperties {
    #[serde(rename = "Link")]
    pub link: Option<UrlProperty>,
    #[serde(rename = "Title")]
    pub title: Option<TitleProperty>,
    #[serde(rename = "Poster")]
    pub poster: Option<UrlProperty>,
    #[serde(rename = "Genres")]
    pub genres: Option<RichTextProperty>,
}

#[derive(Debug, Deserialize)]
pub struct UrlProperty {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TitleProperty {
    #[serde(default)]
    pub title: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
pub struct RichTextProperty {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

fn plain_text(parts: &[RichText]) -> String {
    parts.iter().map(|p| p.plain_text.as_str()).collect()
}

impl From<NotionPage> for WatchlistRecord {
    fn from(page: NotionPage) -> Self {
        let props = page.properties;
        let url_of = |p: Option<UrlProperty>| p.and_then(|u| u.url).unwrap_or_default();

        let genres = props
            .genres
            .map(|g| plain_text(&g.rich_text))
            .map(|text| {
                text.split(GENRE_SEPARATOR)
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Self {
            id: page.id,
            reference_url: url_of(props.link),
            title: props.title.map(|t| plain_text(&t.title)).unwrap_or_default(),
            poster_url: url_of(props.poster),
            genres,
        }
    }
}

/// Filter for records with an empty title or an empty poster
pub fn pending_filter() -> Value {
    json!({
        "filter": {
            "or": [
                {"property": "Title", "title": {"is_empty": true}},
                {"property": "Poster", "url": {"is_empty": true}},
            ]
        }
    })
}

/// Filter for records whose Link contains `link`
pub fn link_filter(link: &str) -> Value {
    json!({
        "filter": {
            "or": [
                {"property": "Link", "url": {"contains": link}},
            ]
        }
    })
}

/// Page update writing every scraped field, plus the poster as the page cover
pub fn update_body(metadata: &ExternalMetadata) -> Value {
    json!({
        "properties": {
            "Poster": {"url": metadata.poster_url},
            "Title": {"title": [{"text": {"content": metadata.title}}]},
            "Genres": {"rich_text": [{"text": {"content": metadata.genres_text()}}]},
        },
        "cover": {"type": "external", "external": {"url": metadata.poster_url}},
    })
}

pub fn parse_query_response(body: &str) -> Result<QueryResponse> {
    serde_json::from_str(body).map_err(|e| SyncError::StoreQuery {
        status: 200,
        body: format!("unexpected query response: {}", e),
    })
}

/// Notion API client bound to one database
pub struct NotionClient {
    client: Client,
    api_url: String,
    database_id: String,
}

impl NotionClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("Bearer {}", config.notion.token))
            .map_err(|_| SyncError::Configuration("NOTION_API_KEY is not a valid header value".into()))?;
        headers.insert(header::AUTHORIZATION, auth);
        let version = header::HeaderValue::from_str(&config.notion.version)
            .map_err(|_| SyncError::Configuration("NOTION_VERSION is not a valid header value".into()))?;
        headers.insert(header::HeaderName::from_static("notion-version"), version);

        Ok(Self::with_client(
            build_client(&config.http, headers)?,
            config.notion.api_url.clone(),
            config.notion.database_id.clone(),
        ))
    }

    pub fn with_client(
        client: Client,
        api_url: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            database_id: database_id.into(),
        }
    }

    /// Records whose Link contains `link`
    pub async fn find_by_link(&self, link: &str) -> Result<Vec<WatchlistRecord>> {
        info!(link = %link, "Searching watchlist by link");
        self.query_all(link_filter(link)).await
    }

    /// Run a database query, following pagination cursors until exhausted
    async fn query_all(&self, filter: Value) -> Result<Vec<WatchlistRecord>> {
        let url = format!("{}/databases/{}/query", self.api_url, self.database_id);
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = filter.clone();
            if let Some(ref next) = cursor {
                body["start_cursor"] = json!(next);
            }

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| SyncError::StoreQuery {
                    status: transport_status(&e),
                    body: e.to_string(),
                })?;

            let status = response.status();
            let text = response.text().await.map_err(|e| SyncError::StoreQuery {
                status: status.as_u16(),
                body: e.to_string(),
            })?;

            if !status.is_success() {
                return Err(SyncError::StoreQuery {
                    status: status.as_u16(),
                    body: text,
                });
            }

            let page = parse_query_response(&text)?;
            debug!(
                count = page.results.len(),
                has_more = page.has_more,
                "Watchlist query page"
            );
            records.extend(page.results.into_iter().map(WatchlistRecord::from));

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl WatchlistStore for NotionClient {
    async fn select_pending(&self) -> Result<Vec<WatchlistRecord>> {
        let records = self.query_all(pending_filter()).await?;
        info!(count = records.len(), "Queried watchlist for records missing a title or poster");
        Ok(records)
    }

    async fn apply(
        &self,
        record_id: &str,
        metadata: &ExternalMetadata,
    ) -> Result<UpdateConfirmation> {
        let url = format!("{}/pages/{}", self.api_url, record_id);
        let write_error = |status: u16, body: String| SyncError::StoreWrite {
            record_id: record_id.to_string(),
            status,
            body,
        };

        let response = self
            .client
            .patch(&url)
            .json(&update_body(metadata))
            .send()
            .await
            .map_err(|e| write_error(transport_status(&e), e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| write_error(status.as_u16(), e.to_string()))?;
        debug!(record_id = %record_id, status = status.as_u16(), body = %text, "Page update response");

        if !status.is_success() {
            return Err(write_error(status.as_u16(), text));
        }

        Ok(UpdateConfirmation {
            record_id: record_id.to_string(),
            title: metadata.title.clone(),
        })
    }
}
