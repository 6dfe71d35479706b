//! IMDb title page scraper
//!
//! Turns a reference URL into [`ExternalMetadata`] by fetching the canonical
//! title page and reading three markup conventions from it:
//! - the first `<h1>` holds the display title
//! - `<meta property="og:image">` holds the poster URL
//! - `span.ipc-chip__text` elements hold the genre chips
//!
//! The page reuses the chip style for its "Back to top" link, so chips
//! containing that phrase are dropped. A title page with no genres left after
//! that is treated as a parse failure.

use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, header};
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use super::http_client::{build_client, transport_status};
use super::traits::MetadataSource;
use crate::config::HttpConfig;
use crate::error::{Field, Result, SyncError};
use crate::models::ExternalMetadata;

/// Chip text that is page chrome rather than a genre
const NOISE_LABEL: &str = "Back to top";

static TITLE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d+").expect("valid title id pattern"));

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static POSTER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).expect("valid selector"));
static GENRE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.ipc-chip__text").expect("valid selector"));

/// Find the embedded title id (`tt` followed by digits) in a reference URL
pub fn title_id(reference_url: &str) -> Option<&str> {
    TITLE_ID_RE.find(reference_url).map(|m| m.as_str())
}

/// Build the canonical title page URL for a reference.
///
/// Only the embedded title id survives; query strings and any other
/// formatting of the input are discarded.
pub fn normalize_reference(base_url: &str, reference_url: &str) -> Result<String> {
    let id = title_id(reference_url).ok_or_else(|| SyncError::MalformedReference {
        reference_url: reference_url.to_string(),
    })?;
    Ok(format!("{}/title/{}/", base_url.trim_end_matches('/'), id))
}

/// Parse a fetched title page. Fails on the first field that cannot be read.
pub fn parse_title_page(html: &str, normalized_url: &str) -> Result<ExternalMetadata> {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(SyncError::MissingField(Field::Title))?;

    let poster_url = document
        .select(&POSTER_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|content| Url::parse(content).is_ok_and(|u| u.has_host()))
        .map(str::to_string)
        .ok_or(SyncError::MissingField(Field::Poster))?;

    let mut seen = HashSet::new();
    let genres: Vec<String> = document
        .select(&GENRE_SELECTOR)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|g| !g.is_empty() && !g.contains(NOISE_LABEL))
        .filter(|g| seen.insert(g.clone()))
        .collect();

    if genres.is_empty() {
        return Err(SyncError::MissingField(Field::Genres));
    }

    Ok(ExternalMetadata {
        title,
        poster_url,
        normalized_reference_url: normalized_url.to_string(),
        genres,
    })
}

/// Scraper for IMDb title pages
pub struct ImdbScraper {
    client: Client,
    base_url: String,
}

impl ImdbScraper {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("text/html"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.9"),
        );

        Ok(Self::with_client(
            build_client(config, headers)?,
            config.imdb_base_url.clone(),
        ))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let fetch_error = |status: u16, body: String| SyncError::Fetch {
            url: url.to_string(),
            status,
            body,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(transport_status(&e), e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| fetch_error(status.as_u16(), e.to_string()))?;

        debug!(url = %url, status = status.as_u16(), "Title page response");

        if !status.is_success() {
            return Err(fetch_error(status.as_u16(), body));
        }

        Ok(body)
    }
}

#[async_trait]
impl MetadataSource for ImdbScraper {
    async fn extract(&self, reference_url: &str) -> Result<ExternalMetadata> {
        let url = normalize_reference(&self.base_url, reference_url)?;
        info!(reference_url = %reference_url, url = %url, "Getting movie details");

        let html = self.fetch(&url).await?;
        let metadata = parse_title_page(&html, &url)?;

        debug!(
            title = %metadata.title,
            poster_url = %metadata.poster_url,
            genres = ?metadata.genres,
            "Parsed title page"
        );
        Ok(metadata)
    }
}
