//! Application configuration management

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::{Result, SyncError};

const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com/v1";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_IMDB_BASE_URL: &str = "https://www.imdb.com";
const DEFAULT_USER_AGENT: &str = "Notion Watch List Metadata Updater";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for outbound HTTP and title page scraping. Needs no credentials.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Scheme and host used to build canonical title page URLs
    pub imdb_base_url: String,

    /// User-Agent sent with every outbound request
    pub user_agent: String,

    /// Upper bound on each outbound request
    pub http_timeout: Duration,
}

/// Credentials and endpoint for the watchlist database
#[derive(Clone)]
pub struct NotionConfig {
    /// Notion integration token
    pub token: String,

    /// Watchlist database id
    pub database_id: String,

    /// Value sent in the Notion-Version header
    pub version: String,

    /// Notion REST API root
    pub api_url: String,
}

/// Full configuration for runs that touch the watchlist
#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub notion: NotionConfig,
}

fn value<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    value(lookup, key).ok_or_else(|| SyncError::Configuration(format!("{} is required", key)))
}

fn optional<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    value(lookup, key).unwrap_or_else(|| default.to_string())
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            imdb_base_url: DEFAULT_IMDB_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl HttpConfig {
    /// Load HTTP settings from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&|key: &str| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = match lookup("SYNC_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    SyncError::Configuration(format!(
                        "SYNC_HTTP_TIMEOUT_SECS must be a positive integer, got {:?}",
                        raw
                    ))
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            imdb_base_url: optional(lookup, "IMDB_BASE_URL", DEFAULT_IMDB_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            user_agent: optional(lookup, "SYNC_USER_AGENT", DEFAULT_USER_AGENT),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl NotionConfig {
    pub fn from_vars<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            token: required(lookup, "NOTION_API_KEY")?,
            database_id: required(lookup, "NOTION_DB_ID")?,
            version: optional(lookup, "NOTION_VERSION", DEFAULT_NOTION_VERSION),
            api_url: optional(lookup, "NOTION_API_URL", DEFAULT_NOTION_API_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            http: HttpConfig::from_vars(&lookup)?,
            notion: NotionConfig::from_vars(&lookup)?,
        })
    }
}

impl fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionConfig")
            .field("token", &"...")
            .field("database_id", &self.database_id)
            .field("version", &self.version)
            .field("api_url", &self.api_url)
            .finish()
    }
}
