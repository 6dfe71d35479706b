//! Error taxonomy for a sync run.
//!
//! Errors fall into two groups: fatal errors that stop the run before or
//! during selection, and per-record errors that the orchestrator records and
//! moves past.

use std::fmt;

/// A field scraped from a title page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Poster,
    Genres,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Poster => "poster",
            Field::Genres => "genres",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("watchlist query failed with status {status}: {body}")]
    StoreQuery { status: u16, body: String },

    #[error("reference URL has no IMDb title id: {reference_url:?}")]
    MalformedReference { reference_url: String },

    #[error("failed to fetch {url} (status {status}): {body}")]
    Fetch { url: String, status: u16, body: String },

    #[error("no {0} found on title page")]
    MissingField(Field),

    #[error("update of record {record_id} rejected with status {status}: {body}")]
    StoreWrite {
        record_id: String,
        status: u16,
        body: String,
    },
}

impl SyncError {
    /// Fatal errors abort the whole run; everything else is scoped to one record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Configuration(_) | SyncError::StoreQuery { .. })
    }

    /// Stable label used in log fields and failure summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Configuration(_) => "configuration",
            SyncError::StoreQuery { .. } => "store_query",
            SyncError::MalformedReference { .. } => "malformed_reference",
            SyncError::Fetch { .. } => "fetch",
            SyncError::MissingField(_) => "missing_field",
            SyncError::StoreWrite { .. } => "store_write",
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
