//! Watchlist records and the values that flow through a sync run

use std::fmt;

use serde::Serialize;

/// Separator used when flattening genres into the store's text field
pub const GENRE_SEPARATOR: &str = ", ";

/// One row of the watchlist database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchlistRecord {
    pub id: String,
    pub reference_url: String,
    pub title: String,
    pub poster_url: String,
    pub genres: Vec<String>,
}

impl WatchlistRecord {
    /// A record needs enrichment when either its title or its poster is empty.
    pub fn is_pending(&self) -> bool {
        self.title.trim().is_empty() || self.poster_url.trim().is_empty()
    }
}

/// Metadata scraped from a title page. Only ever constructed whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalMetadata {
    pub title: String,
    pub poster_url: String,
    pub normalized_reference_url: String,
    pub genres: Vec<String>,
}

impl ExternalMetadata {
    pub fn genres_text(&self) -> String {
        self.genres.join(GENRE_SEPARATOR)
    }
}

/// Returned by the store after a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfirmation {
    pub record_id: String,
    pub title: String,
}

impl fmt::Display for UpdateConfirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Success: updated {} at {}", self.title, self.record_id)
    }
}

/// A record that could not be enriched during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub record_id: String,
    pub reference_url: String,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Clean,
    PartialFailure,
}

/// Tally of a completed run
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub considered: usize,
    pub succeeded: Vec<UpdateConfirmation>,
    pub failed: Vec<RecordFailure>,
    /// Records extracted but not written because the run was a dry run
    pub skipped: Vec<(String, ExternalMetadata)>,
}

impl SyncSummary {
    pub fn outcome(&self) -> SyncOutcome {
        if self.failed.is_empty() {
            SyncOutcome::Clean
        } else {
            SyncOutcome::PartialFailure
        }
    }
}
