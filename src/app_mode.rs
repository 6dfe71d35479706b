//! What a single invocation does.

use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Enrich every pending record
    Sync,
    /// Enrich pending records without writing them back
    DryRun,
    /// Scrape one reference URL and print the result
    Lookup(String),
    /// List watchlist records whose link contains the given text
    Find(String),
}

impl RunMode {
    pub fn from_env() -> Self {
        match env::var("SYNC_DRY_RUN").ok().as_deref() {
            Some("true") | Some("1") => RunMode::DryRun,
            _ => RunMode::Sync,
        }
    }

    /// Whether this mode writes to the watchlist
    pub fn writes(&self) -> bool {
        matches!(self, RunMode::Sync)
    }
}
