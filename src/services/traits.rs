//! Seams between the orchestrator and its two external collaborators

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ExternalMetadata, UpdateConfirmation, WatchlistRecord};

/// The watchlist database
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Every record whose title or poster is empty, fully materialized
    async fn select_pending(&self) -> Result<Vec<WatchlistRecord>>;

    /// Write title, poster and genres back to one record
    async fn apply(&self, record_id: &str, metadata: &ExternalMetadata)
    -> Result<UpdateConfirmation>;
}

/// Where enrichment metadata comes from
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn extract(&self, reference_url: &str) -> Result<ExternalMetadata>;
}
