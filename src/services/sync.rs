//! Sync orchestration: select pending records, then extract and apply one at a time.
//!
//! A failure while enriching one record is logged, recorded in the summary and
//! skipped; the remaining records are still processed. Only a failure to
//! select records (or any other fatal error) ends the run early.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::traits::{MetadataSource, WatchlistStore};
use crate::error::Result;
use crate::models::{ExternalMetadata, RecordFailure, SyncSummary, UpdateConfirmation, WatchlistRecord};

enum RecordOutcome {
    Updated(UpdateConfirmation),
    DryRun(ExternalMetadata),
}

pub struct SyncOrchestrator {
    store: Arc<dyn WatchlistStore>,
    source: Arc<dyn MetadataSource>,
    dry_run: bool,
}

impl SyncOrchestrator {
    pub fn new(store: Arc<dyn WatchlistStore>, source: Arc<dyn MetadataSource>) -> Self {
        Self {
            store,
            source,
            dry_run: false,
        }
    }

    /// Extract metadata without writing it back
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> Result<SyncSummary> {
        let records = self.store.select_pending().await?;
        let mut summary = SyncSummary {
            considered: records.len(),
            ..Default::default()
        };

        if records.is_empty() {
            info!("Nothing found to update.");
            log_summary(&summary);
            return Ok(summary);
        }

        info!(count = records.len(), dry_run = self.dry_run, "Records to be updated");

        for record in &records {
            info!(
                record_id = %record.id,
                reference_url = %record.reference_url,
                "Updating record"
            );

            match self.sync_record(record).await {
                Ok(RecordOutcome::Updated(confirmation)) => {
                    info!(record_id = %record.id, "{}", confirmation);
                    summary.succeeded.push(confirmation);
                }
                Ok(RecordOutcome::DryRun(metadata)) => {
                    info!(
                        record_id = %record.id,
                        title = %metadata.title,
                        "Dry run, not writing record"
                    );
                    summary.skipped.push((record.id.clone(), metadata));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(
                        record_id = %record.id,
                        reference_url = %record.reference_url,
                        kind = e.kind(),
                        error = %e,
                        "Failed to update record"
                    );
                    summary.failed.push(RecordFailure {
                        record_id: record.id.clone(),
                        reference_url: record.reference_url.clone(),
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        log_summary(&summary);
        Ok(summary)
    }

    async fn sync_record(&self, record: &WatchlistRecord) -> Result<RecordOutcome> {
        let metadata = self.source.extract(&record.reference_url).await?;
        if self.dry_run {
            return Ok(RecordOutcome::DryRun(metadata));
        }
        let confirmation = self.store.apply(&record.id, &metadata).await?;
        Ok(RecordOutcome::Updated(confirmation))
    }
}

fn log_summary(summary: &SyncSummary) {
    info!(
        considered = summary.considered,
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        skipped = summary.skipped.len(),
        "Sync complete"
    );
    for failure in &summary.failed {
        warn!(
            record_id = %failure.record_id,
            reference_url = %failure.reference_url,
            kind = failure.kind,
            "{}",
            failure.message
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::{Field, SyncError};
    use crate::models::SyncOutcome;
    use crate::services::imdb::normalize_reference;

    #[derive(Default)]
    struct FakeStore {
        pending: Vec<WatchlistRecord>,
        fail_query: bool,
        reject_writes_for: Vec<String>,
        writes: Mutex<Vec<(String, ExternalMetadata)>>,
    }

    #[async_trait]
    impl WatchlistStore for FakeStore {
        async fn select_pending(&self) -> Result<Vec<WatchlistRecord>> {
            if self.fail_query {
                return Err(SyncError::StoreQuery {
                    status: 401,
                    body: r#"{"code":"unauthorized"}"#.to_string(),
                });
            }
            Ok(self.pending.iter().filter(|r| r.is_pending()).cloned().collect())
        }

        async fn apply(
            &self,
            record_id: &str,
            metadata: &ExternalMetadata,
        ) -> Result<UpdateConfirmation> {
            if self.reject_writes_for.iter().any(|id| id == record_id) {
                return Err(SyncError::StoreWrite {
                    record_id: record_id.to_string(),
                    status: 400,
                    body: "validation_error".to_string(),
                });
            }
            self.writes
                .lock()
                .push((record_id.to_string(), metadata.clone()));
            Ok(UpdateConfirmation {
                record_id: record_id.to_string(),
                title: metadata.title.clone(),
            })
        }
    }

    /// Serves canned pages keyed by title id, or a status code for ids that should fail
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, (String, Vec<String>)>,
        statuses: HashMap<String, u16>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn page(mut self, id: &str, title: &str, genres: &[&str]) -> Self {
            self.pages.insert(
                id.to_string(),
                (title.to_string(), genres.iter().map(|g| g.to_string()).collect()),
            );
            self
        }

        fn status(mut self, id: &str, status: u16) -> Self {
            self.statuses.insert(id.to_string(), status);
            self
        }
    }

    #[async_trait]
    impl MetadataSource for FakeSource {
        async fn extract(&self, reference_url: &str) -> Result<ExternalMetadata> {
            let url = normalize_reference("https://www.imdb.com", reference_url)?;
            self.calls.lock().push(url.clone());

            let id = crate::services::imdb::title_id(&url).unwrap_or_default().to_string();
            if let Some(status) = self.statuses.get(&id) {
                return Err(SyncError::Fetch {
                    url,
                    status: *status,
                    body: "<html>Not Found</html>".to_string(),
                });
            }
            let (title, genres) = self
                .pages
                .get(&id)
                .cloned()
                .ok_or(SyncError::MissingField(Field::Title))?;
            Ok(ExternalMetadata {
                title,
                poster_url: format!("https://m.media-amazon.com/images/M/{}.jpg", id),
                normalized_reference_url: url,
                genres,
            })
        }
    }

    fn record(id: &str, link: &str) -> WatchlistRecord {
        WatchlistRecord {
            id: id.to_string(),
            reference_url: link.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_record_updated() {
        let store = Arc::new(FakeStore {
            pending: vec![record("page-1", "https://example/title/tt1375666/?ref=x")],
            ..Default::default()
        });
        let source = Arc::new(FakeSource::default().page("tt1375666", "Inception", &["Action", "Adventure"]));

        let summary = SyncOrchestrator::new(store.clone(), source).run().await.unwrap();

        assert_eq!(summary.considered, 1);
        assert_eq!(summary.succeeded.len(), 1);
        assert!(summary.failed.is_empty());
        assert_eq!(summary.outcome(), SyncOutcome::Clean);

        let writes = store.writes.lock();
        let (record_id, metadata) = &writes[0];
        assert_eq!(record_id, "page-1");
        assert_eq!(metadata.title, "Inception");
        assert_eq!(metadata.poster_url, "https://m.media-amazon.com/images/M/tt1375666.jpg");
        assert_eq!(metadata.genres_text(), "Action, Adventure");
        assert_eq!(metadata.normalized_reference_url, "https://www.imdb.com/title/tt1375666/");
    }

    #[tokio::test]
    async fn test_nothing_pending() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::default());

        let summary = SyncOrchestrator::new(store.clone(), source.clone()).run().await.unwrap();

        assert_eq!(summary.considered, 0);
        assert!(summary.succeeded.is_empty());
        assert_eq!(summary.outcome(), SyncOutcome::Clean);
        assert!(source.calls.lock().is_empty());
        assert!(store.writes.lock().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_stop_other_records() {
        let store = Arc::new(FakeStore {
            pending: vec![
                record("page-1", "https://www.imdb.com/title/tt0111161/"),
                record("page-2", "https://www.imdb.com/title/tt9999999/"),
                record("page-3", "https://www.imdb.com/title/tt0068646/"),
            ],
            ..Default::default()
        });
        let source = Arc::new(
            FakeSource::default()
                .page("tt0111161", "The Shawshank Redemption", &["Drama"])
                .status("tt9999999", 404)
                .page("tt0068646", "The Godfather", &["Crime", "Drama"]),
        );

        let summary = SyncOrchestrator::new(store.clone(), source).run().await.unwrap();

        assert_eq!(summary.considered, 3);
        assert_eq!(summary.succeeded.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.outcome(), SyncOutcome::PartialFailure);

        let failure = &summary.failed[0];
        assert_eq!(failure.record_id, "page-2");
        assert_eq!(failure.reference_url, "https://www.imdb.com/title/tt9999999/");
        assert_eq!(failure.kind, "fetch");
        assert!(failure.message.contains("404"));

        let written: Vec<String> = store.writes.lock().iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(written, vec!["page-1", "page-3"]);
    }

    #[tokio::test]
    async fn test_malformed_reference_and_rejected_write_are_recorded() {
        let store = Arc::new(FakeStore {
            pending: vec![
                record("page-1", ""),
                record("page-2", "https://www.imdb.com/title/tt0068646/"),
                record("page-3", "https://www.imdb.com/title/tt0111161/"),
            ],
            reject_writes_for: vec!["page-2".to_string()],
            ..Default::default()
        });
        let source = Arc::new(
            FakeSource::default()
                .page("tt0068646", "The Godfather", &["Crime", "Drama"])
                .page("tt0111161", "The Shawshank Redemption", &["Drama"]),
        );

        let summary = SyncOrchestrator::new(store, source).run().await.unwrap();

        let kinds: Vec<&str> = summary.failed.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec!["malformed_reference", "store_write"]);
        assert_eq!(summary.succeeded[0].record_id, "page-3");
    }

    #[tokio::test]
    async fn test_selection_failure_is_fatal() {
        let store = Arc::new(FakeStore {
            fail_query: true,
            ..Default::default()
        });
        let source = Arc::new(FakeSource::default());

        let err = SyncOrchestrator::new(store, source.clone()).run().await.unwrap_err();
        assert_matches!(err, SyncError::StoreQuery { status: 401, .. });
        assert!(source.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_poster_only_record_gets_every_field() {
        let mut partial = record("page-1", "https://www.imdb.com/title/tt1375666/");
        partial.title = "Inception".to_string();
        let store = Arc::new(FakeStore {
            pending: vec![partial],
            ..Default::default()
        });
        let source = Arc::new(FakeSource::default().page("tt1375666", "Inception", &["Action"]));

        SyncOrchestrator::new(store.clone(), source).run().await.unwrap();

        let writes = store.writes.lock();
        let (_, metadata) = &writes[0];
        assert_eq!(metadata.title, "Inception");
        assert!(!metadata.poster_url.is_empty());
        assert_eq!(metadata.genres, vec!["Action"]);
    }

    #[tokio::test]
    async fn test_dry_run_skips_writes() {
        let store = Arc::new(FakeStore {
            pending: vec![record("page-1", "https://www.imdb.com/title/tt1375666/")],
            ..Default::default()
        });
        let source = Arc::new(FakeSource::default().page("tt1375666", "Inception", &["Action"]));

        let summary = SyncOrchestrator::new(store.clone(), source)
            .with_dry_run(true)
            .run()
            .await
            .unwrap();

        assert!(store.writes.lock().is_empty());
        assert!(summary.succeeded.is_empty());
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].0, "page-1");
        assert_eq!(summary.skipped[0].1.title, "Inception");
    }
}
