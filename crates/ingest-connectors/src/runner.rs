//! Extraction runner: drives one connector to exhaustion.
//!
//! Pages flow from the connector into the raw store; the runner owns the
//! inter-page delay and the per-run counts. A page-fetch failure aborts this
//! source's run only, with the counts gathered so far.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use ingest_storage::Storage;
use ingest_types::{BatchStats, RawRecord, SourceSlug, TransformOutcome};

use crate::connector::SourceConnector;
use crate::error::ConnectorError;

/// Lookup used by roster-style connectors to skip recently fetched items.
pub trait FetchHistory: Send + Sync {
    fn fetched_recently(&self, source: SourceSlug, external_id: &str, window_days: i64) -> bool;
}

/// Raw-store-backed fetch history.
pub struct StorageFetchHistory {
    storage: Arc<Storage>,
}

impl StorageFetchHistory {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl FetchHistory for StorageFetchHistory {
    fn fetched_recently(&self, source: SourceSlug, external_id: &str, window_days: i64) -> bool {
        let cutoff = Utc::now() - Duration::days(window_days);
        match self.storage.get_raw(source, external_id) {
            Ok(Some(record)) => record.fetched_at >= cutoff,
            Ok(None) => false,
            Err(e) => {
                warn!(external_id = external_id, error = %e, "Fetch history lookup failed");
                false
            }
        }
    }
}

/// History that never skips; used when no store is available.
pub struct NoFetchHistory;

impl FetchHistory for NoFetchHistory {
    fn fetched_recently(&self, _source: SourceSlug, _external_id: &str, _window: i64) -> bool {
        false
    }
}

/// Drives connectors and upserts their items into the raw store.
pub struct ExtractionRunner {
    storage: Arc<Storage>,
    request_delay: std::time::Duration,
}

impl ExtractionRunner {
    pub fn new(storage: Arc<Storage>, request_delay: std::time::Duration) -> Self {
        Self {
            storage,
            request_delay,
        }
    }

    /// Run one source to exhaustion, returning upsert counts.
    pub async fn run(&self, connector: &dyn SourceConnector) -> BatchStats {
        let source = connector.source();
        info!(source = %source, "Starting extraction");

        let mut stats = BatchStats::new();
        let mut cursor = None;
        let mut first_page = true;

        loop {
            if !first_page {
                tokio::time::sleep(self.request_delay).await;
            }
            first_page = false;

            let page = match connector.fetch_page(cursor.take()).await {
                Ok(page) => page,
                Err(e) => {
                    // Abort this source only; counts so far still stand.
                    error!(source = %source, error = %e, "Page fetch failed, aborting source");
                    stats.record_transform(&TransformOutcome::failed(e));
                    break;
                }
            };

            for item in &page.items {
                if item.external_id.trim().is_empty() {
                    warn!(source = %source, "Dropping item with empty external id");
                    stats.record_transform(&TransformOutcome::skipped("empty external id"));
                    continue;
                }

                let record = RawRecord::new(
                    source,
                    item.external_id.clone(),
                    item.museum_db_id.clone(),
                    item.payload.clone(),
                );
                match self.storage.upsert_raw(&record) {
                    Ok(outcome) => {
                        let transform_outcome = if outcome.created {
                            TransformOutcome::Created
                        } else if outcome.changed {
                            TransformOutcome::Updated
                        } else {
                            TransformOutcome::skipped("unchanged payload")
                        };
                        stats.record_transform(&transform_outcome);
                    }
                    Err(e) => {
                        error!(
                            source = %source,
                            external_id = %item.external_id,
                            error = %e,
                            "Raw upsert failed"
                        );
                        stats.record_transform(&TransformOutcome::failed(e));
                    }
                }
            }

            info!(
                source = %source,
                page_items = page.items.len(),
                total = page.total,
                "Page stored ({})",
                stats
            );

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(source = %source, "Extraction complete ({})", stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    use crate::connector::{FetchedPage, RawItem};
    use crate::cursor::Cursor;

    /// Serves a scripted sequence of pages, then an optional error.
    struct ScriptedConnector {
        pages: Mutex<Vec<Result<FetchedPage, ConnectorError>>>,
    }

    impl ScriptedConnector {
        fn new(pages: Vec<Result<FetchedPage, ConnectorError>>) -> Self {
            Self {
                pages: Mutex::new(pages),
            }
        }
    }

    #[async_trait]
    impl SourceConnector for ScriptedConnector {
        fn source(&self) -> SourceSlug {
            SourceSlug::Smk
        }

        async fn fetch_page(
            &self,
            _cursor: Option<Cursor>,
        ) -> Result<FetchedPage, ConnectorError> {
            self.pages.lock().unwrap().remove(0)
        }
    }

    fn item(id: &str) -> RawItem {
        RawItem {
            external_id: id.to_string(),
            museum_db_id: None,
            payload: json!({"object_number": id}),
        }
    }

    fn runner() -> (ExtractionRunner, Arc<Storage>, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(dir.path()).unwrap());
        let runner = ExtractionRunner::new(storage.clone(), std::time::Duration::ZERO);
        (runner, storage, dir)
    }

    #[tokio::test]
    async fn test_run_stores_all_pages() {
        let (runner, storage, _dir) = runner();
        let connector = ScriptedConnector::new(vec![
            Ok(FetchedPage {
                items: vec![item("KMS1"), item("KMS2")],
                next: Some(Cursor::Offset {
                    segment: 0,
                    offset: 2,
                }),
                total: Some(3),
            }),
            Ok(FetchedPage {
                items: vec![item("KMS3")],
                next: None,
                total: Some(3),
            }),
        ]);

        let stats = runner.run(&connector).await;
        assert_eq!(stats.created, 3);
        assert_eq!(stats.errors, 0);
        assert_eq!(storage.count_raw(Some(SourceSlug::Smk)).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_rerun_counts_unchanged_as_skipped() {
        let (runner, _storage, _dir) = runner();
        let page = || {
            Ok(FetchedPage {
                items: vec![item("KMS1")],
                next: None,
                total: Some(1),
            })
        };

        let first = runner.run(&ScriptedConnector::new(vec![page()])).await;
        assert_eq!(first.created, 1);

        let second = runner.run(&ScriptedConnector::new(vec![page()])).await;
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped, 1);
    }

    #[tokio::test]
    async fn test_fetch_error_aborts_with_partial_counts() {
        let (runner, storage, _dir) = runner();
        let connector = ScriptedConnector::new(vec![
            Ok(FetchedPage {
                items: vec![item("KMS1")],
                next: Some(Cursor::Offset {
                    segment: 0,
                    offset: 1,
                }),
                total: Some(2),
            }),
            Err(ConnectorError::Envelope("boom".to_string())),
        ]);

        let stats = runner.run(&connector).await;
        assert_eq!(stats.created, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(storage.count_raw(Some(SourceSlug::Smk)).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_external_id_is_skipped() {
        let (runner, storage, _dir) = runner();
        let connector = ScriptedConnector::new(vec![Ok(FetchedPage {
            items: vec![item(""), item("KMS1")],
            next: None,
            total: Some(2),
        })]);

        let stats = runner.run(&connector).await;
        assert_eq!(stats.created, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(storage.count_raw(Some(SourceSlug::Smk)).unwrap(), 1);
    }

    #[test]
    fn test_storage_fetch_history_window() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(dir.path()).unwrap());
        storage
            .upsert_raw(&RawRecord::new(
                SourceSlug::Met,
                "437133",
                None,
                json!({"objectID": 437133}),
            ))
            .unwrap();

        let history = StorageFetchHistory::new(storage);
        assert!(history.fetched_recently(SourceSlug::Met, "437133", 30));
        assert!(!history.fetched_recently(SourceSlug::Met, "999999", 30));
        // A zero-day window treats everything as stale.
        assert!(!history.fetched_recently(SourceSlug::Met, "437133", 0));
    }
}
