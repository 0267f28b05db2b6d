//! Metropolitan Museum of Art (MET) connector.
//!
//! Two-phase source: first build a roster of object ids (selected departments
//! plus a keyword search), then fetch each object individually. The roster is
//! carried in the cursor; individual fetches honor the inter-item delay and a
//! skip-recently-fetched window so reruns do not hammer the per-object
//! endpoint.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use ingest_types::{config::ExtractionSettings, SourceSlug};

use crate::connector::{FetchedPage, RawItem, SourceConnector};
use crate::cursor::Cursor;
use crate::error::ConnectorError;
use crate::http::HttpSource;
use crate::runner::FetchHistory;

const BASE_URL: &str = "https://collectionapi.metmuseum.org/public/collection/v1";

/// Departments to ingest: European Paintings, The Robert Lehman Collection,
/// Drawings and Prints.
const DEPARTMENT_IDS: &[u32] = &[11, 15, 9];

const SEARCH_QUERIES: &[&str] = &["paintings"];

pub struct MetConnector {
    http: HttpSource,
    settings: ExtractionSettings,
    history: Arc<dyn FetchHistory>,
    base_url: String,
}

impl MetConnector {
    pub fn new(
        http: HttpSource,
        settings: ExtractionSettings,
        history: Arc<dyn FetchHistory>,
    ) -> Self {
        Self {
            http,
            settings,
            history,
            base_url: BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read the `objectIDs` array shared by the objects and search endpoints.
    fn parse_object_ids(body: &Value) -> Vec<u64> {
        body.get("objectIDs")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
            .unwrap_or_default()
    }

    /// Build the deduplicated, sorted roster and drop recently fetched ids.
    async fn build_roster(&self) -> Result<Vec<u64>, ConnectorError> {
        let mut all_ids: BTreeSet<u64> = BTreeSet::new();

        for department_id in DEPARTMENT_IDS {
            let url = format!("{}/objects", self.base_url);
            let query = [("departmentIds", department_id.to_string())];
            let body = self.http.get_json(&url, &query).await?;
            let ids = Self::parse_object_ids(&body);
            debug!(department_id = department_id, count = ids.len(), "Department roster");
            all_ids.extend(ids);
        }

        for search_query in SEARCH_QUERIES {
            let url = format!("{}/search", self.base_url);
            // `q` must come last or the endpoint misparses the query.
            let query = [
                ("hasImages", "true".to_string()),
                ("q", search_query.to_string()),
            ];
            let body = self.http.get_json(&url, &query).await?;
            let ids = Self::parse_object_ids(&body);
            debug!(query = search_query, count = ids.len(), "Search roster");
            all_ids.extend(ids);
        }

        let total = all_ids.len();
        let window = self.settings.refetch_window_days;
        let ids: Vec<u64> = all_ids
            .into_iter()
            .filter(|id| {
                !self
                    .history
                    .fetched_recently(SourceSlug::Met, &id.to_string(), window)
            })
            .collect();

        info!(
            total = total,
            to_fetch = ids.len(),
            skipped_recent = total - ids.len(),
            "Built MET roster"
        );
        Ok(ids)
    }

    /// Fetch one object; per-object failures are skipped, not fatal.
    async fn fetch_object(&self, object_id: u64) -> Option<RawItem> {
        let url = format!("{}/objects/{}", self.base_url, object_id);
        match self.http.get_json(&url, &[]).await {
            Ok(payload) => Some(RawItem {
                external_id: object_id.to_string(),
                museum_db_id: None,
                payload,
            }),
            Err(e) => {
                warn!(object_id = object_id, error = %e, "Skipping MET object");
                None
            }
        }
    }
}

#[async_trait]
impl SourceConnector for MetConnector {
    fn source(&self) -> SourceSlug {
        SourceSlug::Met
    }

    async fn fetch_page(&self, cursor: Option<Cursor>) -> Result<FetchedPage, ConnectorError> {
        let (ids, index) = match cursor {
            None => (self.build_roster().await?, 0),
            Some(Cursor::Roster { ids, index }) => (ids, index),
            Some(other) => {
                return Err(ConnectorError::Envelope(format!(
                    "MET cannot resume from cursor {}",
                    other.describe()
                )))
            }
        };

        let end = (index + self.settings.page_size).min(ids.len());
        let mut items = Vec::with_capacity(end - index);

        for (n, object_id) in ids[index..end].iter().enumerate() {
            if n > 0 {
                tokio::time::sleep(self.settings.item_delay()).await;
            }
            if let Some(item) = self.fetch_object(*object_id).await {
                items.push(item);
            }
        }

        let total = ids.len() as u64;
        let next = if end < ids.len() {
            Some(Cursor::Roster { ids, index: end })
        } else {
            None
        };

        Ok(FetchedPage {
            items,
            next,
            total: Some(total),
        })
    }
}
