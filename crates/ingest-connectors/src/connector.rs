//! The shared connector seam.

use async_trait::async_trait;
use serde_json::Value;

use ingest_types::SourceSlug;

use crate::cursor::Cursor;
use crate::error::ConnectorError;

/// One raw item as fetched from a museum API, before storage.
#[derive(Debug, Clone)]
pub struct RawItem {
    /// The source's stable identifier (raw-store key)
    pub external_id: String,
    /// Opaque secondary identifier, when the source provides one
    pub museum_db_id: Option<String>,
    /// The payload as fetched
    pub payload: Value,
}

/// One page of fetched items plus the continuation cursor.
#[derive(Debug)]
pub struct FetchedPage {
    pub items: Vec<RawItem>,
    /// Cursor for the next page; `None` means the run is complete
    pub next: Option<Cursor>,
    /// Total matching items, when the API reports it
    pub total: Option<u64>,
}

/// A paged museum API client.
///
/// Implementations are stateless between calls: all resume state lives in the
/// cursor. Items with an empty external id must be dropped by the connector,
/// never surfaced.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Which museum this connector serves.
    fn source(&self) -> SourceSlug;

    /// Fetch the page at `cursor` (`None` = start of the run).
    async fn fetch_page(&self, cursor: Option<Cursor>) -> Result<FetchedPage, ConnectorError>;
}
