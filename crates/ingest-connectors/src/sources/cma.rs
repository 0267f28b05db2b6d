//! Cleveland Museum of Art (CMA) connector.
//!
//! Skip/limit pagination, one pass per work type, restricted to CC0 works
//! with images.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use ingest_types::{config::ExtractionSettings, SourceSlug};

use crate::connector::{FetchedPage, RawItem, SourceConnector};
use crate::cursor::Cursor;
use crate::error::ConnectorError;
use crate::http::HttpSource;
use crate::sources::non_empty_str;

const BASE_SEARCH_URL: &str = "https://openaccess-api.clevelandart.org/api/artworks/";

const WORK_TYPES: &[&str] = &["Print", "Painting", "Drawing"];

pub struct CmaConnector {
    http: HttpSource,
    settings: ExtractionSettings,
    base_url: String,
}

impl CmaConnector {
    pub fn new(http: HttpSource, settings: ExtractionSettings) -> Self {
        Self {
            http,
            settings,
            base_url: BASE_SEARCH_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Parse one artworks response into items and the reported total.
    fn parse_page(body: &Value) -> Result<(Vec<RawItem>, u64), ConnectorError> {
        let total = body
            .get("info")
            .and_then(|info| info.get("total"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let items = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| ConnectorError::Envelope("CMA response missing data".to_string()))?;

        let mut parsed = Vec::with_capacity(items.len());
        for item in items {
            let Some(accession_number) = item.get("accession_number").and_then(non_empty_str)
            else {
                warn!("Dropping CMA item without accession_number");
                continue;
            };
            let museum_db_id = item.get("id").and_then(Value::as_u64).map(|id| id.to_string());
            parsed.push(RawItem {
                external_id: accession_number.to_string(),
                museum_db_id,
                payload: item.clone(),
            });
        }
        Ok((parsed, total))
    }
}

#[async_trait]
impl SourceConnector for CmaConnector {
    fn source(&self) -> SourceSlug {
        SourceSlug::Cma
    }

    async fn fetch_page(&self, cursor: Option<Cursor>) -> Result<FetchedPage, ConnectorError> {
        let (segment, offset) = match cursor {
            None => (0, 0),
            Some(Cursor::Offset { segment, offset }) => (segment, offset),
            Some(other) => {
                return Err(ConnectorError::Envelope(format!(
                    "CMA cannot resume from cursor {}",
                    other.describe()
                )))
            }
        };
        let work_type = WORK_TYPES[segment];
        let limit = self.settings.page_size;

        let query = [
            ("q", String::new()),
            ("has_image", "1".to_string()),
            ("cc0", "1".to_string()),
            ("limit", limit.to_string()),
            ("type", work_type.to_string()),
            ("skip", offset.to_string()),
        ];

        let body = self.http.get_json(&self.base_url, &query).await?;
        let (items, total) = Self::parse_page(&body)?;
        debug!(
            work_type = work_type,
            skip = offset,
            total = total,
            count = items.len(),
            "Fetched CMA page"
        );

        let next = if (offset + limit) < total as usize {
            Some(Cursor::Offset {
                segment,
                offset: offset + limit,
            })
        } else if segment + 1 < WORK_TYPES.len() {
            Some(Cursor::Offset {
                segment: segment + 1,
                offset: 0,
            })
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
