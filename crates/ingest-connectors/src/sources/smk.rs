//! National Gallery of Denmark (SMK) connector.
//!
//! Offset-paginated search endpoint, one pass per work type, with server-side
//! filters for public domain and image availability.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use ingest_types::{config::ExtractionSettings, SourceSlug};

use crate::connector::{FetchedPage, RawItem, SourceConnector};
use crate::cursor::Cursor;
use crate::error::ConnectorError;
use crate::http::HttpSource;
use crate::sources::non_empty_str;

const BASE_SEARCH_URL: &str = "https://api.smk.dk/api/v1/art/search/";

/// Work-type passes, in Danish as the API expects them.
const WORK_TYPES: &[&str] = &["pastel", "akvatinte", "akvarel", "Buste", "maleri", "tegning"];

pub struct SmkConnector {
    http: HttpSource,
    settings: ExtractionSettings,
    base_url: String,
}

impl SmkConnector {
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

    /// Parse one search response into items and the reported total.
    fn parse_page(body: &Value) -> Result<(Vec<RawItem>, u64), ConnectorError> {
        let total = body.get("found").and_then(Value::as_u64).unwrap_or(0);
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| ConnectorError::Envelope("SMK response missing items".to_string()))?;

        let mut parsed = Vec::with_capacity(items.len());
        for item in items {
            let Some(object_number) = item.get("object_number").and_then(non_empty_str) else {
                warn!("Dropping SMK item without object_number");
                continue;
            };
            let museum_db_id = item
                .get("id")
                .and_then(non_empty_str)
                .map(|s| s.to_string());
            parsed.push(RawItem {
                external_id: object_number.to_string(),
                museum_db_id,
                payload: item.clone(),
            });
        }
        Ok((parsed, total))
    }
}

#[async_trait]
impl SourceConnector for SmkConnector {
    fn source(&self) -> SourceSlug {
        SourceSlug::Smk
    }

    async fn fetch_page(&self, cursor: Option<Cursor>) -> Result<FetchedPage, ConnectorError> {
        let (segment, offset) = match cursor {
            None => (0, 0),
            Some(Cursor::Offset { segment, offset }) => (segment, offset),
            Some(other) => {
                return Err(ConnectorError::Envelope(format!(
                    "SMK cannot resume from cursor {}",
                    other.describe()
                )))
            }
        };
        let work_type = WORK_TYPES[segment];
        let rows = self.settings.page_size;

        let query = [
            ("keys", "*".to_string()),
            ("rows", rows.to_string()),
            ("offset", offset.to_string()),
            (
                "filters",
                format!(
                    "[has_image:true],[object_names:{}],[public_domain:true]",
                    work_type
                ),
            ),
        ];

        let body = self.http.get_json(&self.base_url, &query).await?;
        let (items, total) = Self::parse_page(&body)?;
        debug!(
            work_type = work_type,
            offset = offset,
            total = total,
            count = items.len(),
            "Fetched SMK page"
        );

        // Advance within the segment, or move to the next work type.
        let next = if (offset + rows) < total as usize {
            Some(Cursor::Offset {
                segment,
                offset: offset + rows,
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page_extracts_items() {
        let body = json!({
            "found": 2,
            "items": [
                {"object_number": "KMS1", "id": "1170000001", "titles": []},
                {"object_number": "KMS2", "id": "1170000002"}
            ]
        });
        let (items, total) = SmkConnector::parse_page(&body).unwrap();
        assert_eq!(total, 2);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].external_id, "KMS1");
        assert_eq!(items[0].museum_db_id.as_deref(), Some("1170000001"));
    }

    #[test]
    fn test_parse_page_drops_items_without_object_number() {
        let body = json!({
            "found": 3,
            "items": [
                {"object_number": "KMS1"},
                {"object_number": ""},
                {"id": "no-number"}
            ]
        });
        let (items, _) = SmkConnector::parse_page(&body).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_parse_page_rejects_missing_items() {
        let body = json!({"found": 0});
        assert!(SmkConnector::parse_page(&body).is_err());
    }
}
