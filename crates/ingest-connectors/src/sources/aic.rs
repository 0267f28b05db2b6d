//! Art Institute of Chicago (AIC) connector.
//!
//! Uses the plain listing endpoint (the search endpoint caps pagination) and
//! filters client-side: public domain, has an image id, has a reference
//! number, and belongs to an allowed artwork type.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use ingest_types::{config::ExtractionSettings, SourceSlug};

use crate::connector::{FetchedPage, RawItem, SourceConnector};
use crate::cursor::Cursor;
use crate::error::ConnectorError;
use crate::http::HttpSource;
use crate::sources::non_empty_str;

const BASE_URL: &str = "https://api.artic.edu/api/v1/artworks";

const ALLOWED_ARTWORK_TYPES: &[&str] = &[
    "Painting",
    "Drawing and Watercolor",
    "Print",
    "Miniature Painting",
    "Design",
];

/// Only the fields the pipeline needs, to keep responses small.
const FIELDS: &[&str] = &[
    "id",
    "title",
    "artist_display",
    "date_start",
    "date_end",
    "date_display",
    "main_reference_number",
    "image_id",
    "is_public_domain",
    "artwork_type_title",
    "artist_title",
    "classification_title",
];

pub struct AicConnector {
    http: HttpSource,
    settings: ExtractionSettings,
    base_url: String,
}

impl AicConnector {
    pub fn new(http: HttpSource, settings: ExtractionSettings) -> Self {
        Self {
            http,
            settings,
            base_url: BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Whether an item passes the client-side eligibility filters.
    fn eligible(item: &Value) -> bool {
        if !item
            .get("is_public_domain")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            return false;
        }
        if item.get("image_id").and_then(non_empty_str).is_none() {
            return false;
        }
        if item
            .get("main_reference_number")
            .and_then(non_empty_str)
            .is_none()
        {
            return false;
        }
        matches!(
            item.get("artwork_type_title").and_then(Value::as_str),
            Some(t) if ALLOWED_ARTWORK_TYPES.contains(&t)
        )
    }

    /// Parse one listing response into filtered items plus pagination info.
    fn parse_page(body: &Value) -> Result<(Vec<RawItem>, u64, u64), ConnectorError> {
        let pagination = body.get("pagination").cloned().unwrap_or(Value::Null);
        let total = pagination.get("total").and_then(Value::as_u64).unwrap_or(0);
        let total_pages = pagination
            .get("total_pages")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let items = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| ConnectorError::Envelope("AIC response missing data".to_string()))?;

        let mut parsed = Vec::new();
        for item in items {
            if !Self::eligible(item) {
                continue;
            }
            // eligible() guarantees the reference number is present
            let external_id = item
                .get("main_reference_number")
                .and_then(non_empty_str)
                .map(|s| s.to_string())
                .ok_or_else(|| ConnectorError::Envelope("AIC eligibility invariant".to_string()))?;
            let museum_db_id = item.get("id").and_then(Value::as_u64).map(|id| id.to_string());
            parsed.push(RawItem {
                external_id,
                museum_db_id,
                payload: item.clone(),
            });
        }
        Ok((parsed, total, total_pages))
    }
}

#[async_trait]
impl SourceConnector for AicConnector {
    fn source(&self) -> SourceSlug {
        SourceSlug::Aic
    }

    async fn fetch_page(&self, cursor: Option<Cursor>) -> Result<FetchedPage, ConnectorError> {
        let page = match cursor {
            None => 1,
            Some(Cursor::Page { page }) => page,
            Some(other) => {
                return Err(ConnectorError::Envelope(format!(
                    "AIC cannot resume from cursor {}",
                    other.describe()
                )))
            }
        };

        let query = [
            ("fields", FIELDS.join(",")),
            ("limit", self.settings.page_size.to_string()),
            ("page", page.to_string()),
        ];

        let body = self.http.get_json(&self.base_url, &query).await?;
        let (items, total, total_pages) = Self::parse_page(&body)?;
        debug!(
            page = page,
            total_pages = total_pages,
            kept = items.len(),
            "Fetched AIC page"
        );

        let next = if u64::from(page) < total_pages {
            Some(Cursor::Page { page: page + 1 })
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

    fn eligible_item() -> Value {
        json!({
            "id": 27992,
            "main_reference_number": "1942.51",
            "is_public_domain": true,
            "image_id": "abc-123",
            "artwork_type_title": "Painting",
            "title": "A Sunday on La Grande Jatte"
        })
    }

    #[test]
    fn test_parse_page_keeps_eligible_items() {
        let body = json!({
            "pagination": {"total": 1, "total_pages": 1},
            "data": [eligible_item()]
        });
        let (items, total, pages) = AicConnector::parse_page(&body).unwrap();
        assert_eq!((total, pages), (1, 1));
        assert_eq!(items[0].external_id, "1942.51");
        assert_eq!(items[0].museum_db_id.as_deref(), Some("27992"));
    }

    #[test]
    fn test_filters_non_public_domain() {
        let mut item = eligible_item();
        item["is_public_domain"] = json!(false);
        assert!(!AicConnector::eligible(&item));
    }

    #[test]
    fn test_filters_missing_image_id() {
        let mut item = eligible_item();
        item["image_id"] = json!(null);
        assert!(!AicConnector::eligible(&item));
    }

    #[test]
    fn test_filters_missing_reference_number() {
        let mut item = eligible_item();
        item["main_reference_number"] = json!("");
        assert!(!AicConnector::eligible(&item));
    }

    #[test]
    fn test_filters_disallowed_artwork_type() {
        let mut item = eligible_item();
        item["artwork_type_title"] = json!("Sculpture");
        assert!(!AicConnector::eligible(&item));
    }

    #[test]
    fn test_allows_miniature_painting() {
        let mut item = eligible_item();
        item["artwork_type_title"] = json!("Miniature Painting");
        assert!(AicConnector::eligible(&item));
    }
}
