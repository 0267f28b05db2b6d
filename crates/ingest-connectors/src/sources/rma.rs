//! Rijksmuseum Amsterdam (RMA) connector.
//!
//! Token-paged collection search, one pass per work type. Each search hit is
//! only a reference; the full record comes from the OAI-PMH GetRecord
//! endpoint as XML, converted to JSON by the bridge. The record's
//! `dc:identifier` is the stable object number and becomes the raw-store key.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use ingest_types::{config::ExtractionSettings, SourceSlug};

use crate::connector::{FetchedPage, RawItem, SourceConnector};
use crate::cursor::Cursor;
use crate::error::ConnectorError;
use crate::http::HttpSource;
use crate::xml::xml_to_value;

const BASE_SEARCH_URL: &str = "https://data.rijksmuseum.nl/search/collection";
const GET_RECORD_URL: &str =
    "https://data.rijksmuseum.nl/oai?verb=GetRecord&metadataPrefix=edm&identifier=https://id.rijksmuseum.nl/";

const WORK_TYPES: &[&str] = &["painting", "drawing"];

pub struct RmaConnector {
    http: HttpSource,
    settings: ExtractionSettings,
    search_url: String,
    record_url: String,
}

impl RmaConnector {
    pub fn new(http: HttpSource, settings: ExtractionSettings) -> Self {
        Self {
            http,
            settings,
            search_url: BASE_SEARCH_URL.to_string(),
            record_url: GET_RECORD_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_urls(mut self, search_url: impl Into<String>, record_url: impl Into<String>) -> Self {
        self.search_url = search_url.into();
        self.record_url = record_url.into();
        self
    }

    /// Parse one search response: item ids, total, and the next page token.
    fn parse_page(body: &Value) -> Result<(Vec<String>, u64, Option<String>), ConnectorError> {
        let total = body
            .pointer("/partOf/totalItems")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let items = body
            .get("orderedItems")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ConnectorError::Envelope("RMA response missing orderedItems".to_string())
            })?;

        let ids = items
            .iter()
            .filter_map(|item| item.get("id").and_then(Value::as_str))
            .filter_map(|id| id.rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(|id| id.to_string())
            .collect();

        let next_token = body
            .pointer("/next/id")
            .and_then(Value::as_str)
            .and_then(|url| query_param(url, "pageToken"))
            .filter(|token| !token.trim().is_empty());

        Ok((ids, total, next_token))
    }

    /// Fetch one OAI-PMH record and key it by its object number.
    async fn fetch_record(&self, item_id: &str) -> Result<Option<RawItem>, ConnectorError> {
        let url = format!("{}{}", self.record_url, item_id);
        let xml = self.http.get_text(&url).await?;
        let doc = xml_to_value(&xml)?;

        let record = match doc.pointer("/OAI-PMH/GetRecord/record") {
            Some(record) => record.clone(),
            None => {
                warn!(item_id = item_id, "RMA GetRecord envelope missing record");
                return Ok(None);
            }
        };

        let Some(object_number) = record_object_number(&record) else {
            warn!(item_id = item_id, "Skipping RMA item without object number");
            return Ok(None);
        };

        Ok(Some(RawItem {
            external_id: object_number,
            museum_db_id: Some(item_id.to_string()),
            payload: record,
        }))
    }
}

#[async_trait]
impl SourceConnector for RmaConnector {
    fn source(&self) -> SourceSlug {
        SourceSlug::Rma
    }

    async fn fetch_page(&self, cursor: Option<Cursor>) -> Result<FetchedPage, ConnectorError> {
        let (segment, token) = match cursor {
            None => (0, String::new()),
            Some(Cursor::Token { segment, token }) => (segment, token),
            Some(other) => {
                return Err(ConnectorError::Envelope(format!(
                    "RMA cannot resume from cursor {}",
                    other.describe()
                )))
            }
        };
        let work_type = WORK_TYPES[segment];

        let query = [("type", work_type.to_string()), ("pageToken", token)];
        let body = self.http.get_json(&self.search_url, &query).await?;
        let (ids, total, next_token) = Self::parse_page(&body)?;
        debug!(
            work_type = work_type,
            total = total,
            count = ids.len(),
            "Fetched RMA search page"
        );

        let mut items = Vec::with_capacity(ids.len());
        for (n, item_id) in ids.iter().enumerate() {
            if n > 0 {
                tokio::time::sleep(self.settings.item_delay()).await;
            }
            match self.fetch_record(item_id).await {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => warn!(item_id = %item_id, error = %e, "Skipping RMA record"),
            }
        }

        let next = match next_token {
            Some(token) => Some(Cursor::Token { segment, token }),
            None if segment + 1 < WORK_TYPES.len() => Some(Cursor::Token {
                segment: segment + 1,
                token: String::new(),
            }),
            None => None,
        };

        Ok(FetchedPage {
            items,
            next,
            total: Some(total),
        })
    }
}

/// Pull `dc:identifier` out of the record's ProvidedCHO section.
///
/// The ProvidedCHO node appears either inside the aggregation or at the top
/// of the RDF block, depending on the record.
fn record_object_number(record: &Value) -> Option<String> {
    let rdf = record.pointer("/metadata/rdf:RDF")?;
    let provided_cho = rdf
        .pointer("/ore:Aggregation/edm:aggregatedCHO/edm:ProvidedCHO")
        .or_else(|| rdf.get("edm:ProvidedCHO"))?;
    provided_cho
        .get("dc:identifier")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Extract a query parameter from a URL without a full URL parser.
fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
