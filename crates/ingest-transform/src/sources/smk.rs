//! SMK canonicalizer.

use serde_json::Value;

use ingest_types::{RawRecord, SourceSlug};

use crate::canonicalizer::Canonicalizer;
use crate::util::{non_empty_str, year_from_text};

pub struct SmkCanonicalizer;

impl Canonicalizer for SmkCanonicalizer {
    fn source(&self) -> SourceSlug {
        SourceSlug::Smk
    }

    fn object_number(&self, raw: &RawRecord) -> Option<String> {
        raw.payload
            .get("object_number")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn thumbnail_url(&self, payload: &Value) -> Option<String> {
        payload
            .get("image_thumbnail")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn work_types(&self, payload: &Value) -> Vec<String> {
        payload
            .get("object_names")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.get("name").and_then(non_empty_str))
                    .map(|name| name.to_lowercase())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn title(&self, payload: &Value) -> Option<String> {
        // First title entry is the primary one.
        payload
            .get("titles")
            .and_then(Value::as_array)
            .and_then(|titles| titles.first())
            .and_then(|t| t.get("title"))
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn artists(&self, payload: &Value) -> Vec<String> {
        payload
            .get("artist")
            .and_then(Value::as_array)
            .map(|artists| {
                artists
                    .iter()
                    .filter_map(non_empty_str)
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn production_dates(&self, payload: &Value) -> (Option<i32>, Option<i32>) {
        let Some(date) = payload
            .get("production_date")
            .and_then(Value::as_array)
            .and_then(|dates| dates.first())
        else {
            return (None, None);
        };
        let start = date.get("start").and_then(non_empty_str).and_then(year_from_text);
        let end = date.get("end").and_then(non_empty_str).and_then(year_from_text);
        (start, end)
    }

    fn period(&self, payload: &Value) -> Option<String> {
        payload
            .get("production_date")
            .and_then(Value::as_array)
            .and_then(|dates| dates.first())
            .and_then(|d| d.get("period"))
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn image_url(&self, payload: &Value) -> Option<String> {
        payload
            .get("image_iiif_id")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn frontend_url(&self, payload: &Value, object_number: &str) -> Option<String> {
        payload
            .get("frontend_url")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
            .or_else(|| {
                Some(format!(
                    "https://open.smk.dk/artwork/image/{}",
                    object_number.to_lowercase()
                ))
            })
    }

    fn object_url(&self, _raw: &RawRecord, object_number: &str) -> Option<String> {
        Some(format!(
            "https://api.smk.dk/api/v1/art/?object_number={}",
            object_number
        ))
    }
}
