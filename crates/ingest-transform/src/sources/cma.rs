//! Cleveland Museum of Art canonicalizer.

use serde_json::Value;

use ingest_types::{RawRecord, SourceSlug};

use crate::canonicalizer::Canonicalizer;
use crate::util::{non_empty_str, year_from_text};

pub struct CmaCanonicalizer;

fn year_field(payload: &Value, key: &str) -> Option<i32> {
    match payload.get(key)? {
        Value::Number(n) => n.as_i64().map(|y| y as i32),
        Value::String(s) => year_from_text(s),
        _ => None,
    }
}

impl Canonicalizer for CmaCanonicalizer {
    fn source(&self) -> SourceSlug {
        SourceSlug::Cma
    }

    fn object_number(&self, raw: &RawRecord) -> Option<String> {
        raw.payload
            .get("accession_number")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn thumbnail_url(&self, payload: &Value) -> Option<String> {
        payload
            .pointer("/images/web/url")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn work_types(&self, payload: &Value) -> Vec<String> {
        payload
            .get("type")
            .and_then(non_empty_str)
            .map(|t| vec![t.to_lowercase()])
            .unwrap_or_default()
    }

    fn title(&self, payload: &Value) -> Option<String> {
        payload
            .get("title")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn artists(&self, payload: &Value) -> Vec<String> {
        // Creator descriptions look like "Jan Steen (Dutch, 1626-1679)".
        // Keep the name part; fall back to the culture list when no
        // creator is recorded.
        let creators: Vec<String> = payload
            .get("creators")
            .and_then(Value::as_array)
            .map(|creators| {
                creators
                    .iter()
                    .filter_map(|c| c.get("description").and_then(non_empty_str))
                    .map(|desc| desc.split('(').next().unwrap_or(desc).trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if !creators.is_empty() {
            return creators;
        }
        payload
            .get("culture")
            .and_then(Value::as_array)
            .map(|cultures| {
                cultures
                    .iter()
                    .filter_map(non_empty_str)
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn production_dates(&self, payload: &Value) -> (Option<i32>, Option<i32>) {
        (
            year_field(payload, "creation_date_earliest"),
            year_field(payload, "creation_date_latest"),
        )
    }

    fn period(&self, payload: &Value) -> Option<String> {
        payload
            .get("creation_date")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn image_url(&self, payload: &Value) -> Option<String> {
        payload
            .pointer("/images/print/url")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn frontend_url(&self, payload: &Value, object_number: &str) -> Option<String> {
        payload
            .get("url")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
            .or_else(|| {
                Some(format!(
                    "https://clevelandart.org/art/{}",
                    object_number
                ))
            })
    }

    fn object_url(&self, _raw: &RawRecord, object_number: &str) -> Option<String> {
        Some(format!(
            "https://openaccess-api.clevelandart.org/api/artworks/?accession_number={}",
            object_number
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalizer::build_canonical;
    use serde_json::json;

    fn raw(payload: Value) -> RawRecord {
        RawRecord::new(SourceSlug::Cma, "1921.1239", Some("130234".to_string()), payload)
    }

    fn full_payload() -> Value {
        json!({
            "accession_number": "1921.1239",
            "title": "The Burning of the Houses of Parliament",
            "type": "Painting",
            "creators": [{"description": "J. M. W. Turner (British, 1775-1851)"}],
            "culture": ["England"],
            "creation_date": "1834-35",
            "creation_date_earliest": 1834,
            "creation_date_latest": 1835,
            "images": {
                "web": {"url": "https://openaccess-cdn.clevelandart.org/1921.1239/web.jpg"},
                "print": {"url": "https://openaccess-cdn.clevelandart.org/1921.1239/print.jpg"}
            },
            "url": "https://clevelandart.org/art/1921.1239"
        })
    }

    #[test]
    fn test_full_record() {
        let record = build_canonical(&CmaCanonicalizer, &raw(full_payload())).unwrap();
        assert_eq!(record.object_number, "1921.1239");
        assert_eq!(record.artists, vec!["J. M. W. Turner"]);
        assert_eq!(record.work_types, vec!["painting"]);
        assert_eq!(record.searchable_work_types, vec!["painting"]);
        assert_eq!(record.production_date_start, Some(1834));
        assert_eq!(record.production_date_end, Some(1835));
        assert_eq!(record.period.as_deref(), Some("1834-35"));
        assert!(record.image_url.as_deref().unwrap().ends_with("print.jpg"));
    }

    #[test]
    fn test_culture_fallback_when_no_creators() {
        let mut payload = full_payload();
        payload["creators"] = json!([]);
        let record = build_canonical(&CmaCanonicalizer, &raw(payload)).unwrap();
        assert_eq!(record.artists, vec!["England"]);
    }

    #[test]
    fn test_generated_frontend_url_fallback() {
        let mut payload = full_payload();
        payload.as_object_mut().unwrap().remove("url");
        let record = build_canonical(&CmaCanonicalizer, &raw(payload)).unwrap();
        assert_eq!(
            record.frontend_url.as_deref(),
            Some("https://clevelandart.org/art/1921.1239")
        );
    }

    #[test]
    fn test_missing_web_image_is_skip() {
        let mut payload = full_payload();
        payload["images"] = json!({});
        let err = build_canonical(&CmaCanonicalizer, &raw(payload)).unwrap_err();
        assert_eq!(err, "missing thumbnail url");
    }
}
