//! Metropolitan Museum of Art canonicalizer.

use serde_json::Value;

use ingest_types::{RawRecord, SourceSlug};

use crate::canonicalizer::Canonicalizer;
use crate::util::non_empty_str;

pub struct MetCanonicalizer;

/// Classification labels to standardized work-type names. Labels arrive as
/// an "&"-joined list ("Paintings & Drawings"); unknown labels fall back to
/// the object name.
const CLASSIFICATION_TO_WORK_TYPE: &[(&str, &str)] = &[
    ("paintings", "painting"),
    ("miniatures", "miniature"),
    ("pastels", "pastel"),
    ("oil sketches on paper", "oil sketch on paper"),
    ("drawings", "drawing"),
    ("prints", "print"),
];

fn year_number(payload: &Value, key: &str) -> Option<i32> {
    payload
        .get(key)
        .and_then(Value::as_i64)
        .filter(|y| *y != 0)
        .map(|y| y as i32)
}

impl Canonicalizer for MetCanonicalizer {
    fn source(&self) -> SourceSlug {
        SourceSlug::Met
    }

    fn object_number(&self, raw: &RawRecord) -> Option<String> {
        raw.payload
            .get("accessionNumber")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn should_skip(&self, payload: &Value) -> Option<String> {
        let public_domain = payload
            .get("isPublicDomain")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !public_domain {
            return Some("not public domain".to_string());
        }
        None
    }

    fn thumbnail_url(&self, payload: &Value) -> Option<String> {
        payload
            .get("primaryImageSmall")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn work_types(&self, payload: &Value) -> Vec<String> {
        let classification = payload
            .get("classification")
            .and_then(non_empty_str)
            .unwrap_or("");
        let mut types: Vec<String> = classification
            .split('&')
            .map(|part| part.trim().to_lowercase())
            .filter(|part| !part.is_empty())
            .map(|part| {
                CLASSIFICATION_TO_WORK_TYPE
                    .iter()
                    .find(|(label, _)| *label == part)
                    .map(|(_, wt)| wt.to_string())
                    .unwrap_or(part)
            })
            .collect();
        if types.is_empty() {
            if let Some(name) = payload.get("objectName").and_then(non_empty_str) {
                types.push(name.to_lowercase());
            }
        }
        types
    }

    fn title(&self, payload: &Value) -> Option<String> {
        payload
            .get("title")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn artists(&self, payload: &Value) -> Vec<String> {
        let constituents: Vec<String> = payload
            .get("constituents")
            .and_then(Value::as_array)
            .map(|constituents| {
                constituents
                    .iter()
                    .filter_map(|c| c.get("name").and_then(non_empty_str))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();
        if !constituents.is_empty() {
            return constituents;
        }
        payload
            .get("artistDisplayName")
            .and_then(non_empty_str)
            .map(|s| vec![s.to_string()])
            .unwrap_or_default()
    }

    fn production_dates(&self, payload: &Value) -> (Option<i32>, Option<i32>) {
        (
            year_number(payload, "objectBeginDate"),
            year_number(payload, "objectEndDate"),
        )
    }

    fn period(&self, payload: &Value) -> Option<String> {
        payload
            .get("period")
            .and_then(non_empty_str)
            .or_else(|| payload.get("objectDate").and_then(non_empty_str))
            .map(|s| s.to_string())
    }

    fn image_url(&self, payload: &Value) -> Option<String> {
        payload
            .get("primaryImage")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn frontend_url(&self, payload: &Value, _object_number: &str) -> Option<String> {
        payload
            .get("objectURL")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
            .or_else(|| {
                payload
                    .get("objectID")
                    .and_then(Value::as_i64)
                    .map(|id| format!("https://www.metmuseum.org/art/collection/search/{}", id))
            })
    }

    fn object_url(&self, raw: &RawRecord, _object_number: &str) -> Option<String> {
        Some(format!(
            "https://collectionapi.metmuseum.org/public/collection/v1/objects/{}",
            raw.external_id
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalizer::build_canonical;
    use serde_json::json;

    fn raw(payload: Value) -> RawRecord {
        RawRecord::new(SourceSlug::Met, "436535", None, payload)
    }

    fn full_payload() -> Value {
        json!({
            "objectID": 436535,
            "accessionNumber": "49.30",
            "isPublicDomain": true,
            "primaryImage": "https://images.metmuseum.org/CRDImages/ep/original/DT1567.jpg",
            "primaryImageSmall": "https://images.metmuseum.org/CRDImages/ep/web-large/DT1567.jpg",
            "title": "Wheat Field with Cypresses",
            "classification": "Paintings",
            "objectName": "Painting",
            "constituents": [{"name": "Vincent van Gogh"}],
            "artistDisplayName": "Vincent van Gogh",
            "objectBeginDate": 1889,
            "objectEndDate": 1889,
            "period": "",
            "objectDate": "1889",
            "objectURL": "https://www.metmuseum.org/art/collection/search/436535"
        })
    }

    #[test]
    fn test_full_record() {
        let record = build_canonical(&MetCanonicalizer, &raw(full_payload())).unwrap();
        assert_eq!(record.object_number, "49.30");
        assert_eq!(record.artists, vec!["Vincent van Gogh"]);
        assert_eq!(record.work_types, vec!["painting"]);
        assert_eq!(record.production_date_start, Some(1889));
        assert_eq!(record.period.as_deref(), Some("1889"));
        assert_eq!(
            record.object_url.as_deref(),
            Some("https://collectionapi.metmuseum.org/public/collection/v1/objects/436535")
        );
    }

    #[test]
    fn test_not_public_domain_is_skip() {
        let mut payload = full_payload();
        payload["isPublicDomain"] = json!(false);
        let err = build_canonical(&MetCanonicalizer, &raw(payload)).unwrap_err();
        assert_eq!(err, "not public domain");
    }

    #[test]
    fn test_compound_classification_splits() {
        let mut payload = full_payload();
        payload["classification"] = json!("Drawings & Prints");
        let record = build_canonical(&MetCanonicalizer, &raw(payload)).unwrap();
        assert_eq!(record.work_types, vec!["drawing", "print"]);
        assert_eq!(record.searchable_work_types, vec!["drawing", "print"]);
    }

    #[test]
    fn test_object_name_fallback() {
        let mut payload = full_payload();
        payload["classification"] = json!("");
        let record = build_canonical(&MetCanonicalizer, &raw(payload)).unwrap();
        assert_eq!(record.work_types, vec!["painting"]);
    }

    #[test]
    fn test_generated_frontend_url_fallback() {
        let mut payload = full_payload();
        payload.as_object_mut().unwrap().remove("objectURL");
        let record = build_canonical(&MetCanonicalizer, &raw(payload)).unwrap();
        assert_eq!(
            record.frontend_url.as_deref(),
            Some("https://www.metmuseum.org/art/collection/search/436535")
        );
    }
}
