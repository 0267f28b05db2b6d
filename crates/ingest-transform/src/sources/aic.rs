//! Art Institute of Chicago canonicalizer.

use serde_json::Value;

use ingest_types::{RawRecord, SourceSlug};

use crate::canonicalizer::Canonicalizer;
use crate::util::non_empty_str;

pub struct AicCanonicalizer;

/// Classifications that make "Drawing and Watercolor" keep its own
/// classification label instead of the generic "drawing".
const WATERCOLOR_CLASSIFICATIONS: &[&str] = &["watercolor", "pastel", "gouache", "aquatint"];

fn year_number(payload: &Value, key: &str) -> Option<i32> {
    payload.get(key).and_then(Value::as_i64).map(|y| y as i32)
}

impl Canonicalizer for AicCanonicalizer {
    fn source(&self) -> SourceSlug {
        SourceSlug::Aic
    }

    fn object_number(&self, raw: &RawRecord) -> Option<String> {
        raw.payload
            .get("main_reference_number")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn should_skip(&self, payload: &Value) -> Option<String> {
        let public_domain = payload
            .get("is_public_domain")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !public_domain {
            return Some("not public domain".to_string());
        }
        if payload.get("image_id").and_then(non_empty_str).is_none() {
            return Some("no image id".to_string());
        }
        None
    }

    fn thumbnail_url(&self, payload: &Value) -> Option<String> {
        let image_id = payload.get("image_id").and_then(non_empty_str)?;
        Some(format!(
            "https://www.artic.edu/iiif/2/{}/full/843,/0/default.jpg",
            image_id
        ))
    }

    fn work_types(&self, payload: &Value) -> Vec<String> {
        let artwork_type = payload
            .get("artwork_type_title")
            .and_then(non_empty_str)
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        let classification = payload
            .get("classification_title")
            .and_then(non_empty_str)
            .map(|s| s.to_lowercase());

        let mut types = Vec::new();
        match artwork_type.as_str() {
            "drawing and watercolor" => {
                // The artwork type is a bucket; the classification says
                // whether this is really a watercolor, pastel, etc.
                match &classification {
                    Some(c) if WATERCOLOR_CLASSIFICATIONS.contains(&c.as_str()) => {
                        types.push(c.clone());
                    }
                    _ => types.push("drawing".to_string()),
                }
            }
            "miniature painting" => {
                types.push("miniature".to_string());
                types.push("painting".to_string());
            }
            "" => {}
            other => types.push(other.to_string()),
        }
        if let Some(c) = classification {
            if !types.contains(&c) {
                types.push(c);
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
        payload
            .get("artist_title")
            .and_then(non_empty_str)
            .map(|s| vec![s.to_string()])
            .unwrap_or_default()
    }

    fn production_dates(&self, payload: &Value) -> (Option<i32>, Option<i32>) {
        (
            year_number(payload, "date_start"),
            year_number(payload, "date_end"),
        )
    }

    fn period(&self, payload: &Value) -> Option<String> {
        payload
            .get("date_display")
            .and_then(non_empty_str)
            .map(|s| s.to_string())
    }

    fn image_url(&self, payload: &Value) -> Option<String> {
        let image_id = payload.get("image_id").and_then(non_empty_str)?;
        Some(format!(
            "https://www.artic.edu/iiif/2/{}/full/full/0/default.jpg",
            image_id
        ))
    }

    fn frontend_url(&self, payload: &Value, _object_number: &str) -> Option<String> {
        payload
            .get("id")
            .and_then(Value::as_i64)
            .map(|id| format!("https://www.artic.edu/artworks/{}", id))
    }

    fn object_url(&self, raw: &RawRecord, _object_number: &str) -> Option<String> {
        Some(format!(
            "https://api.artic.edu/api/v1/artworks/{}",
            raw.external_id
        ))
    }
}
