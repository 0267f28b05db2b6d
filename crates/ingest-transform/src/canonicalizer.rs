//! The per-source capability trait and the shared validation skeleton.

use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use ingest_types::{CanonicalRecord, RawRecord, SourceSlug};

use crate::vocabulary::searchable_work_types;

/// Source-specific field extraction. One implementation per museum; the
/// validation flow around these calls is shared and identical for all.
pub trait Canonicalizer: Send + Sync {
    fn source(&self) -> SourceSlug;

    /// The stable public identifier for this artwork.
    fn object_number(&self, raw: &RawRecord) -> Option<String>;

    /// Source-specific ineligibility check; returns the skip reason.
    fn should_skip(&self, payload: &Value) -> Option<String> {
        let _ = payload;
        None
    }

    fn thumbnail_url(&self, payload: &Value) -> Option<String>;

    fn work_types(&self, payload: &Value) -> Vec<String>;

    fn title(&self, payload: &Value) -> Option<String>;

    fn artists(&self, payload: &Value) -> Vec<String>;

    /// `(start_year, end_year)`, best effort.
    fn production_dates(&self, payload: &Value) -> (Option<i32>, Option<i32>);

    fn period(&self, payload: &Value) -> Option<String> {
        let _ = payload;
        None
    }

    /// Full-resolution image URL, when the source provides one.
    fn image_url(&self, payload: &Value) -> Option<String> {
        let _ = payload;
        None
    }

    /// Museum website deep link.
    fn frontend_url(&self, payload: &Value, object_number: &str) -> Option<String>;

    /// Source API deep link.
    fn object_url(&self, raw: &RawRecord, object_number: &str) -> Option<String>;
}

/// Run the shared validation flow and build a canonical record.
///
/// `Err(reason)` is a skip: the record is ineligible, not broken. Stage
/// flags on the returned record are all fresh; the runner carries over
/// previous flags on update.
pub fn build_canonical(
    canonicalizer: &dyn Canonicalizer,
    raw: &RawRecord,
) -> Result<CanonicalRecord, String> {
    let source = canonicalizer.source();

    let object_number = canonicalizer
        .object_number(raw)
        .ok_or_else(|| "missing object number".to_string())?;

    if let Some(reason) = canonicalizer.should_skip(&raw.payload) {
        return Err(reason);
    }

    let thumbnail_url = canonicalizer
        .thumbnail_url(&raw.payload)
        .ok_or_else(|| "missing thumbnail url".to_string())?;

    let work_types = canonicalizer.work_types(&raw.payload);
    let searchable = searchable_work_types(&work_types);
    if searchable.is_empty() {
        debug!(
            source = %source,
            object_number = %object_number,
            work_types = ?work_types,
            "No searchable work types"
        );
        return Err("no searchable work types".to_string());
    }

    let (production_date_start, production_date_end) =
        canonicalizer.production_dates(&raw.payload);

    let now = Utc::now();
    Ok(CanonicalRecord {
        source,
        object_number: object_number.clone(),
        external_id: raw.external_id.clone(),
        museum_db_id: raw.museum_db_id.clone(),
        title: canonicalizer.title(&raw.payload),
        artists: canonicalizer.artists(&raw.payload),
        work_types,
        searchable_work_types: searchable,
        production_date_start,
        production_date_end,
        period: canonicalizer.period(&raw.payload),
        thumbnail_url,
        image_url: canonicalizer.image_url(&raw.payload),
        frontend_url: canonicalizer.frontend_url(&raw.payload, &object_number),
        object_url: canonicalizer.object_url(raw, &object_number),
        source_raw_hash: raw.content_hash.clone(),
        thumbnail_url_hash: None,
        image_loaded: false,
        image_load_failed: false,
        vector_loaded: BTreeMap::new(),
        embedding_load_failed: false,
        created_at: now,
        updated_at: now,
    })
}
