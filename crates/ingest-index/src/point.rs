//! Index point construction.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use uuid::Uuid;

use ingest_types::{point_id, CanonicalRecord, EmbeddingSlot};

/// One multi-vector point ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPoint {
    pub id: Uuid,
    /// One vector per declared slot, zero placeholders included.
    pub vectors: BTreeMap<EmbeddingSlot, Vec<f32>>,
    pub payload: Value,
}

/// Human-readable production date for the payload.
fn production_date_label(record: &CanonicalRecord) -> Option<String> {
    if let Some(period) = &record.period {
        return Some(period.clone());
    }
    match (record.production_date_start, record.production_date_end) {
        (Some(start), Some(end)) if start == end => Some(start.to_string()),
        (Some(start), Some(end)) => Some(format!("{}-{}", start, end)),
        (Some(year), None) | (None, Some(year)) => Some(year.to_string()),
        (None, None) => None,
    }
}

/// Build the point for a record.
///
/// Every declared slot gets a vector: freshly `computed` ones win, then
/// `existing` vectors carried over from the index, then zero placeholders.
/// Activating a new slot therefore never clobbers the others.
pub fn build_point(
    record: &CanonicalRecord,
    computed: &BTreeMap<EmbeddingSlot, Vec<f32>>,
    existing: Option<&BTreeMap<EmbeddingSlot, Vec<f32>>>,
) -> IndexPoint {
    let mut vectors = BTreeMap::new();
    for slot in EmbeddingSlot::ALL {
        let vector = computed
            .get(&slot)
            .or_else(|| existing.and_then(|e| e.get(&slot)))
            .cloned()
            .unwrap_or_else(|| slot.zero_vector());
        vectors.insert(slot, vector);
    }

    let payload = json!({
        "museum": record.source.as_str(),
        "object_number": record.object_number,
        "title": record.title,
        "artist": record.artists,
        "production_date": production_date_label(record),
        "work_types": record.work_types,
        "searchable_work_types": record.searchable_work_types,
        "thumbnail_url": record.thumbnail_url,
        "frontend_url": record.frontend_url,
    });

    IndexPoint {
        id: point_id(record.source, &record.object_number),
        vectors,
        payload,
    }
}
