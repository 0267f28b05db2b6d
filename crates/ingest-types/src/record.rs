//! Raw and canonical artwork records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hash::content_hash;
use crate::slot::{EmbeddingSlot, Modality};
use crate::source::SourceSlug;

/// Latest raw payload fetched for one `(source, external_id)` pair.
///
/// Raw records are only ever upserted, never deleted: a failed downstream run
/// can always resume from the stored payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// Which museum this payload came from
    pub source: SourceSlug,
    /// The source's own stable identifier for the artwork
    pub external_id: String,
    /// Opaque secondary identifier some sources require for deep links
    pub museum_db_id: Option<String>,
    /// The payload as fetched (JSON, or the XML envelope converted to JSON)
    pub payload: Value,
    /// SHA-256 of the deterministically serialized payload
    pub content_hash: String,
    /// When this payload was last fetched
    pub fetched_at: DateTime<Utc>,
}

impl RawRecord {
    /// Build a raw record from a freshly fetched payload, stamping the
    /// content hash and fetch time.
    pub fn new(
        source: SourceSlug,
        external_id: impl Into<String>,
        museum_db_id: Option<String>,
        payload: Value,
    ) -> Self {
        let content_hash = content_hash(&payload);
        Self {
            source,
            external_id: external_id.into(),
            museum_db_id,
            payload,
            content_hash,
            fetched_at: Utc::now(),
        }
    }
}

/// Canonical artwork record, keyed by `(source, object_number)`.
///
/// Created by the canonicalizer; each downstream stage mutates only its own
/// completion/failure flags (plus, for the image stage, the thumbnail-URL
/// hash it owns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Which museum this record belongs to
    pub source: SourceSlug,
    /// Display-stable identifier within this pipeline
    pub object_number: String,
    /// The raw-store key this record was derived from (duplicate policy anchor)
    pub external_id: String,
    /// Opaque secondary identifier for deep links
    pub museum_db_id: Option<String>,

    /// Primary title, if any
    pub title: Option<String>,
    /// Artist names, best effort
    #[serde(default)]
    pub artists: Vec<String>,
    /// Raw work-type labels as the source provides them
    #[serde(default)]
    pub work_types: Vec<String>,
    /// Standardized searchable work-type tags (non-empty by construction)
    pub searchable_work_types: Vec<String>,
    /// Production date range, best effort
    pub production_date_start: Option<i32>,
    pub production_date_end: Option<i32>,
    /// Human-readable period label
    pub period: Option<String>,

    /// Source thumbnail URL (required: feeds the image materializer)
    pub thumbnail_url: String,
    /// Full-resolution image URL, if the source provides one
    pub image_url: Option<String>,
    /// Museum website deep link
    pub frontend_url: Option<String>,
    /// Source API deep link for this object
    pub object_url: Option<String>,

    /// Hash of the raw payload this record was derived from (staleness pointer)
    pub source_raw_hash: String,
    /// Hash of the thumbnail URL at last successful materialization
    pub thumbnail_url_hash: Option<String>,

    /// Image materializer completion flag
    #[serde(default)]
    pub image_loaded: bool,
    /// Image materializer permanent-failure flag
    #[serde(default)]
    pub image_load_failed: bool,
    /// Per-slot embedding completion flags
    #[serde(default)]
    pub vector_loaded: BTreeMap<EmbeddingSlot, bool>,
    /// Embedding indexer permanent-failure flag
    #[serde(default)]
    pub embedding_load_failed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CanonicalRecord {
    /// Whether the given slot's embedding has been computed and upserted.
    pub fn slot_loaded(&self, slot: EmbeddingSlot) -> bool {
        self.vector_loaded.get(&slot).copied().unwrap_or(false)
    }

    /// Mark a slot's embedding as upserted.
    pub fn set_slot_loaded(&mut self, slot: EmbeddingSlot, loaded: bool) {
        self.vector_loaded.insert(slot, loaded);
    }

    /// Whether any slot at all has been loaded (the indexed point likely
    /// already exists, so its vectors must be merged before upsert).
    pub fn any_slot_loaded(&self) -> bool {
        self.vector_loaded.values().any(|v| *v)
    }

    /// Active slots still missing for this record.
    pub fn missing_slots(&self, active: &[EmbeddingSlot]) -> Vec<EmbeddingSlot> {
        active
            .iter()
            .copied()
            .filter(|slot| !self.slot_loaded(*slot))
            .collect()
    }

    /// Clear completion flags for image-derived slots.
    ///
    /// Called when the thumbnail is re-materialized: the image bytes changed,
    /// so image embeddings are stale, but text-derived slots are unaffected.
    pub fn invalidate_image_slots(&mut self) {
        for slot in EmbeddingSlot::ALL {
            if slot.modality() == Modality::Image && self.slot_loaded(slot) {
                self.vector_loaded.insert(slot, false);
            }
        }
    }

    /// Carry forward stage-owned state from a previous version of this record.
    ///
    /// The canonicalizer replaces metadata on update but must not reset
    /// downstream completion flags: whether the image or embeddings need
    /// rework is decided by the stages that own those flags, via the
    /// thumbnail-URL hash.
    pub fn carry_over_flags(&mut self, previous: &CanonicalRecord) {
        self.thumbnail_url_hash = previous.thumbnail_url_hash.clone();
        self.image_loaded = previous.image_loaded;
        self.image_load_failed = previous.image_load_failed;
        self.vector_loaded = previous.vector_loaded.clone();
        self.embedding_load_failed = previous.embedding_load_failed;
        self.created_at = previous.created_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> CanonicalRecord {
        let now = Utc::now();
        CanonicalRecord {
            source: SourceSlug::Smk,
            object_number: "KMS1".to_string(),
            external_id: "KMS1".to_string(),
            museum_db_id: Some("1170000000".to_string()),
            title: Some("Landscape".to_string()),
            artists: vec!["Test Artist".to_string()],
            work_types: vec!["maleri".to_string()],
            searchable_work_types: vec!["painting".to_string()],
            production_date_start: Some(1650),
            production_date_end: Some(1655),
            period: None,
            thumbnail_url: "https://example.com/thumb.jpg".to_string(),
            image_url: None,
            frontend_url: None,
            object_url: None,
            source_raw_hash: "abc".to_string(),
            thumbnail_url_hash: None,
            image_loaded: false,
            image_load_failed: false,
            vector_loaded: BTreeMap::new(),
            embedding_load_failed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_raw_record_stamps_hash() {
        let payload = json!({"object_number": "KMS1"});
        let record = RawRecord::new(SourceSlug::Smk, "KMS1", None, payload.clone());
        assert_eq!(record.content_hash, content_hash(&payload));
    }

    #[test]
    fn test_slot_flags_default_unloaded() {
        let record = sample_record();
        assert!(!record.slot_loaded(EmbeddingSlot::ImageClip));
        assert!(!record.any_slot_loaded());
    }

    #[test]
    fn test_missing_slots() {
        let mut record = sample_record();
        record.set_slot_loaded(EmbeddingSlot::ImageClip, true);

        let active = [EmbeddingSlot::ImageClip, EmbeddingSlot::ImageJina];
        assert_eq!(record.missing_slots(&active), vec![EmbeddingSlot::ImageJina]);
    }

    #[test]
    fn test_invalidate_image_slots_spares_text() {
        let mut record = sample_record();
        record.set_slot_loaded(EmbeddingSlot::ImageClip, true);
        record.set_slot_loaded(EmbeddingSlot::TextClip, true);

        record.invalidate_image_slots();

        assert!(!record.slot_loaded(EmbeddingSlot::ImageClip));
        assert!(record.slot_loaded(EmbeddingSlot::TextClip));
    }

    #[test]
    fn test_carry_over_flags() {
        let mut previous = sample_record();
        previous.image_loaded = true;
        previous.thumbnail_url_hash = Some("hash".to_string());
        previous.set_slot_loaded(EmbeddingSlot::ImageClip, true);

        let mut fresh = sample_record();
        fresh.title = Some("Renamed".to_string());
        fresh.carry_over_flags(&previous);

        assert!(fresh.image_loaded);
        assert_eq!(fresh.thumbnail_url_hash.as_deref(), Some("hash"));
        assert!(fresh.slot_loaded(EmbeddingSlot::ImageClip));
        assert_eq!(fresh.title.as_deref(), Some("Renamed"));
    }
}
