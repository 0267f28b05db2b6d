//! Batch canonicalization over the raw store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use ingest_storage::Storage;
use ingest_types::{BatchStats, RawRecord, SourceSlug, TransformOutcome};

use crate::canonicalizer::build_canonical;
use crate::error::TransformError;
use crate::registry::canonicalizer_for;

/// Canonicalizes raw records page by page.
///
/// Stateless across batches: the caller threads the returned cursor back in
/// and stops when it comes back `None`.
pub struct TransformRunner {
    storage: Arc<Storage>,
}

impl TransformRunner {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Canonicalize one page of raw records.
    ///
    /// Returns the batch counts and the cursor for the next page.
    pub fn run_batch(
        &self,
        source: Option<SourceSlug>,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<(BatchStats, Option<String>), TransformError> {
        let page = self.storage.scan_raw(source, cursor, limit)?;
        let mut stats = BatchStats::new();

        for raw in &page.items {
            let outcome = self.transform_one(raw)?;
            if let TransformOutcome::Skipped(reason) = &outcome {
                debug!(
                    source = %raw.source,
                    external_id = %raw.external_id,
                    reason = %reason,
                    "Skipped raw record"
                );
            }
            stats.record_transform(&outcome);
        }

        info!(stats = %stats, "Transform batch complete");
        Ok((stats, page.next_cursor))
    }

    fn transform_one(&self, raw: &RawRecord) -> Result<TransformOutcome, TransformError> {
        let canonicalizer = canonicalizer_for(raw.source);

        let Some(object_number) = canonicalizer.object_number(raw) else {
            return Ok(TransformOutcome::skipped("missing object number"));
        };

        let existing = self.storage.get_canonical(raw.source, &object_number)?;

        // Keep-first: when two raw records claim the same object number,
        // the first one to canonicalize owns it.
        if let Some(existing) = &existing {
            if existing.external_id != raw.external_id {
                warn!(
                    source = %raw.source,
                    object_number = %object_number,
                    external_id = %raw.external_id,
                    owner = %existing.external_id,
                    "Object number already owned by another raw record"
                );
                return Ok(TransformOutcome::skipped(
                    "object number owned by another record",
                ));
            }
            if existing.source_raw_hash == raw.content_hash {
                return Ok(TransformOutcome::skipped("raw payload unchanged"));
            }
        }

        let mut record = match build_canonical(canonicalizer, raw) {
            Ok(record) => record,
            Err(reason) => return Ok(TransformOutcome::skipped(reason)),
        };

        let outcome = match &existing {
            Some(previous) => {
                record.carry_over_flags(previous);
                TransformOutcome::Updated
            }
            None => TransformOutcome::Created,
        };
        self.storage.put_canonical(&record)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn open_storage() -> (TempDir, Arc<Storage>) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(dir.path()).unwrap());
        (dir, storage)
    }

    fn smk_payload(object_number: &str, title: &str) -> Value {
        json!({
            "object_number": object_number,
            "image_thumbnail": format!("https://iip-thumb.smk.dk/{}.jpg", object_number),
            "object_names": [{"name": "maleri"}],
            "titles": [{"title": title}],
            "artist": ["Artist"],
            "production_date": [{"start": "1650-01-01", "end": "1655-01-01"}]
        })
    }

    fn store_raw(storage: &Storage, external_id: &str, payload: Value) {
        let raw = RawRecord::new(SourceSlug::Smk, external_id, None, payload);
        storage.upsert_raw(&raw).unwrap();
    }

    #[test]
    fn test_creates_canonical_records() {
        let (_dir, storage) = open_storage();
        store_raw(&storage, "KMS1", smk_payload("KMS1", "One"));
        store_raw(&storage, "KMS2", smk_payload("KMS2", "Two"));

        let runner = TransformRunner::new(storage.clone());
        let (stats, cursor) = runner.run_batch(Some(SourceSlug::Smk), None, 10).unwrap();

        assert_eq!(stats.created, 2);
        assert!(cursor.is_none());
        assert!(storage
            .get_canonical(SourceSlug::Smk, "KMS1")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_unchanged_raw_is_skipped_on_rerun() {
        let (_dir, storage) = open_storage();
        store_raw(&storage, "KMS1", smk_payload("KMS1", "One"));

        let runner = TransformRunner::new(storage.clone());
        runner.run_batch(Some(SourceSlug::Smk), None, 10).unwrap();
        let (stats, _) = runner.run_batch(Some(SourceSlug::Smk), None, 10).unwrap();

        assert_eq!(stats.created, 0);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_changed_raw_updates_and_carries_flags() {
        let (_dir, storage) = open_storage();
        store_raw(&storage, "KMS1", smk_payload("KMS1", "One"));

        let runner = TransformRunner::new(storage.clone());
        runner.run_batch(Some(SourceSlug::Smk), None, 10).unwrap();

        // Downstream stage marks its work done.
        let mut record = storage.get_canonical(SourceSlug::Smk, "KMS1").unwrap().unwrap();
        record.image_loaded = true;
        record.thumbnail_url_hash = Some("h".to_string());
        storage.put_canonical(&record).unwrap();

        store_raw(&storage, "KMS1", smk_payload("KMS1", "Renamed"));
        let (stats, _) = runner.run_batch(Some(SourceSlug::Smk), None, 10).unwrap();

        assert_eq!(stats.updated, 1);
        let updated = storage.get_canonical(SourceSlug::Smk, "KMS1").unwrap().unwrap();
        assert_eq!(updated.title.as_deref(), Some("Renamed"));
        assert!(updated.image_loaded);
        assert_eq!(updated.thumbnail_url_hash.as_deref(), Some("h"));
    }

    #[test]
    fn test_duplicate_object_number_keeps_first() {
        let (_dir, storage) = open_storage();
        store_raw(&storage, "KMS1", smk_payload("KMS1", "Original"));

        let runner = TransformRunner::new(storage.clone());
        runner.run_batch(Some(SourceSlug::Smk), None, 10).unwrap();

        // A different raw record claims the same object number.
        store_raw(&storage, "KMS1-dup", smk_payload("KMS1", "Impostor"));
        let (stats, _) = runner.run_batch(Some(SourceSlug::Smk), None, 10).unwrap();

        assert_eq!(stats.updated, 0);
        let record = storage.get_canonical(SourceSlug::Smk, "KMS1").unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some("Original"));
        assert_eq!(record.external_id, "KMS1");
    }

    #[test]
    fn test_ineligible_record_is_skipped_not_failed() {
        let (_dir, storage) = open_storage();
        let mut payload = smk_payload("KMS1", "One");
        payload["object_names"] = json!([{"name": "skulptur"}]);
        store_raw(&storage, "KMS1", payload);

        let runner = TransformRunner::new(storage.clone());
        let (stats, _) = runner.run_batch(Some(SourceSlug::Smk), None, 10).unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 0);
        assert!(storage
            .get_canonical(SourceSlug::Smk, "KMS1")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_cursor_pagination_covers_all_records() {
        let (_dir, storage) = open_storage();
        for n in 0..5 {
            let id = format!("KMS{}", n);
            store_raw(&storage, &id, smk_payload(&id, "T"));
        }

        let runner = TransformRunner::new(storage.clone());
        let mut total = BatchStats::new();
        let mut cursor: Option<String> = None;
        loop {
            let (stats, next) = runner
                .run_batch(Some(SourceSlug::Smk), cursor.as_deref(), 2)
                .unwrap();
            total.merge(&stats);
            match next {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        assert_eq!(total.created, 5);
        assert_eq!(storage.count_canonical(Some(SourceSlug::Smk)).unwrap(), 5);
    }
}
