//! Embedding indexer batch service.
//!
//! For each canonical record with a materialized image, computes the active
//! slots still missing, merges them with whatever the index already holds for
//! the point, and upserts the full multi-vector point. Per-slot completion
//! flags on the record make slot activation incremental and resumable.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use ingest_embeddings::{classify as embedding_classify, Embedder, EmbeddingInput};
use ingest_images::{object_key, ObjectStore};
use ingest_storage::Storage;
use ingest_types::{
    point_id, retry_with_backoff, BatchStats, CanonicalRecord, EmbeddingSlot, Modality,
    ProcessOutcome, RetryError, RetryPolicy, SourceSlug,
};

use crate::client::VectorIndex;
use crate::error::{classify as index_classify, IndexError};
use crate::point::build_point;

pub struct EmbeddingIndexer {
    storage: Arc<Storage>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ObjectStore>,
    policy: RetryPolicy,
    active_slots: Vec<EmbeddingSlot>,
}

/// Text input for text-modality slots.
fn metadata_text(record: &CanonicalRecord) -> String {
    let mut parts = Vec::new();
    if let Some(title) = &record.title {
        parts.push(title.clone());
    }
    if !record.artists.is_empty() {
        parts.push(record.artists.join(", "));
    }
    if !record.searchable_work_types.is_empty() {
        parts.push(record.searchable_work_types.join(", "));
    }
    parts.join("; ")
}

impl EmbeddingIndexer {
    pub fn new(
        storage: Arc<Storage>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn ObjectStore>,
        policy: RetryPolicy,
        active_slots: Vec<EmbeddingSlot>,
    ) -> Self {
        Self {
            storage,
            index,
            embedder,
            store,
            policy,
            active_slots,
        }
    }

    /// Create the collection if needed. Call once before the first batch.
    pub async fn ensure_collection(&self) -> Result<(), IndexError> {
        self.index.ensure_collection().await
    }

    /// Process one page of canonical records.
    ///
    /// Returns the batch counts and the cursor for the next page.
    pub async fn run_batch(
        &self,
        source: Option<SourceSlug>,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<(BatchStats, Option<String>), IndexError> {
        let page = self.storage.scan_canonical(source, cursor, limit)?;
        let mut stats = BatchStats::new();

        for record in &page.items {
            let outcome = self.process_one(record).await?;
            stats.record_process(outcome);
        }

        info!(stats = %stats, "Embedding batch complete");
        Ok((stats, page.next_cursor))
    }

    async fn process_one(&self, record: &CanonicalRecord) -> Result<ProcessOutcome, IndexError> {
        if !record.image_loaded || record.embedding_load_failed {
            return Ok(ProcessOutcome::Skipped);
        }
        let missing = record.missing_slots(&self.active_slots);
        if missing.is_empty() {
            return Ok(ProcessOutcome::Skipped);
        }
        debug!(
            source = %record.source,
            object_number = %record.object_number,
            slots = ?missing,
            "Computing missing slots"
        );

        let image_url = self
            .store
            .public_url(&object_key(record.source, &record.object_number));
        let text = metadata_text(record);

        let mut computed = BTreeMap::new();
        for slot in &missing {
            let input = match slot.modality() {
                Modality::Image => EmbeddingInput::ImageUrl(&image_url),
                Modality::Text => EmbeddingInput::Text(&text),
            };
            let vector = match retry_with_backoff(&self.policy, embedding_classify, || {
                self.embedder.embed(*slot, input)
            })
            .await
            {
                Ok(vector) => vector,
                Err(RetryError::Permanent(e)) => {
                    warn!(
                        source = %record.source,
                        object_number = %record.object_number,
                        slot = %slot,
                        error = %e,
                        "Embedding failed permanently"
                    );
                    self.mark_failed(record)?;
                    return Ok(ProcessOutcome::PermanentFailure);
                }
                Err(RetryError::Exhausted(e)) => {
                    warn!(
                        source = %record.source,
                        object_number = %record.object_number,
                        slot = %slot,
                        error = %e,
                        "Embedding failed, will retry next scan"
                    );
                    return Ok(ProcessOutcome::Error);
                }
            };
            computed.insert(*slot, vector);
        }

        let id = point_id(record.source, &record.object_number);

        // The point may already hold vectors from earlier activations; fetch
        // them so the upsert does not zero them out.
        let existing = if record.any_slot_loaded() {
            match retry_with_backoff(&self.policy, index_classify, || self.index.get_vectors(id))
                .await
            {
                Ok(existing) => existing,
                Err(e) => return self.index_failure(record, e),
            }
        } else {
            None
        };

        let point = build_point(record, &computed, existing.as_ref());
        if let Err(e) =
            retry_with_backoff(&self.policy, index_classify, || self.index.upsert_point(&point))
                .await
        {
            return self.index_failure(record, e);
        }

        let mut updated = record.clone();
        for slot in &missing {
            updated.set_slot_loaded(*slot, true);
        }
        updated.updated_at = Utc::now();
        self.storage.put_canonical(&updated)?;

        Ok(ProcessOutcome::Success)
    }

    fn index_failure(
        &self,
        record: &CanonicalRecord,
        error: RetryError<IndexError>,
    ) -> Result<ProcessOutcome, IndexError> {
        warn!(
            source = %record.source,
            object_number = %record.object_number,
            error = %error,
            "Index operation failed"
        );
        if error.is_permanent() {
            self.mark_failed(record)?;
            Ok(ProcessOutcome::PermanentFailure)
        } else {
            Ok(ProcessOutcome::Error)
        }
    }

    fn mark_failed(&self, record: &CanonicalRecord) -> Result<(), IndexError> {
        let mut failed = record.clone();
        failed.embedding_load_failed = true;
        failed.updated_at = Utc::now();
        self.storage.put_canonical(&failed)?;
        Ok(())
    }
}
