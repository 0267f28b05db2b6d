//! Image materializer batch service.
//!
//! Decides per canonical record whether its thumbnail needs (re)materializing,
//! downloads and normalizes the bytes, stores them, and updates the record's
//! image flags. The decision keys off the thumbnail-URL hash, not metadata
//! changes: a retitled artwork whose thumbnail URL is unchanged costs nothing
//! here.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use ingest_storage::Storage;
use ingest_types::{
    retry_with_backoff, url_hash, BatchStats, CanonicalRecord, ProcessOutcome, RetryError,
    RetryPolicy, SourceSlug,
};

use crate::error::{classify, ImageError};
use crate::fetch::ImageFetcher;
use crate::resize::resize_to_jpeg;
use crate::store::{object_key, ObjectStore};

pub struct ImageLoader {
    storage: Arc<Storage>,
    store: Arc<dyn ObjectStore>,
    fetcher: Arc<dyn ImageFetcher>,
    policy: RetryPolicy,
    max_dimension: u32,
    jpeg_quality: u8,
}

impl ImageLoader {
    pub fn new(
        storage: Arc<Storage>,
        store: Arc<dyn ObjectStore>,
        fetcher: Arc<dyn ImageFetcher>,
        policy: RetryPolicy,
        max_dimension: u32,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            storage,
            store,
            fetcher,
            policy,
            max_dimension,
            jpeg_quality,
        }
    }

    /// Process one page of canonical records.
    ///
    /// Returns the batch counts and the cursor for the next page.
    pub async fn run_batch(
        &self,
        source: Option<SourceSlug>,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<(BatchStats, Option<String>), ImageError> {
        let page = self.storage.scan_canonical(source, cursor, limit)?;
        let mut stats = BatchStats::new();

        for record in &page.items {
            let outcome = self.process_one(record).await?;
            stats.record_process(outcome);
        }

        info!(stats = %stats, "Image batch complete");
        Ok((stats, page.next_cursor))
    }

    async fn process_one(&self, record: &CanonicalRecord) -> Result<ProcessOutcome, ImageError> {
        if record.image_load_failed {
            return Ok(ProcessOutcome::Skipped);
        }

        let key = object_key(record.source, &record.object_number);
        let current_hash = url_hash(&record.thumbnail_url);

        if record.thumbnail_url_hash.as_deref() == Some(current_hash.as_str()) {
            // Same URL as last materialization; redo only if the stored
            // object has gone missing.
            match self.store.exists(&key).await {
                Ok(true) => return Ok(ProcessOutcome::Skipped),
                Ok(false) => {
                    debug!(key = key, "Stored object missing, rematerializing");
                }
                Err(e) => {
                    warn!(key = key, error = %e, "Object store check failed");
                    return Ok(ProcessOutcome::Error);
                }
            }
        }

        let url = record.thumbnail_url.clone();
        let bytes = match retry_with_backoff(&self.policy, classify, || self.fetcher.fetch(&url))
            .await
        {
            Ok(bytes) => bytes,
            Err(RetryError::Permanent(e)) => {
                warn!(
                    source = %record.source,
                    object_number = %record.object_number,
                    error = %e,
                    "Thumbnail download failed permanently"
                );
                self.mark_failed(record)?;
                return Ok(ProcessOutcome::PermanentFailure);
            }
            Err(RetryError::Exhausted(e)) => {
                warn!(
                    source = %record.source,
                    object_number = %record.object_number,
                    error = %e,
                    "Thumbnail download failed, will retry next scan"
                );
                return Ok(ProcessOutcome::Error);
            }
        };

        let jpeg = match resize_to_jpeg(&bytes, self.max_dimension, self.jpeg_quality) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!(
                    source = %record.source,
                    object_number = %record.object_number,
                    error = %e,
                    "Thumbnail bytes not decodable"
                );
                self.mark_failed(record)?;
                return Ok(ProcessOutcome::PermanentFailure);
            }
        };

        if let Err(e) = self.store.put(&key, jpeg).await {
            warn!(key = key, error = %e, "Object store put failed");
            return Ok(ProcessOutcome::Error);
        }

        let mut updated = record.clone();
        updated.image_loaded = true;
        updated.image_load_failed = false;
        updated.thumbnail_url_hash = Some(current_hash);
        // The stored image bytes changed, so image-derived embeddings are
        // stale. Text-derived slots are untouched.
        updated.invalidate_image_slots();
        updated.updated_at = Utc::now();
        self.storage.put_canonical(&updated)?;

        Ok(ProcessOutcome::Success)
    }

    fn mark_failed(&self, record: &CanonicalRecord) -> Result<(), ImageError> {
        let mut failed = record.clone();
        failed.image_load_failed = true;
        failed.updated_at = Utc::now();
        self.storage.put_canonical(&failed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::collections::BTreeMap;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;
    use tempfile::TempDir;

    use ingest_types::EmbeddingSlot;

    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                objects: Mutex::new(HashMap::new()),
            }
        }

        fn get(&self, key: &str) -> Option<Vec<u8>> {
            self.objects.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), ImageError> {
            self.objects.lock().unwrap().insert(key.to_string(), body);
            Ok(())
        }

        async fn exists(&self, key: &str) -> Result<bool, ImageError> {
            Ok(self.objects.lock().unwrap().contains_key(key))
        }

        fn public_url(&self, key: &str) -> String {
            format!("https://store.test/{}", key)
        }
    }

    enum FetchScript {
        Bytes(Vec<u8>),
        Status(u16),
    }

    struct ScriptedFetcher {
        script: FetchScript,
        calls: Mutex<usize>,
    }

    impl ScriptedFetcher {
        fn bytes(bytes: Vec<u8>) -> Self {
            Self {
                script: FetchScript::Bytes(bytes),
                calls: Mutex::new(0),
            }
        }

        fn status(status: u16) -> Self {
            Self {
                script: FetchScript::Status(status),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ImageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
            *self.calls.lock().unwrap() += 1;
            match &self.script {
                FetchScript::Bytes(bytes) => Ok(bytes.clone()),
                FetchScript::Status(status) => Err(ImageError::Status {
                    status: *status,
                    url: url.to_string(),
                }),
            }
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn sample_record(object_number: &str, thumbnail_url: &str) -> CanonicalRecord {
        let now = Utc::now();
        CanonicalRecord {
            source: SourceSlug::Smk,
            object_number: object_number.to_string(),
            external_id: object_number.to_string(),
            museum_db_id: None,
            title: Some("Landscape".to_string()),
            artists: vec!["Artist".to_string()],
            work_types: vec!["maleri".to_string()],
            searchable_work_types: vec!["painting".to_string()],
            production_date_start: Some(1650),
            production_date_end: Some(1655),
            period: None,
            thumbnail_url: thumbnail_url.to_string(),
            image_url: None,
            frontend_url: None,
            object_url: None,
            source_raw_hash: "hash".to_string(),
            thumbnail_url_hash: None,
            image_loaded: false,
            image_load_failed: false,
            vector_loaded: BTreeMap::new(),
            embedding_load_failed: false,
            created_at: now,
            updated_at: now,
        }
    }

    struct Fixture {
        _dir: TempDir,
        storage: Arc<Storage>,
        store: Arc<MemoryStore>,
        fetcher: Arc<ScriptedFetcher>,
        loader: ImageLoader,
    }

    fn fixture(fetcher: ScriptedFetcher) -> Fixture {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(dir.path()).unwrap());
        let store = Arc::new(MemoryStore::new());
        let fetcher = Arc::new(fetcher);
        let loader = ImageLoader::new(
            storage.clone(),
            store.clone(),
            fetcher.clone(),
            RetryPolicy::default().with_max_attempts(2),
            800,
            85,
        );
        Fixture {
            _dir: dir,
            storage,
            store,
            fetcher,
            loader,
        }
    }

    #[tokio::test]
    async fn test_materializes_and_flags_record() {
        let f = fixture(ScriptedFetcher::bytes(png_bytes(3000, 1000)));
        let record = sample_record("KMS1", "https://museum.test/kms1.jpg");
        f.storage.put_canonical(&record).unwrap();

        let (stats, _) = f.loader.run_batch(None, None, 10).await.unwrap();
        assert_eq!(stats.success, 1);

        let stored = f.store.get("smk_KMS1.jpg").unwrap();
        let img = image::load_from_memory(&stored).unwrap();
        assert_eq!((img.width(), img.height()), (800, 266));

        let updated = f.storage.get_canonical(SourceSlug::Smk, "KMS1").unwrap().unwrap();
        assert!(updated.image_loaded);
        assert_eq!(
            updated.thumbnail_url_hash.as_deref(),
            Some(url_hash("https://museum.test/kms1.jpg").as_str())
        );
    }

    #[tokio::test]
    async fn test_unchanged_url_with_stored_object_is_skipped() {
        let f = fixture(ScriptedFetcher::bytes(png_bytes(100, 100)));
        let record = sample_record("KMS1", "https://museum.test/kms1.jpg");
        f.storage.put_canonical(&record).unwrap();

        f.loader.run_batch(None, None, 10).await.unwrap();
        let (stats, _) = f.loader.run_batch(None, None, 10).await.unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(f.fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_metadata_change_does_not_retrigger_materialization() {
        let f = fixture(ScriptedFetcher::bytes(png_bytes(100, 100)));
        let record = sample_record("KMS1", "https://museum.test/kms1.jpg");
        f.storage.put_canonical(&record).unwrap();
        f.loader.run_batch(None, None, 10).await.unwrap();

        // Metadata churn without a thumbnail change.
        let mut retitled = f.storage.get_canonical(SourceSlug::Smk, "KMS1").unwrap().unwrap();
        retitled.title = Some("Renamed".to_string());
        retitled.source_raw_hash = "other-hash".to_string();
        f.storage.put_canonical(&retitled).unwrap();

        let (stats, _) = f.loader.run_batch(None, None, 10).await.unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(f.fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_url_change_rematerializes_and_invalidates_image_slots() {
        let f = fixture(ScriptedFetcher::bytes(png_bytes(100, 100)));
        let mut record = sample_record("KMS1", "https://museum.test/kms1-v2.jpg");
        record.image_loaded = true;
        record.thumbnail_url_hash = Some(url_hash("https://museum.test/kms1-v1.jpg"));
        record.set_slot_loaded(EmbeddingSlot::ImageClip, true);
        record.set_slot_loaded(EmbeddingSlot::TextClip, true);
        f.storage.put_canonical(&record).unwrap();

        let (stats, _) = f.loader.run_batch(None, None, 10).await.unwrap();
        assert_eq!(stats.success, 1);

        let updated = f.storage.get_canonical(SourceSlug::Smk, "KMS1").unwrap().unwrap();
        assert!(!updated.slot_loaded(EmbeddingSlot::ImageClip));
        assert!(updated.slot_loaded(EmbeddingSlot::TextClip));
        assert_eq!(
            updated.thumbnail_url_hash.as_deref(),
            Some(url_hash("https://museum.test/kms1-v2.jpg").as_str())
        );
    }

    #[tokio::test]
    async fn test_missing_stored_object_is_rematerialized() {
        let f = fixture(ScriptedFetcher::bytes(png_bytes(100, 100)));
        let mut record = sample_record("KMS1", "https://museum.test/kms1.jpg");
        record.image_loaded = true;
        record.thumbnail_url_hash = Some(url_hash("https://museum.test/kms1.jpg"));
        f.storage.put_canonical(&record).unwrap();

        let (stats, _) = f.loader.run_batch(None, None, 10).await.unwrap();
        assert_eq!(stats.success, 1);
        assert!(f.store.get("smk_KMS1.jpg").is_some());
    }

    #[tokio::test]
    async fn test_permanent_failure_sets_flag_and_later_skips() {
        let f = fixture(ScriptedFetcher::status(404));
        let record = sample_record("KMS1", "https://museum.test/gone.jpg");
        f.storage.put_canonical(&record).unwrap();

        let (stats, _) = f.loader.run_batch(None, None, 10).await.unwrap();
        assert_eq!(stats.permanent_failures, 1);
        assert_eq!(f.fetcher.call_count(), 1);

        let updated = f.storage.get_canonical(SourceSlug::Smk, "KMS1").unwrap().unwrap();
        assert!(updated.image_load_failed);
        assert!(!updated.image_loaded);

        let (stats, _) = f.loader.run_batch(None, None, 10).await.unwrap();
        assert_eq!(stats.skipped, 1);
    }

    #[tokio::test]
    async fn test_transient_failure_leaves_flags_for_next_scan() {
        let f = fixture(ScriptedFetcher::status(503));
        let record = sample_record("KMS1", "https://museum.test/flaky.jpg");
        f.storage.put_canonical(&record).unwrap();

        let (stats, _) = f.loader.run_batch(None, None, 10).await.unwrap();
        assert_eq!(stats.errors, 1);
        assert_eq!(f.fetcher.call_count(), 2);

        let updated = f.storage.get_canonical(SourceSlug::Smk, "KMS1").unwrap().unwrap();
        assert!(!updated.image_load_failed);
        assert!(!updated.image_loaded);
    }

    #[tokio::test]
    async fn test_undecodable_bytes_are_permanent() {
        let f = fixture(ScriptedFetcher::bytes(b"not an image".to_vec()));
        let record = sample_record("KMS1", "https://museum.test/broken.jpg");
        f.storage.put_canonical(&record).unwrap();

        let (stats, _) = f.loader.run_batch(None, None, 10).await.unwrap();
        assert_eq!(stats.permanent_failures, 1);

        let updated = f.storage.get_canonical(SourceSlug::Smk, "KMS1").unwrap().unwrap();
        assert!(updated.image_load_failed);
    }
}
