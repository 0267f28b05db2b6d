//! RocksDB wrapper for the ingestion stores.
//!
//! Provides:
//! - Database open with column family setup
//! - Hash-compared raw upserts (unchanged payloads report no change)
//! - Cursor-based prefix scans in stable key order
//! - Batched flag resets via WriteBatch

use std::path::Path;

use rocksdb::{BoundColumnFamily, Direction, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;
use tracing::{debug, info};

use ingest_types::{CanonicalRecord, RawRecord, SourceSlug};

use crate::column_families::{build_cf_descriptors, CF_CANONICAL, CF_RAW};
use crate::error::StorageError;
use crate::keys::{CanonicalKey, RawKey};

/// One page of a cursor scan. `next_cursor` is present when the scan may have
/// more records; feed it back to continue from where this page ended.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of a raw upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// No record existed for this key before
    pub created: bool,
    /// The payload is new or its content hash differs from the stored one
    pub changed: bool,
}

/// Main storage interface for the ingestion pipeline
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    // ==================== Raw store ====================

    /// Upsert a raw record, comparing content hashes.
    ///
    /// The stored record is refreshed either way so `fetched_at` reflects the
    /// most recent fetch; `changed` reports whether downstream work is needed.
    pub fn upsert_raw(&self, record: &RawRecord) -> Result<UpsertOutcome, StorageError> {
        let cf = self.cf(CF_RAW)?;
        let key = RawKey::new(record.source, record.external_id.clone());

        let outcome = match self.db.get_cf(&cf, key.to_bytes())? {
            Some(existing) => {
                let existing: RawRecord = serde_json::from_slice(&existing)?;
                UpsertOutcome {
                    created: false,
                    changed: existing.content_hash != record.content_hash,
                }
            }
            None => UpsertOutcome {
                created: true,
                changed: true,
            },
        };

        let bytes = serde_json::to_vec(record)?;
        self.db.put_cf(&cf, key.to_bytes(), bytes)?;

        if outcome.changed {
            debug!(
                source = %record.source,
                external_id = %record.external_id,
                "Raw payload stored (new or changed)"
            );
        }
        Ok(outcome)
    }

    /// Get a raw record by source and external id
    pub fn get_raw(
        &self,
        source: SourceSlug,
        external_id: &str,
    ) -> Result<Option<RawRecord>, StorageError> {
        let cf = self.cf(CF_RAW)?;
        let key = RawKey::new(source, external_id);
        match self.db.get_cf(&cf, key.to_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Scan raw records in key order, optionally restricted to one source.
    pub fn scan_raw(
        &self,
        source: Option<SourceSlug>,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<RawRecord>, StorageError> {
        let prefix = match source {
            Some(s) => RawKey::source_prefix(s),
            None => RawKey::all_prefix(),
        };
        self.scan_prefix(CF_RAW, &prefix, cursor, limit)
    }

    /// Count raw records, optionally restricted to one source.
    pub fn count_raw(&self, source: Option<SourceSlug>) -> Result<usize, StorageError> {
        let prefix = match source {
            Some(s) => RawKey::source_prefix(s),
            None => RawKey::all_prefix(),
        };
        self.count_prefix(CF_RAW, &prefix)
    }

    // ==================== Canonical store ====================

    /// Store a canonical record, replacing any previous version.
    ///
    /// The record carries its stage flags, so one put updates metadata and
    /// flags atomically.
    pub fn put_canonical(&self, record: &CanonicalRecord) -> Result<(), StorageError> {
        let cf = self.cf(CF_CANONICAL)?;
        let key = CanonicalKey::new(record.source, record.object_number.clone());
        let bytes = serde_json::to_vec(record)?;
        self.db.put_cf(&cf, key.to_bytes(), bytes)?;
        Ok(())
    }

    /// Get a canonical record by source and object number
    pub fn get_canonical(
        &self,
        source: SourceSlug,
        object_number: &str,
    ) -> Result<Option<CanonicalRecord>, StorageError> {
        let cf = self.cf(CF_CANONICAL)?;
        let key = CanonicalKey::new(source, object_number);
        match self.db.get_cf(&cf, key.to_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Scan canonical records in key order, optionally restricted to one source.
    pub fn scan_canonical(
        &self,
        source: Option<SourceSlug>,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<CanonicalRecord>, StorageError> {
        let prefix = match source {
            Some(s) => CanonicalKey::source_prefix(s),
            None => CanonicalKey::all_prefix(),
        };
        self.scan_prefix(CF_CANONICAL, &prefix, cursor, limit)
    }

    /// Count canonical records, optionally restricted to one source.
    pub fn count_canonical(&self, source: Option<SourceSlug>) -> Result<usize, StorageError> {
        let prefix = match source {
            Some(s) => CanonicalKey::source_prefix(s),
            None => CanonicalKey::all_prefix(),
        };
        self.count_prefix(CF_CANONICAL, &prefix)
    }

    /// Clear image-stage flags so the materializer redoes its work.
    ///
    /// Returns the number of records reset.
    pub fn reset_image_flags(&self, source: Option<SourceSlug>) -> Result<usize, StorageError> {
        self.reset_flags(source, |record| {
            record.image_loaded = false;
            record.image_load_failed = false;
            record.thumbnail_url_hash = None;
        })
    }

    /// Clear embedding-stage flags so the indexer redoes its work.
    ///
    /// Returns the number of records reset.
    pub fn reset_embedding_flags(&self, source: Option<SourceSlug>) -> Result<usize, StorageError> {
        self.reset_flags(source, |record| {
            record.vector_loaded.clear();
            record.embedding_load_failed = false;
        })
    }

    fn reset_flags<F>(&self, source: Option<SourceSlug>, reset: F) -> Result<usize, StorageError>
    where
        F: Fn(&mut CanonicalRecord),
    {
        let cf = self.cf(CF_CANONICAL)?;
        let prefix = match source {
            Some(s) => CanonicalKey::source_prefix(s),
            None => CanonicalKey::all_prefix(),
        };

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut batch = WriteBatch::default();
        let mut count = 0;

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let mut record: CanonicalRecord = serde_json::from_slice(&value)?;
            reset(&mut record);
            batch.put_cf(&cf, key, serde_json::to_vec(&record)?);
            count += 1;
        }

        self.db.write(batch)?;
        info!(count = count, "Reset stage flags");
        Ok(count)
    }

    // ==================== Scan plumbing ====================

    fn scan_prefix<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        prefix: &[u8],
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<T>, StorageError> {
        let cf = self.cf(cf_name)?;

        // Resume strictly after the cursor key; start of prefix otherwise.
        let start: Vec<u8> = match cursor {
            Some(c) => {
                let mut bytes = c.as_bytes().to_vec();
                bytes.push(0);
                bytes
            }
            None => prefix.to_vec(),
        };

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&start, Direction::Forward));

        let mut items = Vec::new();
        let mut last_key: Option<String> = None;

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            items.push(serde_json::from_slice(&value)?);
            last_key = Some(
                String::from_utf8(key.to_vec())
                    .map_err(|e| StorageError::Key(format!("Invalid UTF-8 key: {}", e)))?,
            );
            if items.len() >= limit {
                break;
            }
        }

        let next_cursor = if items.len() >= limit { last_key } else { None };
        Ok(Page { items, next_cursor })
    }

    fn count_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<usize, StorageError> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut count = 0;
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }
}
