//! Storage layer for the artwork ingestion pipeline.
//!
//! RocksDB-backed with:
//! - Column family isolation for raw payloads and canonical records
//! - Composite string keys for stable-order prefix scans
//! - Hash-compared raw upserts for change detection
//! - Batched flag resets via WriteBatch

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use db::{Page, Storage, UpsertOutcome};
pub use error::StorageError;
pub use keys::{CanonicalKey, RawKey};
