//! # ingest-types
//!
//! Shared domain types for the artwork ingestion pipeline.
//!
//! This crate defines the core data structures used throughout the system:
//! - Records: raw museum payloads and canonical artwork records
//! - Slots: the named vector embeddings carried by each indexed point
//! - Outcomes: per-record results reported by each pipeline stage
//! - Retry: the shared transient/permanent retry helper
//! - Settings: layered configuration for all stages

pub mod config;
pub mod hash;
pub mod identity;
pub mod outcome;
pub mod record;
pub mod retry;
pub mod slot;
pub mod source;

pub use config::{ConfigError, Settings};
pub use hash::{content_hash, url_hash};
pub use identity::point_id;
pub use outcome::{BatchStats, ProcessOutcome, TransformOutcome};
pub use record::{CanonicalRecord, RawRecord};
pub use retry::{retry_with_backoff, FailureKind, RetryError, RetryPolicy};
pub use slot::{EmbeddingSlot, Modality};
pub use source::SourceSlug;
