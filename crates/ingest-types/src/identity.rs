//! Deterministic vector-index point identity.

use uuid::Uuid;

use crate::source::SourceSlug;

/// Deterministic UUIDv5 point id for an artwork.
///
/// The same `(source, object_number)` always maps to the same point, so
/// re-ingestion updates the existing point instead of duplicating it, and the
/// id survives database resets and environment moves.
pub fn point_id(source: SourceSlug, object_number: &str) -> Uuid {
    let name = format!("{}-{}", source.as_str(), object_number);
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes())
}
