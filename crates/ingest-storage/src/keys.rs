//! Key encoding and decoding for the storage layer.
//!
//! Key formats:
//! - raw: `raw:{source}:{external_id}`
//! - canonical: `can:{source}:{object_number}`
//!
//! Keys sort lexicographically, so a prefix scan over `raw:{source}:` visits
//! one source's records in a stable order, and full scans visit sources in
//! slug order. Identifiers never contain `:` in practice; the decoder still
//! tolerates it by splitting on the first two separators only.

use ingest_types::SourceSlug;

use crate::error::StorageError;

/// Key for raw payload storage
/// Format: raw:{source}:{external_id}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKey {
    pub source: SourceSlug,
    pub external_id: String,
}

impl RawKey {
    pub fn new(source: SourceSlug, external_id: impl Into<String>) -> Self {
        Self {
            source,
            external_id: external_id.into(),
        }
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("raw:{}:{}", self.source.as_str(), self.external_id).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        let (prefix, source, id) = split_key(s)?;
        if prefix != "raw" {
            return Err(StorageError::Key(format!("Invalid raw key format: {}", s)));
        }
        Ok(Self {
            source,
            external_id: id.to_string(),
        })
    }

    /// Prefix covering one source's raw records
    pub fn source_prefix(source: SourceSlug) -> Vec<u8> {
        format!("raw:{}:", source.as_str()).into_bytes()
    }

    /// Prefix covering all raw records
    pub fn all_prefix() -> Vec<u8> {
        b"raw:".to_vec()
    }
}

/// Key for canonical record storage
/// Format: can:{source}:{object_number}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalKey {
    pub source: SourceSlug,
    pub object_number: String,
}

impl CanonicalKey {
    pub fn new(source: SourceSlug, object_number: impl Into<String>) -> Self {
        Self {
            source,
            object_number: object_number.into(),
        }
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("can:{}:{}", self.source.as_str(), self.object_number).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        let (prefix, source, id) = split_key(s)?;
        if prefix != "can" {
            return Err(StorageError::Key(format!(
                "Invalid canonical key format: {}",
                s
            )));
        }
        Ok(Self {
            source,
            object_number: id.to_string(),
        })
    }

    /// Prefix covering one source's canonical records
    pub fn source_prefix(source: SourceSlug) -> Vec<u8> {
        format!("can:{}:", source.as_str()).into_bytes()
    }

    /// Prefix covering all canonical records
    pub fn all_prefix() -> Vec<u8> {
        b"can:".to_vec()
    }
}

/// Split `{prefix}:{source}:{rest}` on the first two separators.
fn split_key(s: &str) -> Result<(&str, SourceSlug, &str), StorageError> {
    let (prefix, rest) = s
        .split_once(':')
        .ok_or_else(|| StorageError::Key(format!("Invalid key format: {}", s)))?;
    let (slug, id) = rest
        .split_once(':')
        .ok_or_else(|| StorageError::Key(format!("Invalid key format: {}", s)))?;
    let source: SourceSlug = slug
        .parse()
        .map_err(|_| StorageError::Key(format!("Unknown source slug in key: {}", s)))?;
    Ok((prefix, source, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_key_roundtrip() {
        let key = RawKey::new(SourceSlug::Smk, "KMS1");
        let decoded = RawKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_canonical_key_roundtrip() {
        let key = CanonicalKey::new(SourceSlug::Met, "11.45.2");
        let decoded = CanonicalKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_external_id_with_separator_survives() {
        let key = RawKey::new(SourceSlug::Rma, "oai:rijksmuseum.nl:SK-A-1");
        let decoded = RawKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(decoded.external_id, "oai:rijksmuseum.nl:SK-A-1");
    }

    #[test]
    fn test_source_prefix_covers_source_keys_only() {
        let prefix = RawKey::source_prefix(SourceSlug::Cma);
        let inside = RawKey::new(SourceSlug::Cma, "123").to_bytes();
        let outside = RawKey::new(SourceSlug::Smk, "123").to_bytes();
        assert!(inside.starts_with(&prefix));
        assert!(!outside.starts_with(&prefix));
    }

    #[test]
    fn test_keys_sort_by_source_then_id() {
        let a = CanonicalKey::new(SourceSlug::Aic, "2").to_bytes();
        let b = CanonicalKey::new(SourceSlug::Aic, "3").to_bytes();
        let c = CanonicalKey::new(SourceSlug::Cma, "1").to_bytes();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        let raw = RawKey::new(SourceSlug::Smk, "KMS1").to_bytes();
        assert!(CanonicalKey::from_bytes(&raw).is_err());
    }
}
