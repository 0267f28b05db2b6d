//! Column family definitions for RocksDB.
//!
//! Each column family isolates data with different access patterns:
//! - raw: latest payload per (source, external_id), upsert-heavy
//! - canonical: canonical artwork records, read-modify-write by stage

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for raw museum payloads
pub const CF_RAW: &str = "raw";

/// Column family name for canonical artwork records
pub const CF_CANONICAL: &str = "canonical";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_RAW, CF_CANONICAL];

/// Create column family options for raw payloads (large values, compressed)
fn raw_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_RAW, raw_options()),
        ColumnFamilyDescriptor::new(CF_CANONICAL, Options::default()),
    ]
}
