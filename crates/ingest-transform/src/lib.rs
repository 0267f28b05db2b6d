//! Canonicalizer: turns raw museum payloads into canonical artwork records.
//!
//! Each source implements the [`Canonicalizer`] capability trait; the shared
//! skeleton in [`canonicalizer`] runs the validation flow (object number,
//! skip rules, thumbnail, searchable work types) identically for every
//! source. The runner scans the raw store in stable key order, touching only
//! missing or stale records.

pub mod canonicalizer;
pub mod error;
pub mod registry;
pub mod runner;
pub mod sources;
pub mod util;
pub mod vocabulary;

pub use canonicalizer::{build_canonical, Canonicalizer};
pub use error::TransformError;
pub use registry::canonicalizer_for;
pub use runner::TransformRunner;
pub use vocabulary::searchable_work_types;
