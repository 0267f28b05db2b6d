//! Per-source canonicalizers. A closed set: adding a museum means adding a
//! module here and a registry entry.

pub mod aic;
pub mod cma;
pub mod met;
pub mod rma;
pub mod smk;

pub use aic::AicCanonicalizer;
pub use cma::CmaCanonicalizer;
pub use met::MetCanonicalizer;
pub use rma::RmaCanonicalizer;
pub use smk::SmkCanonicalizer;
