//! The five museum connectors and their registry.

mod aic;
mod cma;
mod met;
mod rma;
mod smk;

pub use aic::AicConnector;
pub use cma::CmaConnector;
pub use met::MetConnector;
pub use rma::RmaConnector;
pub use smk::SmkConnector;

use std::sync::Arc;

use ingest_types::{config::ExtractionSettings, SourceSlug};

use crate::connector::SourceConnector;
use crate::http::HttpSource;
use crate::runner::FetchHistory;

/// Build the connector for a source slug.
///
/// `history` backs the MET connector's skip-recently-fetched window; the
/// other connectors ignore it.
pub fn connector_for(
    source: SourceSlug,
    http: HttpSource,
    settings: &ExtractionSettings,
    history: Arc<dyn FetchHistory>,
) -> Box<dyn SourceConnector> {
    match source {
        SourceSlug::Smk => Box::new(SmkConnector::new(http, settings.clone())),
        SourceSlug::Cma => Box::new(CmaConnector::new(http, settings.clone())),
        SourceSlug::Met => Box::new(MetConnector::new(http, settings.clone(), history)),
        SourceSlug::Rma => Box::new(RmaConnector::new(http, settings.clone())),
        SourceSlug::Aic => Box::new(AicConnector::new(http, settings.clone())),
    }
}

/// Read a non-empty string field from a JSON value.
pub(crate) fn non_empty_str(value: &serde_json::Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}
