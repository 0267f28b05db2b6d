//! Source connectors for the five museum APIs, plus the extraction runner.
//!
//! Each connector implements [`SourceConnector`]: `fetch_page(cursor)` returns
//! a page of raw items and the cursor for the next page. Cursors are
//! segment-aware, so sources that iterate work-type or department passes
//! resume mid-run without restarting earlier segments. The runner drives a
//! connector to exhaustion, upserting every item into the raw store.

pub mod connector;
pub mod cursor;
pub mod error;
pub mod http;
pub mod runner;
pub mod sources;
pub mod xml;

pub use connector::{FetchedPage, RawItem, SourceConnector};
pub use cursor::Cursor;
pub use error::ConnectorError;
pub use http::HttpSource;
pub use runner::{ExtractionRunner, FetchHistory, NoFetchHistory, StorageFetchHistory};
pub use sources::connector_for;
