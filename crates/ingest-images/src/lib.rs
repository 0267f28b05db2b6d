//! Image materializer: downloads artwork thumbnails, normalizes them to
//! bounded JPEGs, and stores them in an object store.
//!
//! Rework is keyed off the thumbnail-URL hash stored on the canonical
//! record, so metadata updates never force a re-download.

pub mod error;
pub mod fetch;
pub mod resize;
pub mod service;
pub mod store;

pub use error::{classify, ImageError};
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use resize::resize_to_jpeg;
pub use service::ImageLoader;
pub use store::{object_key, ObjectStore, S3ObjectStore};
