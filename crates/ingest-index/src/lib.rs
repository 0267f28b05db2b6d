//! Vector index integration: the Qdrant REST client, multi-vector point
//! construction with zero-vector placeholders, and the embedding indexer
//! batch service.

pub mod client;
pub mod error;
pub mod point;
pub mod service;

pub use client::{QdrantClient, VectorIndex};
pub use error::{classify, IndexError};
pub use point::{build_point, IndexPoint};
pub use service::EmbeddingIndexer;
