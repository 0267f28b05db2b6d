//! Embedder trait and implementations.

mod api;
mod mock;

pub use api::InferenceApiEmbedder;
pub use mock::MockEmbedder;

use async_trait::async_trait;

use ingest_types::EmbeddingSlot;

use crate::error::EmbeddingError;

/// Input an embedding is computed from, matching the slot's modality.
#[derive(Debug, Clone, Copy)]
pub enum EmbeddingInput<'a> {
    /// Public URL of a materialized thumbnail; the inference API fetches it.
    ImageUrl(&'a str),
    /// Metadata text (title, artists, work types).
    Text(&'a str),
}

/// Computes one embedding vector per call.
///
/// Implementations must return a vector of exactly `slot.dimension()` floats
/// or an error; slots an implementation cannot serve fail with
/// [`EmbeddingError::UnsupportedSlot`].
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(
        &self,
        slot: EmbeddingSlot,
        input: EmbeddingInput<'_>,
    ) -> Result<Vec<f32>, EmbeddingError>;
}
