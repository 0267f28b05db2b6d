//! Embedding computation behind a pluggable [`Embedder`] seam.
//!
//! The indexer asks for one vector per missing slot; this crate turns that
//! request into an inference-API call (or a deterministic mock in tests).

pub mod embedder;
pub mod error;

pub use embedder::{Embedder, EmbeddingInput, InferenceApiEmbedder, MockEmbedder};
pub use error::{classify, EmbeddingError};
