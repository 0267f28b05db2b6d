//! Named embedding slots carried by each indexed point.
//!
//! The vector collection declares every known slot up front so new slots can
//! be activated later without recreating the collection. Inactive slots hold
//! zero vectors until their embeddings are computed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Input modality an embedding slot is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    /// Derived from the materialized thumbnail image.
    Image,
    /// Derived from record metadata text.
    Text,
}

/// One named vector type within a multi-vector index point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingSlot {
    /// CLIP image embedding (768 dims)
    ImageClip,
    /// CLIP text embedding (768 dims)
    TextClip,
    /// Jina CLIP v2 image embedding (256 dims)
    ImageJina,
    /// Jina CLIP v2 text embedding (256 dims)
    TextJina,
}

impl EmbeddingSlot {
    /// Every slot the collection declares, in stable order.
    pub const ALL: [EmbeddingSlot; 4] = [
        EmbeddingSlot::ImageClip,
        EmbeddingSlot::TextClip,
        EmbeddingSlot::ImageJina,
        EmbeddingSlot::TextJina,
    ];

    /// The named-vector key used in the collection schema and point upserts.
    pub fn name(&self) -> &'static str {
        match self {
            EmbeddingSlot::ImageClip => "image_clip",
            EmbeddingSlot::TextClip => "text_clip",
            EmbeddingSlot::ImageJina => "image_jina",
            EmbeddingSlot::TextJina => "text_jina",
        }
    }

    /// Vector dimensionality declared at collection creation.
    pub fn dimension(&self) -> usize {
        match self {
            EmbeddingSlot::ImageClip | EmbeddingSlot::TextClip => 768,
            EmbeddingSlot::ImageJina | EmbeddingSlot::TextJina => 256,
        }
    }

    /// Which input the slot's embedding is computed from.
    pub fn modality(&self) -> Modality {
        match self {
            EmbeddingSlot::ImageClip | EmbeddingSlot::ImageJina => Modality::Image,
            EmbeddingSlot::TextClip | EmbeddingSlot::TextJina => Modality::Text,
        }
    }

    /// A zero vector of this slot's dimensionality (placeholder for
    /// not-yet-populated slots).
    pub fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.dimension()]
    }
}

impl fmt::Display for EmbeddingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmbeddingSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image_clip" => Ok(EmbeddingSlot::ImageClip),
            "text_clip" => Ok(EmbeddingSlot::TextClip),
            "image_jina" => Ok(EmbeddingSlot::ImageJina),
            "text_jina" => Ok(EmbeddingSlot::TextJina),
            other => Err(format!("unknown embedding slot: {}", other)),
        }
    }
}
