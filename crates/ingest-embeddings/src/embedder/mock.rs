//! Mock embedder for testing.

use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use ingest_types::EmbeddingSlot;

use super::{Embedder, EmbeddingInput};
use crate::error::EmbeddingError;

/// Deterministic embedder for tests: the vector is derived from the input
/// text, so equal inputs embed equally and different inputs differ.
pub struct MockEmbedder {
    unsupported: Vec<EmbeddingSlot>,
    fail_with_status: Option<u16>,
    calls: Mutex<Vec<(EmbeddingSlot, String)>>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            unsupported: Vec::new(),
            fail_with_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Slots this mock refuses to serve.
    pub fn with_unsupported(mut self, slots: Vec<EmbeddingSlot>) -> Self {
        self.unsupported = slots;
        self
    }

    /// Fail every call with the given HTTP status.
    pub fn with_status_failure(mut self, status: u16) -> Self {
        self.fail_with_status = Some(status);
        self
    }

    /// Every `(slot, input)` pair embedded so far.
    pub fn calls(&self) -> Vec<(EmbeddingSlot, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(
        &self,
        slot: EmbeddingSlot,
        input: EmbeddingInput<'_>,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let text = match input {
            EmbeddingInput::ImageUrl(url) => url,
            EmbeddingInput::Text(text) => text,
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((slot, text.to_string()));
        }

        if let Some(status) = self.fail_with_status {
            return Err(EmbeddingError::Status {
                status,
                url: "mock://embedder".to_string(),
            });
        }
        if self.unsupported.contains(&slot) {
            return Err(EmbeddingError::UnsupportedSlot(slot));
        }

        let digest = Sha256::digest(text.as_bytes());
        let vector = (0..slot.dimension())
            .map(|n| f32::from(digest[n % digest.len()]) / 255.0)
            .collect();
        Ok(vector)
    }
}
