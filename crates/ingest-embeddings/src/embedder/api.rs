//! Hosted inference-API embedder.
//!
//! Speaks the Jina embeddings wire format: one request per input, the model
//! truncating to the slot's dimensionality via the `dimensions` field. Image
//! inputs are passed as URLs; the API fetches the bytes server-side.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ingest_types::{config::EmbeddingSettings, EmbeddingSlot};

use super::{Embedder, EmbeddingInput};
use crate::error::EmbeddingError;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    dimensions: usize,
    input: [RequestInput<'a>; 1],
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestInput<'a> {
    Image { image: &'a str },
    Text { text: &'a str },
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct InferenceApiEmbedder {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl InferenceApiEmbedder {
    pub fn from_settings(
        settings: &EmbeddingSettings,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl Embedder for InferenceApiEmbedder {
    async fn embed(
        &self,
        slot: EmbeddingSlot,
        input: EmbeddingInput<'_>,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: &self.model,
            dimensions: slot.dimension(),
            input: [match input {
                EmbeddingInput::ImageUrl(url) => RequestInput::Image { image: url },
                EmbeddingInput::Text(text) => RequestInput::Text { text },
            }],
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                url: self.api_url.clone(),
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Envelope(e.to_string()))?;
        let vector = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::Envelope("empty data array".to_string()))?;

        if vector.len() != slot.dimension() {
            return Err(EmbeddingError::Envelope(format!(
                "expected {} dims for {}, got {}",
                slot.dimension(),
                slot,
                vector.len()
            )));
        }

        debug!(slot = %slot, dims = vector.len(), "Computed embedding");
        Ok(vector)
    }
}
