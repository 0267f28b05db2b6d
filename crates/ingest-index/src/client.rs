//! Vector index seam and the Qdrant REST implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use ingest_types::{config::QdrantSettings, EmbeddingSlot};

use crate::error::IndexError;
use crate::point::IndexPoint;

/// The multi-vector point index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection with all declared slots if it does not exist.
    async fn ensure_collection(&self) -> Result<(), IndexError>;

    /// Insert or fully replace one point.
    async fn upsert_point(&self, point: &IndexPoint) -> Result<(), IndexError>;

    /// Fetch a point's stored vectors, `None` when the point does not exist.
    async fn get_vectors(
        &self,
        id: Uuid,
    ) -> Result<Option<BTreeMap<EmbeddingSlot, Vec<f32>>>, IndexError>;
}

pub struct QdrantClient {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    api_key: Option<SecretString>,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    result: Vec<RetrievedPoint>,
}

#[derive(Deserialize)]
struct RetrievedPoint {
    vector: Option<Map<String, Value>>,
}

impl QdrantClient {
    pub fn from_settings(
        settings: &QdrantSettings,
        timeout: std::time::Duration,
    ) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            collection: settings.collection.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key.expose_secret());
        }
        builder
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
        url: &str,
    ) -> Result<reqwest::Response, IndexError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(IndexError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantClient {
    async fn ensure_collection(&self) -> Result<(), IndexError> {
        let url = self.collection_url();
        let response = self.request(reqwest::Method::GET, &url).send().await?;
        if response.status().is_success() {
            debug!(collection = %self.collection, "Collection exists");
            return Ok(());
        }
        if response.status().as_u16() != 404 {
            return Err(IndexError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let mut vectors = Map::new();
        for slot in EmbeddingSlot::ALL {
            vectors.insert(
                slot.name().to_string(),
                json!({"size": slot.dimension(), "distance": "Cosine"}),
            );
        }
        let body = json!({"vectors": vectors});

        let response = self
            .request(reqwest::Method::PUT, &url)
            .json(&body)
            .send()
            .await?;
        self.check_status(response, &url).await?;
        info!(collection = %self.collection, "Created collection");
        Ok(())
    }

    async fn upsert_point(&self, point: &IndexPoint) -> Result<(), IndexError> {
        let url = format!("{}/points?wait=true", self.collection_url());

        let mut vector = Map::new();
        for (slot, values) in &point.vectors {
            vector.insert(slot.name().to_string(), json!(values));
        }
        let body = json!({
            "points": [{
                "id": point.id.to_string(),
                "vector": vector,
                "payload": point.payload,
            }]
        });

        let response = self
            .request(reqwest::Method::PUT, &url)
            .json(&body)
            .send()
            .await?;
        self.check_status(response, &url).await?;
        debug!(id = %point.id, "Upserted point");
        Ok(())
    }

    async fn get_vectors(
        &self,
        id: Uuid,
    ) -> Result<Option<BTreeMap<EmbeddingSlot, Vec<f32>>>, IndexError> {
        let url = format!("{}/points", self.collection_url());
        let body = json!({
            "ids": [id.to_string()],
            "with_payload": false,
            "with_vector": true,
        });

        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&body)
            .send()
            .await?;
        let response = self.check_status(response, &url).await?;
        let parsed: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Envelope(e.to_string()))?;

        let Some(point) = parsed.result.into_iter().next() else {
            return Ok(None);
        };
        let Some(named) = point.vector else {
            return Ok(Some(BTreeMap::new()));
        };

        let mut vectors = BTreeMap::new();
        for slot in EmbeddingSlot::ALL {
            if let Some(values) = named.get(slot.name()) {
                let vector: Vec<f32> = serde_json::from_value(values.clone())
                    .map_err(|e| IndexError::Envelope(e.to_string()))?;
                vectors.insert(slot, vector);
            }
        }
        Ok(Some(vectors))
    }
}
