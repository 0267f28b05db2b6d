//! Shared HTTP client for museum APIs.
//!
//! All page and item fetches go through [`HttpSource`], which applies the
//! request timeout and the shared retry helper with connector-specific error
//! classification.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use ingest_types::{retry_with_backoff, RetryPolicy};

use crate::error::{classify, ConnectorError};

/// HTTP client shared by the connectors.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    policy: RetryPolicy,
}

impl HttpSource {
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self, ConnectorError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, policy })
    }

    /// GET a JSON document, retrying transient failures.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ConnectorError> {
        retry_with_backoff(&self.policy, classify, || async {
            debug!(url = url, "GET (json)");
            let response = self.client.get(url).query(query).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ConnectorError::Status {
                    status,
                    url: url.to_string(),
                });
            }
            Ok(response.json::<Value>().await?)
        })
        .await
        .map_err(|e| e.into_inner())
    }

    /// GET a raw text body, retrying transient failures. Used for the
    /// OAI-PMH XML endpoint.
    pub async fn get_text(&self, url: &str) -> Result<String, ConnectorError> {
        retry_with_backoff(&self.policy, classify, || async {
            debug!(url = url, "GET (text)");
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ConnectorError::Status {
                    status,
                    url: url.to_string(),
                });
            }
            Ok(response.text().await?)
        })
        .await
        .map_err(|e| e.into_inner())
    }
}
