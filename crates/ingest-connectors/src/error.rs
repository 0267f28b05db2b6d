//! Connector error types and retry classification.

use ingest_types::FailureKind;
use thiserror::Error;

/// Errors that can occur while talking to a museum API
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Transport-level failure (timeout, connection reset)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// Response body did not match the expected envelope
    #[error("Unexpected response shape: {0}")]
    Envelope(String),

    /// XML parsing failed
    #[error("XML error: {0}")]
    Xml(String),

    /// Storage failure during extraction
    #[error("Storage error: {0}")]
    Storage(#[from] ingest_storage::StorageError),
}

/// Classify a connector error for the shared retry helper.
///
/// Timeouts, connection failures, 429, and 5xx are worth retrying. Anything
/// else (other 4xx, malformed envelopes) will not improve on retry.
pub fn classify(error: &ConnectorError) -> FailureKind {
    match error {
        ConnectorError::Http(e) => {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                FailureKind::Transient
            } else {
                FailureKind::Permanent
            }
        }
        ConnectorError::Status { status, .. } => {
            if status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                FailureKind::Transient
            } else {
                FailureKind::Permanent
            }
        }
        ConnectorError::Envelope(_) | ConnectorError::Xml(_) | ConnectorError::Storage(_) => {
            FailureKind::Permanent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_transient() {
        let error = ConnectorError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            url: "https://example.com".to_string(),
        };
        assert_eq!(classify(&error), FailureKind::Transient);
    }

    #[test]
    fn test_rate_limit_is_transient() {
        let error = ConnectorError::Status {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            url: "https://example.com".to_string(),
        };
        assert_eq!(classify(&error), FailureKind::Transient);
    }

    #[test]
    fn test_not_found_is_permanent() {
        let error = ConnectorError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            url: "https://example.com".to_string(),
        };
        assert_eq!(classify(&error), FailureKind::Permanent);
    }

    #[test]
    fn test_envelope_is_permanent() {
        let error = ConnectorError::Envelope("missing items".to_string());
        assert_eq!(classify(&error), FailureKind::Permanent);
    }
}
