use thiserror::Error;

use ingest_types::{EmbeddingSlot, FailureKind};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed embedding response: {0}")]
    Envelope(String),

    #[error("no embedder available for slot {0}")]
    UnsupportedSlot(EmbeddingSlot),
}

/// Sort embedding failures into retryable and permanent.
///
/// An unsupported slot stays unsupported no matter how often it is retried,
/// and a malformed response body will come back identical.
pub fn classify(error: &EmbeddingError) -> FailureKind {
    match error {
        EmbeddingError::Http(e) => {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                FailureKind::Transient
            } else {
                match e.status() {
                    Some(status) if status.is_server_error() || status.as_u16() == 429 => {
                        FailureKind::Transient
                    }
                    Some(_) => FailureKind::Permanent,
                    None => FailureKind::Transient,
                }
            }
        }
        EmbeddingError::Status { status, .. } => {
            if *status >= 500 || *status == 429 {
                FailureKind::Transient
            } else {
                FailureKind::Permanent
            }
        }
        EmbeddingError::Envelope(_) => FailureKind::Permanent,
        EmbeddingError::UnsupportedSlot(_) => FailureKind::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_slot_is_permanent() {
        let error = EmbeddingError::UnsupportedSlot(EmbeddingSlot::TextClip);
        assert_eq!(classify(&error), FailureKind::Permanent);
    }

    #[test]
    fn test_throttling_is_transient() {
        let error = EmbeddingError::Status {
            status: 429,
            url: "https://api.test/embeddings".to_string(),
        };
        assert_eq!(classify(&error), FailureKind::Transient);
    }

    #[test]
    fn test_client_error_is_permanent() {
        let error = EmbeddingError::Status {
            status: 400,
            url: "https://api.test/embeddings".to_string(),
        };
        assert_eq!(classify(&error), FailureKind::Permanent);
    }

    #[test]
    fn test_envelope_is_permanent() {
        let error = EmbeddingError::Envelope("missing data".to_string());
        assert_eq!(classify(&error), FailureKind::Permanent);
    }
}
