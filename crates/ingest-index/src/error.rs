use thiserror::Error;

use ingest_types::FailureKind;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed index response: {0}")]
    Envelope(String),

    #[error(transparent)]
    Storage(#[from] ingest_storage::StorageError),
}

/// Sort index failures into retryable and permanent.
pub fn classify(error: &IndexError) -> FailureKind {
    match error {
        IndexError::Http(e) => {
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
        IndexError::Status { status, .. } => {
            if *status >= 500 || *status == 429 {
                FailureKind::Transient
            } else {
                FailureKind::Permanent
            }
        }
        IndexError::Envelope(_) => FailureKind::Permanent,
        IndexError::Storage(_) => FailureKind::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_is_transient() {
        let error = IndexError::Status {
            status: 502,
            url: "http://localhost:6333".to_string(),
        };
        assert_eq!(classify(&error), FailureKind::Transient);
    }

    #[test]
    fn test_bad_request_is_permanent() {
        let error = IndexError::Status {
            status: 400,
            url: "http://localhost:6333".to_string(),
        };
        assert_eq!(classify(&error), FailureKind::Permanent);
    }
}
