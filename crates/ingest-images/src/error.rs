use thiserror::Error;

use ingest_types::FailureKind;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("object store error: {0}")]
    Store(String),

    #[error(transparent)]
    Storage(#[from] ingest_storage::StorageError),
}

/// Sort image failures into retryable and permanent.
///
/// Undecodable bytes and non-throttling 4xx responses will not improve on
/// retry; everything network-shaped might.
pub fn classify(error: &ImageError) -> FailureKind {
    match error {
        ImageError::Http(e) => {
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
        ImageError::Status { status, .. } => {
            if *status >= 500 || *status == 429 {
                FailureKind::Transient
            } else {
                FailureKind::Permanent
            }
        }
        ImageError::Decode(_) => FailureKind::Permanent,
        ImageError::Store(_) => FailureKind::Transient,
        ImageError::Storage(_) => FailureKind::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_is_transient() {
        let error = ImageError::Status {
            status: 503,
            url: "https://example.test/t.jpg".to_string(),
        };
        assert_eq!(classify(&error), FailureKind::Transient);
    }

    #[test]
    fn test_throttling_is_transient() {
        let error = ImageError::Status {
            status: 429,
            url: "https://example.test/t.jpg".to_string(),
        };
        assert_eq!(classify(&error), FailureKind::Transient);
    }

    #[test]
    fn test_not_found_is_permanent() {
        let error = ImageError::Status {
            status: 404,
            url: "https://example.test/t.jpg".to_string(),
        };
        assert_eq!(classify(&error), FailureKind::Permanent);
    }

    #[test]
    fn test_decode_failure_is_permanent() {
        let error = image::load_from_memory(b"not an image").unwrap_err();
        assert_eq!(classify(&ImageError::Decode(error)), FailureKind::Permanent);
    }
}
