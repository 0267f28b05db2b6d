//! Object storage seam and the S3 implementation.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use secrecy::ExposeSecret;
use tracing::debug;

use ingest_types::{config::ImageSettings, SourceSlug};

use crate::error::ImageError;

/// Browsers may cache stored thumbnails for 30 days.
const CACHE_CONTROL: &str = "max-age=2592000";

/// Bucket key for an artwork's thumbnail.
pub fn object_key(source: SourceSlug, object_number: &str) -> String {
    format!("{}_{}.jpg", source.as_str(), object_number)
}

/// Where materialized thumbnails live.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), ImageError>;

    async fn exists(&self, key: &str) -> Result<bool, ImageError>;

    /// Public URL for a stored object.
    fn public_url(&self, key: &str) -> String;
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl S3ObjectStore {
    /// Build a client from settings. Explicit credentials win over the
    /// ambient provider chain; a custom endpoint switches to path-style
    /// addressing for S3-compatible stores.
    pub async fn from_settings(settings: &ImageSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));
        if let (Some(key_id), Some(secret)) =
            (&settings.access_key_id, &settings.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.expose_secret().to_string(),
                None,
                None,
                "settings",
            ));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = aws_sdk_s3::Client::from_conf(builder.build());

        Self {
            client,
            bucket: settings.bucket.clone(),
            region: settings.region.clone(),
            endpoint_url: settings.endpoint_url.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), ImageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .acl(ObjectCannedAcl::PublicRead)
            .cache_control(CACHE_CONTROL)
            .content_type("image/jpeg")
            .send()
            .await
            .map_err(|e| ImageError::Store(e.to_string()))?;
        debug!(key = key, "Stored thumbnail object");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ImageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|service| service.is_not_found())
                    .unwrap_or(false);
                if not_found {
                    Ok(false)
                } else {
                    Err(ImageError::Store(e.to_string()))
                }
            }
        }
    }

    fn public_url(&self, key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_format() {
        assert_eq!(object_key(SourceSlug::Smk, "KMS1"), "smk_KMS1.jpg");
        assert_eq!(object_key(SourceSlug::Cma, "1921.1239"), "cma_1921.1239.jpg");
    }
}
