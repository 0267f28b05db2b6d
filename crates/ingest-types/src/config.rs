//! Layered configuration for the ingestion pipeline.
//!
//! Precedence: built-in defaults, then the config file at
//! `~/.config/artwork-ingest/config.toml`, then an optional CLI-specified
//! file, then `INGEST_*` environment variables. CLI flags are applied by the
//! caller after loading.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use crate::retry::RetryPolicy;
use crate::slot::EmbeddingSlot;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Museum API client settings shared by all connectors.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSettings {
    /// Page size requested from paginated endpoints
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Delay between consecutive requests to the same source (ms)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Delay between per-item detail fetches for roster-style sources (ms)
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,

    /// Skip re-fetching items already fetched within this many days
    #[serde(default = "default_refetch_window_days")]
    pub refetch_window_days: i64,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_page_size() -> usize {
    100
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_item_delay_ms() -> u64 {
    5000
}

fn default_refetch_window_days() -> i64 {
    30
}

fn default_http_timeout_secs() -> u64 {
    60
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            request_delay_ms: default_request_delay_ms(),
            item_delay_ms: default_item_delay_ms(),
            refetch_window_days: default_refetch_window_days(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl ExtractionSettings {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Image materializer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageSettings {
    /// Target bucket for derived thumbnails
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Bucket region
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3-compatible endpoint (for non-AWS providers)
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Access key (from env var, not stored in the config file)
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Secret key (from env var, not stored in the config file)
    #[serde(default)]
    pub secret_access_key: Option<SecretString>,

    /// Longest output dimension in pixels; images are never upscaled
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// JPEG output quality
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_bucket() -> String {
    "artwork-images".to_string()
}

fn default_region() -> String {
    "eu-central-1".to_string()
}

fn default_max_dimension() -> u32 {
    800
}

fn default_jpeg_quality() -> u8 {
    85
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Embedding inference API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    /// Inference API base URL
    #[serde(default = "default_embedding_api_url")]
    pub api_url: String,

    /// API key (from env var, not stored in the config file)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Model identifier sent with each request
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Slots actively computed this run; the rest get zero placeholders
    #[serde(default = "default_active_slots")]
    pub active_slots: Vec<EmbeddingSlot>,
}

fn default_embedding_api_url() -> String {
    "https://api.jina.ai/v1/embeddings".to_string()
}

fn default_embedding_model() -> String {
    "jina-clip-v2".to_string()
}

fn default_active_slots() -> Vec<EmbeddingSlot> {
    vec![EmbeddingSlot::ImageClip]
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_url: default_embedding_api_url(),
            api_key: None,
            model: default_embedding_model(),
            active_slots: default_active_slots(),
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Deserialize)]
pub struct QdrantSettings {
    /// Qdrant base URL
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    /// API key (from env var, not stored in the config file)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Collection holding the artwork points
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "artworks".to_string()
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
            collection: default_collection(),
        }
    }
}

/// Retry settings, deserialized then converted to a [`RetryPolicy`].
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_interval_ms() -> u64 {
    500
}

fn default_max_interval_ms() -> u64 {
    30_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            max_interval: Duration::from_millis(self.max_interval_ms),
        }
    }
}

/// Main application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Path to the RocksDB storage directory
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Records per batch for transform, image, and embedding stages
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches (ms)
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub extraction: ExtractionSettings,

    #[serde(default)]
    pub images: ImageSettings,

    #[serde(default)]
    pub embeddings: EmbeddingSettings,

    #[serde(default)]
    pub qdrant: QdrantSettings,

    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", "artwork-ingest")
        .map(|p| p.data_local_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            log_level: default_log_level(),
            extraction: ExtractionSettings::default(),
            images: ImageSettings::default(),
            embeddings: EmbeddingSettings::default(),
            qdrant: QdrantSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/artwork-ingest/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (INGEST_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", "artwork-ingest")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: INGEST_DB_PATH, INGEST_QDRANT_URL, INGEST_IMAGES_BUCKET, etc.
        builder = builder.add_source(
            Environment::with_prefix("INGEST")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ConfigError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate value ranges after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be > 0".to_string()));
        }
        if self.images.max_dimension == 0 {
            return Err(ConfigError::Invalid(
                "images.max_dimension must be > 0".to_string(),
            ));
        }
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "images.jpeg_quality must be 1-100, got {}",
                self.images.jpeg_quality
            )));
        }
        if self.embeddings.active_slots.is_empty() {
            return Err(ConfigError::Invalid(
                "embeddings.active_slots must name at least one slot".to_string(),
            ));
        }
        Ok(())
    }

    /// Expand ~ in db_path to the actual home directory.
    pub fn expanded_db_path(&self) -> PathBuf {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(&self.db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.batch_size, 100);
        assert_eq!(settings.images.max_dimension, 800);
        assert_eq!(settings.images.jpeg_quality, 85);
        assert_eq!(settings.qdrant.collection, "artworks");
        assert_eq!(
            settings.embeddings.active_slots,
            vec![EmbeddingSlot::ImageClip]
        );
    }

    #[test]
    fn test_default_settings_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut settings = Settings::default();
        settings.batch_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_jpeg_quality() {
        let mut settings = Settings::default();
        settings.images.jpeg_quality = 0;
        assert!(settings.validate().is_err());
        settings.images.jpeg_quality = 101;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_active_slots() {
        let mut settings = Settings::default();
        settings.embeddings.active_slots.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_retry_settings_policy() {
        let retry = RetrySettings::default();
        let policy = retry.policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_expanded_db_path_passthrough() {
        let mut settings = Settings::default();
        settings.db_path = "/var/lib/ingest/db".to_string();
        assert_eq!(
            settings.expanded_db_path(),
            PathBuf::from("/var/lib/ingest/db")
        );
    }
}
