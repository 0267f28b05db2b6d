//! Command implementations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use ingest_connectors::{connector_for, ExtractionRunner, HttpSource, StorageFetchHistory};
use ingest_embeddings::InferenceApiEmbedder;
use ingest_images::{HttpImageFetcher, ImageLoader, S3ObjectStore};
use ingest_index::{EmbeddingIndexer, QdrantClient};
use ingest_storage::Storage;
use ingest_transform::TransformRunner;
use ingest_types::{BatchStats, Settings, SourceSlug};

use crate::cli::BatchArgs;

pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

pub fn open_storage(settings: &Settings) -> Result<Arc<Storage>> {
    let path = settings.expanded_db_path();
    let storage = Storage::open(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    Ok(Arc::new(storage))
}

fn sources(filter: Option<SourceSlug>) -> Vec<SourceSlug> {
    match filter {
        Some(source) => vec![source],
        None => SourceSlug::ALL.to_vec(),
    }
}

pub async fn run_extract(
    settings: &Settings,
    storage: Arc<Storage>,
    source: Option<SourceSlug>,
) -> Result<()> {
    let history = Arc::new(StorageFetchHistory::new(storage.clone()));
    let runner = ExtractionRunner::new(storage, settings.extraction.request_delay());

    let mut total = BatchStats::new();
    for slug in sources(source) {
        info!(source = %slug, museum = slug.full_name(), "Starting extraction");
        let http = HttpSource::new(settings.extraction.http_timeout(), settings.retry.policy())?;
        let connector = connector_for(slug, http, &settings.extraction, history.clone());
        let stats = runner.run(connector.as_ref()).await;
        info!(source = %slug, stats = %stats, "Extraction finished");
        total.merge(&stats);
    }

    println!("extract: {}", total);
    Ok(())
}

pub async fn run_transform(
    settings: &Settings,
    storage: Arc<Storage>,
    source: Option<SourceSlug>,
    batch: BatchArgs,
) -> Result<()> {
    let runner = TransformRunner::new(storage);
    let batch_size = batch.batch_size.unwrap_or(settings.batch_size);
    let delay = Duration::from_millis(batch.batch_delay.unwrap_or(settings.batch_delay_ms));

    let mut total = BatchStats::new();
    let mut cursor: Option<String> = None;
    let mut batches = 0usize;
    loop {
        let (stats, next) = runner.run_batch(source, cursor.as_deref(), batch_size)?;
        total.merge(&stats);
        batches += 1;
        if batch.max_batches.is_some_and(|max| batches >= max) {
            break;
        }
        match next {
            Some(c) => cursor = Some(c),
            None => break,
        }
        tokio::time::sleep(delay).await;
    }

    println!("transform: {}", total);
    Ok(())
}

pub async fn run_load_images(
    settings: &Settings,
    storage: Arc<Storage>,
    source: Option<SourceSlug>,
    batch: BatchArgs,
) -> Result<()> {
    let store = Arc::new(S3ObjectStore::from_settings(&settings.images).await);
    let fetcher = Arc::new(HttpImageFetcher::new(settings.extraction.http_timeout())?);
    let loader = ImageLoader::new(
        storage,
        store,
        fetcher,
        settings.retry.policy(),
        settings.images.max_dimension,
        settings.images.jpeg_quality,
    );

    let batch_size = batch.batch_size.unwrap_or(settings.batch_size);
    let delay = Duration::from_millis(batch.batch_delay.unwrap_or(settings.batch_delay_ms));

    let mut total = BatchStats::new();
    let mut batches = 0usize;
    'scan: loop {
        let mut scan = BatchStats::new();
        let mut cursor: Option<String> = None;
        loop {
            let (stats, next) = loader.run_batch(source, cursor.as_deref(), batch_size).await?;
            scan.merge(&stats);
            batches += 1;
            if batch.max_batches.is_some_and(|max| batches >= max) {
                total.merge(&scan);
                break 'scan;
            }
            match next {
                Some(c) => cursor = Some(c),
                None => break,
            }
            tokio::time::sleep(delay).await;
        }
        total.merge(&scan);
        // Transient errors are retried by another full scan; stop once a
        // scan does no new work.
        if scan.processed() == 0 {
            break;
        }
    }

    println!("load-images: {}", total);
    Ok(())
}

pub async fn run_load_embeddings(
    settings: &Settings,
    storage: Arc<Storage>,
    source: Option<SourceSlug>,
    batch: BatchArgs,
) -> Result<()> {
    let store = Arc::new(S3ObjectStore::from_settings(&settings.images).await);
    let embedder = Arc::new(InferenceApiEmbedder::from_settings(
        &settings.embeddings,
        settings.extraction.http_timeout(),
    )?);
    let index = Arc::new(QdrantClient::from_settings(
        &settings.qdrant,
        settings.extraction.http_timeout(),
    )?);
    let indexer = EmbeddingIndexer::new(
        storage,
        index,
        embedder,
        store,
        settings.retry.policy(),
        settings.embeddings.active_slots.clone(),
    );
    indexer.ensure_collection().await?;

    let batch_size = batch.batch_size.unwrap_or(settings.batch_size);
    let delay = Duration::from_millis(batch.batch_delay.unwrap_or(settings.batch_delay_ms));

    let mut total = BatchStats::new();
    let mut batches = 0usize;
    'scan: loop {
        let mut scan = BatchStats::new();
        let mut cursor: Option<String> = None;
        loop {
            let (stats, next) = indexer.run_batch(source, cursor.as_deref(), batch_size).await?;
            scan.merge(&stats);
            batches += 1;
            if batch.max_batches.is_some_and(|max| batches >= max) {
                total.merge(&scan);
                break 'scan;
            }
            match next {
                Some(c) => cursor = Some(c),
                None => break,
            }
            tokio::time::sleep(delay).await;
        }
        total.merge(&scan);
        if scan.processed() == 0 {
            break;
        }
    }

    println!("load-embeddings: {}", total);
    Ok(())
}

pub fn run_reset_images(storage: &Storage, source: Option<SourceSlug>) -> Result<()> {
    let count = storage.reset_image_flags(source)?;
    println!("reset-images: {} records reset", count);
    Ok(())
}

pub fn run_reset_embeddings(storage: &Storage, source: Option<SourceSlug>) -> Result<()> {
    let count = storage.reset_embedding_flags(source)?;
    println!("reset-embeddings: {} records reset", count);
    Ok(())
}
