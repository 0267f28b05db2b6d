//! Artwork ingestion pipeline CLI.
//!
//! # Usage
//!
//! ```bash
//! artwork-ingest extract [--source smk]
//! artwork-ingest transform [--source smk] [--batch-size N]
//! artwork-ingest load-images [--source smk] [--max-batches N]
//! artwork-ingest load-embeddings [--source smk]
//! artwork-ingest reset-images [--source smk]
//! artwork-ingest reset-embeddings [--source smk]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/artwork-ingest/config.toml)
//! 3. CLI-specified config file (--config)
//! 4. Environment variables (INGEST_*)

use anyhow::Result;
use clap::Parser;

use ingest_cli::{commands, Cli, Commands};
use ingest_types::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    commands::init_logging(&settings)?;

    let storage = commands::open_storage(&settings)?;

    match cli.command {
        Commands::Extract { source } => {
            commands::run_extract(&settings, storage, source).await?;
        }
        Commands::Transform { source, batch } => {
            commands::run_transform(&settings, storage, source, batch).await?;
        }
        Commands::LoadImages { source, batch } => {
            commands::run_load_images(&settings, storage, source, batch).await?;
        }
        Commands::LoadEmbeddings { source, batch } => {
            commands::run_load_embeddings(&settings, storage, source, batch).await?;
        }
        Commands::ResetImages { source } => {
            commands::run_reset_images(&storage, source)?;
        }
        Commands::ResetEmbeddings { source } => {
            commands::run_reset_embeddings(&storage, source)?;
        }
    }

    Ok(())
}
