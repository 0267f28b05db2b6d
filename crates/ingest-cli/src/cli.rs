//! Command line definition.

use clap::{Args, Parser, Subcommand};

use ingest_types::SourceSlug;

#[derive(Parser, Debug)]
#[command(name = "artwork-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/artwork-ingest/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every batch-processing command.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct BatchArgs {
    /// Records per batch (overrides configured batch size)
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Delay in milliseconds between batches (overrides configured delay)
    #[arg(long)]
    pub batch_delay: Option<u64>,

    /// Stop after this many batches
    #[arg(long)]
    pub max_batches: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch raw payloads from the museum APIs
    Extract {
        /// Only this source (default: all sources)
        #[arg(short, long)]
        source: Option<SourceSlug>,
    },

    /// Canonicalize raw payloads into artwork records
    Transform {
        /// Only this source (default: all sources)
        #[arg(short, long)]
        source: Option<SourceSlug>,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Download, resize, and store artwork thumbnails
    LoadImages {
        /// Only this source (default: all sources)
        #[arg(short, long)]
        source: Option<SourceSlug>,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Compute embeddings and upsert vector index points
    LoadEmbeddings {
        /// Only this source (default: all sources)
        #[arg(short, long)]
        source: Option<SourceSlug>,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Clear image-stage flags so thumbnails are rematerialized
    ResetImages {
        /// Only this source (default: all sources)
        #[arg(short, long)]
        source: Option<SourceSlug>,
    },

    /// Clear embedding-stage flags so vectors are recomputed
    ResetEmbeddings {
        /// Only this source (default: all sources)
        #[arg(short, long)]
        source: Option<SourceSlug>,
    },
}
