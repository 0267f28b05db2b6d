//! Command line for the artwork ingestion pipeline.

pub mod cli;
pub mod commands;

pub use cli::{BatchArgs, Cli, Commands};
