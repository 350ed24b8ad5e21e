//! graphsync loader
//!
//! Synchronizes a property graph into a search engine, driven by a
//! declarative index specification.
//!
//! # Usage
//!
//! ```bash
//! graphsync --index-spec-file indices.yaml [--selected-indices products] [--test-mode]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (graphsync.yaml, or --config PATH)
//! 3. Environment variables (GRAPHSYNC_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use graphsync_cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
