//! Sanstha CLI: feed aggregation and AI-assisted blog authoring.
//!
//! Aggregates digital-marketing feeds, generates posts through a hosted
//! text-generation model, and keeps a capped local post store.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
