//! NewsBrief CLI: turn one news article into a multi-source briefing.
//!
//! Finds related coverage for a seed article, fetches it concurrently and
//! writes an LLM-written summary with references.

mod commands;
mod progress;

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
