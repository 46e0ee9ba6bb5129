//! sheetsum CLI — incremental URL summarization for spreadsheets.
//!
//! Reads a configured sheet of URLs, summarizes and categorizes each URL
//! that does not yet carry a summary, and writes the enriched rows back.

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
