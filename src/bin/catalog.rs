//! Catalog CLI Binary
//!
//! Builds the content catalog and synchronizes its documents.

use anyhow::Context;
use catalog::cli::{Cli, CliContext};
use catalog::logging::init_logging;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CliContext::load_config(&cli.workspace, cli.config.as_deref())
        .context("Error loading configuration")?;
    init_logging(Some(&cli.logging_config(&config.logging))).context("Error initializing logging")?;

    let context =
        CliContext::new(&cli.workspace, config).context("Error initializing workspace")?;
    let output = context.execute(&cli.command).await?;
    println!("{}", output);
    Ok(())
}
