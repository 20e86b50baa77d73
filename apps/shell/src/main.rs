#![allow(clippy::print_stdout)]

mod args;
mod commands;
mod fleet;

use crate::args::{Cli, ShellCommands};
use amodel_logger::{LevelFilter, Logger};
use anyhow::Result;
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let engine_level = if cli.verbose { LevelFilter::TRACE } else { LevelFilter::WARN };
    let _logger = Logger::builder()
        .name(env!("CARGO_PKG_NAME"))
        .level(LevelFilter::WARN)
        .engine_level(engine_level)
        .span_events(cli.verbose)
        .init()?;

    amodel::init(cli.config.as_deref())?;

    match cli.command {
        ShellCommands::Demo {} => commands::demo()?,
        ShellCommands::Create { data, update } => commands::create(&data, update.as_deref()).await?,
        ShellCommands::Config {} => commands::config()?,
    }

    Ok(())
}
