// src/main.rs
// Herald - rotating per-recipient announcements for server extensions

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use herald::Settings;
use std::time::Duration;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let level = if cli.verbose || settings.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    debug!(?settings, "Settings resolved");

    match cli.command {
        Commands::Simulate {
            descriptors,
            recipients,
            duration_secs,
        } => {
            cli::run_simulate(&settings, &descriptors, recipients, Duration::from_secs(duration_secs)).await?;
        }
        Commands::Licenses { descriptors, json } => {
            cli::run_licenses(&settings, &descriptors, json)?;
        }
        Commands::Info { descriptors, name } => {
            cli::run_info(&descriptors, &name)?;
        }
    }

    Ok(())
}
