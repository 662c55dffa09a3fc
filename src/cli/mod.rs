// src/cli/mod.rs
// CLI module for Herald commands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod info;
pub mod licenses;
pub mod simulate;

pub use info::run_info;
pub use licenses::run_licenses;
pub use simulate::run_simulate;

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "Rotating per-recipient announcements for server extensions")]
#[command(version)]
pub struct Cli {
    /// Config file (default: ~/.herald/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an in-process host: connect recipients and rotate every producer's announcement
    Simulate {
        /// TOML file with [[producer]] descriptors
        #[arg(short, long)]
        descriptors: PathBuf,

        /// Number of recipients to connect
        #[arg(short, long, default_value = "1")]
        recipients: usize,

        /// How long recipients stay connected
        #[arg(long, default_value = "15")]
        duration_secs: u64,
    },

    /// Print the license listing for a set of producers
    Licenses {
        /// TOML file with [[producer]] descriptors
        #[arg(short, long)]
        descriptors: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print one producer's info block (what `/<alias> info` shows)
    Info {
        /// TOML file with [[producer]] descriptors
        #[arg(short, long)]
        descriptors: PathBuf,

        /// Producer name or info command alias
        name: String,
    },
}
