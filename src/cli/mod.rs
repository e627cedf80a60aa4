//! CLI interface for ssmd-momentum
//!
//! Provides subcommands for:
//! - `replay`: Evaluate a captured record file
//! - `config`: Show the effective configuration

mod replay;

pub use replay::ReplayArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ssmd-momentum")]
#[command(about = "Signal evaluation engine for binary prediction markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay records through the engine, printing evaluations as JSON
    Replay(ReplayArgs),
    /// Show the effective configuration
    Config,
}
