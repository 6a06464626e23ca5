//! CLI module for the keepalive pinger
//!
//! # Commands
//!
//! - `run` - Ping targets on an interval until SIGINT/SIGTERM
//! - `once` - Ping every target once and exit non-zero if any failed
//! - `config` - Configuration utilities (init, check)
//!
//! # Example
//!
//! ```bash
//! # Ping two targets every 30 seconds
//! keepalive run -t https://a.example.com -t https://b.example.com --interval 30
//!
//! # Smoke-check the configured targets
//! keepalive once -c keepalive.toml
//! ```

pub mod config;
pub mod once;
pub mod run;

pub use config::{handle_config_check, handle_config_init};
pub use once::handle_once;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file, loaded only if present.
pub const DEFAULT_CONFIG_PATH: &str = "keepalive.toml";

/// Keepalive pinger
#[derive(Parser, Debug)]
#[command(
    name = "keepalive",
    version,
    about = "Periodic keepalive pings with jittered retries"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ping targets on an interval until interrupted
    Run(RunArgs),
    /// Ping every target once and report
    Once(OnceArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Where configuration comes from, shared by all commands.
#[derive(Args, Debug, Default)]
pub struct ConfigSourceArgs {
    /// Path to configuration file [default: keepalive.toml if present]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target URL (repeatable); replaces configured targets
    #[arg(short, long = "target")]
    pub targets: Vec<String>,

    /// Override seconds between rounds
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: ConfigSourceArgs,

    /// Override health endpoint port
    #[arg(short = 'p', long)]
    pub health_port: Option<u16>,

    /// Do not start the health endpoint
    #[arg(long)]
    pub no_health: bool,
}

#[derive(Args, Debug, Default)]
pub struct OnceArgs {
    #[command(flatten)]
    pub source: ConfigSourceArgs,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write an example configuration file
    Init(ConfigInitArgs),
    /// Validate and print the effective configuration
    Check(ConfigCheckArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug, Default)]
pub struct ConfigCheckArgs {
    #[command(flatten)]
    pub source: ConfigSourceArgs,
}
