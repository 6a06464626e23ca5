//! Config command handlers

use crate::cli::{ConfigCheckArgs, ConfigInitArgs};
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../keepalive.example.toml");

/// Handle `keepalive config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("Configuration file created: {}", args.output.display());
    println!("  Edit the [ping] targets before starting the pinger.");

    Ok(())
}

/// Handle `keepalive config check`: load, validate and render the effective configuration.
pub fn handle_config_check(args: &ConfigCheckArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = crate::cli::run::load_config_with_overrides(&args.source)?;
    config.validate()?;
    Ok(toml::to_string_pretty(&config)?)
}
