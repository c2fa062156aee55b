//! Config command handlers

use crate::cli::{ConfigInitArgs, ConfigValidateArgs};
use crate::config::{DispatchConfig, EXAMPLE_CONFIG};
use std::fs;

/// Handle `dispatch config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Edit the [[callers]] and [[sources]] sections for your team.");

    Ok(())
}

/// Handle `dispatch config validate` command
pub fn handle_config_validate(
    args: &ConfigValidateArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    let config = DispatchConfig::load(Some(&args.config))?;
    config.validate()?;

    Ok(format!(
        "✓ Configuration valid: {} ({} callers, {} sources)",
        args.config.display(),
        config.callers.len(),
        config.sources.len()
    ))
}
