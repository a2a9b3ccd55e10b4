//! Configuration introspection.

use crate::cli::Cli;
use crate::commands::dev::load_config;
use crate::error::Result;
use volt_config::VoltConfig;

/// Write the config file's JSON Schema to stdout.
pub fn print_schema() -> Result<()> {
    let schema = serde_json::to_string_pretty(&VoltConfig::json_schema())?;
    println!("{}", schema);
    Ok(())
}

/// Write the fully merged configuration to stdout.
pub fn print_config(args: &Cli) -> Result<()> {
    let (config, _) = load_config(args)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
