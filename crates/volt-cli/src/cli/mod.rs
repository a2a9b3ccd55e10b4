//! Command-line interface definition for volt.
//!
//! Volt has a single job, so there are no subcommands: running `volt`
//! starts the development session in the working directory.

mod validation;

use clap::Parser;
use std::path::PathBuf;

pub use validation::parse_port;

/// Volt - development orchestrator for Electron-style desktop apps
#[derive(Parser, Debug, Clone)]
#[command(
    name = "volt",
    version,
    about = "Development orchestrator for Electron-style desktop apps",
    long_about = "Volt rebuilds the main-process bundle on every source change, restarts the\n\
                  application host after each successful build and keeps the renderer\n\
                  dev-server running. Ctrl+C stops everything and removes the build output."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Config file to use instead of volt.toml / volt.config.json
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Renderer dev-server port, overriding the config file
    #[arg(short, long, value_parser = parse_port)]
    pub port: Option<u16>,

    /// Print the JSON Schema of the config file and exit
    #[arg(long, conflicts_with = "print_config")]
    pub print_schema: bool,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}
