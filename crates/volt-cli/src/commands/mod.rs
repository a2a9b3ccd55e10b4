//! Command implementations for the volt CLI.
//!
//! - [`dev`] - The development session (the default action)
//! - [`inspect`] - `--print-schema` / `--print-config`

pub mod dev;
pub mod inspect;

use crate::cli::Cli;
use crate::error::Result;

/// Dispatch on the parsed command line.
pub async fn execute(args: Cli) -> Result<()> {
    if args.print_schema {
        return inspect::print_schema();
    }
    if args.print_config {
        return inspect::print_config(&args);
    }
    dev::execute(args).await
}
