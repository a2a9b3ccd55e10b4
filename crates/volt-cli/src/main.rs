//! Volt CLI entry point: argument parsing, logging setup and dispatch.

use clap::Parser;
use miette::Result;
use volt_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    commands::execute(args)
        .await
        .map_err(error::cli_error_to_miette)
}
