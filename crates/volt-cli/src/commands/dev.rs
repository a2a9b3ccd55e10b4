//! Development session command.
//!
//! Orchestrates the whole session lifecycle:
//! - Load and validate configuration
//! - Install SIGINT/SIGTERM handlers
//! - Clear the previous build and start the bundler watch
//! - Start the renderer dev-server
//! - Restart the host after every successful compile
//! - Ordered teardown on the first signal

use crate::cli::Cli;
use crate::dev::setup::resolve_cwd;
use crate::dev::{DevSetup, TerminalReporter, install_signal_handlers, shutdown_channel};
use crate::error::{CliError, Result};
use crate::ui;
use std::path::PathBuf;
use std::sync::Arc;
use volt_config::{ConfigLoader, VoltConfig};

/// Resolve the project directory and load its configuration.
pub fn load_config(args: &Cli) -> Result<(VoltConfig, PathBuf)> {
    let cwd = resolve_cwd(args.cwd.as_deref())?;
    if !cwd.is_dir() {
        return Err(CliError::FileNotFound(cwd));
    }

    let loader = ConfigLoader::new(&cwd)
        .with_file(args.config.clone())
        .with_renderer_port(args.port);
    match loader.find() {
        Some(file) => tracing::debug!("Using config file {}", file.display()),
        None => tracing::debug!("No config file found, using defaults"),
    }

    Ok((loader.load()?, cwd))
}

/// Execute the development session.
///
/// Returns once the session has been torn down after a termination signal.
/// Child processes exiting on their own do not end the session, and their
/// exit codes do not affect volt's.
///
/// # Errors
///
/// Returns errors for:
/// - Invalid configuration
/// - Missing watch paths
/// - A renderer dev-server that cannot be spawned
pub async fn execute(args: Cli) -> Result<()> {
    let (config, cwd) = load_config(&args)?;
    let setup = DevSetup::new(config, cwd);

    ui::info("Starting development environment...");
    ui::info(&format!("Working directory: {}", setup.cwd.display()));
    ui::info(&format!("Host will load: {}", setup.host_launch().url));

    let (trigger, listener) = shutdown_channel();
    let signals = install_signal_handlers(trigger)?;

    let mut orchestrator = setup.orchestrator(Arc::new(TerminalReporter));
    if let Err(e) = orchestrator.start().await {
        orchestrator.shutdown().await;
        signals.abort();
        return Err(e);
    }

    ui::info("Press Ctrl+C to stop");
    let report = orchestrator.run(listener).await;
    signals.abort();

    tracing::debug!(
        steps = ?report.steps,
        host_exit = ?report.host_exit.map(|e| e.status),
        renderer_exit = ?report.renderer_exit.map(|e| e.status),
        "Teardown complete"
    );
    if report.host_exit.is_some_and(|e| e.forced) {
        ui::warning("Host process did not exit in time and was killed");
    }
    if report.renderer_exit.is_some_and(|e| e.forced) {
        ui::warning("Renderer dev-server did not exit in time and was killed");
    }

    ui::success("Development environment stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_missing_dir() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let args = Cli::try_parse_from(["volt", "--cwd", missing.to_str().unwrap()]).unwrap();
        assert!(matches!(load_config(&args), Err(CliError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_port_override() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("volt.toml"), "renderer_port = 3000\n").unwrap();
        let args = Cli::try_parse_from([
            "volt",
            "--cwd",
            temp.path().to_str().unwrap(),
            "--port",
            "4000",
        ])
        .unwrap();

        let (config, cwd) = load_config(&args).unwrap();
        assert_eq!(config.renderer_port, 4000);
        assert_eq!(cwd, temp.path());
    }
}
