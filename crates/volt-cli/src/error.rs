//! Error handling for the volt CLI.
//!
//! Startup failures (configuration, spawning a tool, watching sources) are
//! typed errors propagated with `?` and rendered through miette in `main`.
//! Failures while running (compile errors, children exiting) are logged
//! and never escalated; see the `dev` module.

mod report;

use std::path::PathBuf;
use thiserror::Error;

pub use report::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (file not found, invalid values, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] volt_config::ConfigError),

    /// A supervised tool could not be spawned
    #[error("Failed to start {name} ('{command}'): {source}")]
    Spawn {
        name: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A supervised process is already running
    #[error("{0} is already running")]
    AlreadyRunning(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

impl CliError {
    /// Hint shown under the error when rendered.
    pub fn hint(&self) -> Option<String> {
        match self {
            CliError::Spawn { command, .. } => Some(format!(
                "Make sure '{}' is installed and on your PATH",
                command
            )),
            CliError::FileNotFound(_) => {
                Some("Check --cwd and the bundler.watch paths in your volt config".to_string())
            }
            CliError::Config(_) => {
                Some("Run 'volt --print-schema' to see the accepted keys".to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_message() {
        let err = CliError::Spawn {
            name: "host".to_string(),
            command: "electron".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to start host"));
        assert!(msg.contains("electron"));
        assert!(err.hint().unwrap().contains("PATH"));
    }

    #[test]
    fn test_cli_error_from_config_error() {
        let config_err = volt_config::ConfigError::MissingField("bundler.watch".to_string());
        let cli_err: CliError = config_err.into();
        assert!(matches!(cli_err, CliError::Config(_)));
        assert!(cli_err.to_string().contains("bundler.watch"));
    }

    #[test]
    fn test_file_not_found_display() {
        let err = CliError::FileNotFound(PathBuf::from("main"));
        assert_eq!(err.to_string(), "File not found: main");
    }

    #[test]
    fn test_io_error_has_no_hint() {
        let err: CliError = std::io::Error::other("boom").into();
        assert!(err.hint().is_none());
    }
}
