//! Miette diagnostic conversion for CLI errors.

use crate::error::CliError;
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err.hint() {
        Some(hint) => miette::miette!(help = hint, "{}", err),
        None => miette::miette!("{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_keeps_message() {
        let report = cli_error_to_miette(CliError::AlreadyRunning("host".to_string()));
        assert_eq!(report.to_string(), "host is already running");
    }

    #[test]
    fn test_report_carries_hint() {
        let report = cli_error_to_miette(CliError::FileNotFound("main".into()));
        let help = report.help().map(|h| h.to_string());
        assert!(help.unwrap().contains("bundler.watch"));
    }
}
