//! Logging infrastructure for the volt CLI.
//!
//! Structured logging via `tracing`. User-facing status lines go through
//! [`crate::ui`]; tracing carries the diagnostic detail (pids, exit
//! statuses, watcher errors) underneath them.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str = "volt=debug,volt_cli=debug,volt_config=debug";

/// Filter used with `--quiet`.
pub const QUIET_FILTER: &str = "volt=error,volt_cli=error,volt_config=error";

/// Filter used when neither flag nor `RUST_LOG` is given.
pub const DEFAULT_FILTER: &str = "volt=info,volt_cli=info,volt_config=info";

/// Initialize the tracing subscriber.
///
/// The level is chosen in this order: `--verbose`, `--quiet`, `RUST_LOG`,
/// then [`DEFAULT_FILTER`]. Must be called once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = select_filter(verbose, quiet);

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn select_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global subscriber can only be installed once per process, so these
    // only check filter construction.

    #[test]
    fn test_verbose_filter_enables_debug() {
        let filter = select_filter(true, false);
        assert!(filter.to_string().contains("volt_cli=debug"));
    }

    #[test]
    fn test_quiet_filter_is_error_only() {
        let filter = select_filter(false, true);
        assert!(filter.to_string().contains("volt_cli=error"));
    }
}
