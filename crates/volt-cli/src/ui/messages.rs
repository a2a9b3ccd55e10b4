//! Status message functions for terminal output.

use owo_colors::{OwoColorize, Stream::Stderr, Style};

/// Print a success message to stderr.
///
/// # Examples
///
/// ```no_run
/// use volt_cli::ui::success;
///
/// success("Host process restarted");
/// ```
pub fn success(message: &str) {
    eprintln!(
        "{} {}",
        "✓".if_supports_color(Stderr, |t| t.style(Style::new().green().bold())),
        message
    );
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!(
        "{} {}",
        "ℹ".if_supports_color(Stderr, |t| t.style(Style::new().blue().bold())),
        message
    );
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        "⚠".if_supports_color(Stderr, |t| t.style(Style::new().yellow().bold())),
        message.if_supports_color(Stderr, |t| t.yellow())
    );
}

/// Print an error message to stderr.
///
/// # Examples
///
/// ```no_run
/// use volt_cli::ui::error;
///
/// error("Build #3 failed");
/// ```
pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        "✗".if_supports_color(Stderr, |t| t.style(Style::new().red().bold())),
        message.if_supports_color(Stderr, |t| t.red())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        // These should not panic
        success("Success message");
        info("Info message");
        warning("Warning message");
        error("Error message");
    }
}
