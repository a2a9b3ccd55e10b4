//! Formatting utilities for sizes, durations, and build reports.

use owo_colors::{OwoColorize, Stream::Stdout, Style};
use std::time::Duration;

/// Format file size in human-readable format.
///
/// # Examples
///
/// ```
/// use volt_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format duration in human-readable format.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use volt_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Render the summary of a successful compile pass.
///
/// `files` are the emitted artifacts as (name, size) pairs and `log` is
/// whatever the bundler printed.
pub fn render_build_summary(
    pass: u64,
    duration: Duration,
    files: &[(String, u64)],
    log: &str,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        format!("Build #{}", pass).if_supports_color(Stdout, |t| t.bold()),
        format!("completed in {}", format_duration(duration))
            .if_supports_color(Stdout, |t| t.dimmed())
    ));

    let log = log.trim_end();
    if !log.is_empty() {
        out.push_str(log);
        out.push('\n');
    }

    for (name, size) in files {
        out.push_str(&format!(
            "  {} {} {}\n",
            "▸".if_supports_color(Stdout, |t| t.blue()),
            name.if_supports_color(Stdout, |t| t.style(Style::new().bright_white().bold())),
            format_size(*size).if_supports_color(Stdout, |t| t.dimmed())
        ));
    }

    out
}

/// Print the summary of a successful compile pass to stdout.
pub fn print_build_summary(pass: u64, duration: Duration, files: &[(String, u64)], log: &str) {
    print!("{}", render_build_summary(pass, duration, files, log));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1_048_576), "1.00 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
    }

    #[test]
    fn test_render_build_summary_lists_files() {
        let summary = render_build_summary(
            3,
            Duration::from_millis(420),
            &[("background.js".to_string(), 2048)],
            "webpack compiled successfully\n",
        );
        assert!(summary.contains("Build #3"));
        assert!(summary.contains("420ms"));
        assert!(summary.contains("webpack compiled successfully"));
        assert!(summary.contains("background.js"));
        assert!(summary.contains("2.00 KB"));
    }

    #[test]
    fn test_render_build_summary_empty_log() {
        let summary = render_build_summary(1, Duration::from_millis(5), &[], "   \n");
        assert_eq!(summary.lines().count(), 1);
    }
}
