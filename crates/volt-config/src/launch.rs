//! Launch contract of the application host.
//!
//! The host started by volt receives `NODE_ENV` in its environment and its
//! argument vector laid out as `[runtime, app_path, port, ...flags]`. From
//! those two inputs it decides where to load its UI from and whether the
//! debugging panel is opened.

use std::path::PathBuf;

use crate::config::{default_out_dir, default_renderer_port};

/// Production builds serve packaged assets through this scheme.
pub const APP_SCHEME: &str = "app";

/// Page loaded by the first window.
pub const HOME_PAGE: &str = "home.html";

/// Suffix appended to the user-data directory in development.
pub const DEV_USER_DATA_SUFFIX: &str = " (development)";

/// Position of the renderer port in the host's argument vector.
const PORT_ARG_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    Production,
    Development,
}

impl LaunchMode {
    /// Anything other than `production` is development.
    pub fn from_node_env(node_env: Option<&str>) -> Self {
        match node_env {
            Some("production") => LaunchMode::Production,
            _ => LaunchMode::Development,
        }
    }
}

/// What the host should do on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    pub mode: LaunchMode,
    /// URL the first window loads
    pub url: String,
    /// Open the debugging panel once the window is created
    pub open_devtools: bool,
    /// Directory served under [`APP_SCHEME`] (production only)
    pub serve_directory: Option<PathBuf>,
    /// Appended to the user-data path (development only)
    pub user_data_suffix: Option<&'static str>,
}

impl LaunchContext {
    /// Resolve the launch context from `NODE_ENV` and the host's argv.
    ///
    /// In development the port comes from `args[2]`; a missing or
    /// unparsable port falls back to the default renderer port.
    pub fn resolve(node_env: Option<&str>, args: &[String]) -> Self {
        match LaunchMode::from_node_env(node_env) {
            LaunchMode::Production => Self {
                mode: LaunchMode::Production,
                url: format!("{}://./{}", APP_SCHEME, HOME_PAGE),
                open_devtools: false,
                serve_directory: Some(default_out_dir()),
                user_data_suffix: None,
            },
            LaunchMode::Development => {
                let port = args
                    .get(PORT_ARG_INDEX)
                    .and_then(|p| p.parse::<u16>().ok())
                    .filter(|p| *p != 0)
                    .unwrap_or_else(default_renderer_port);
                Self {
                    mode: LaunchMode::Development,
                    url: format!("http://localhost:{}/{}", port, HOME_PAGE),
                    open_devtools: true,
                    serve_directory: None,
                    user_data_suffix: Some(DEV_USER_DATA_SUFFIX),
                }
            }
        }
    }

    /// User-data directory for a given base path.
    pub fn user_data_path(&self, base: &str) -> String {
        match self.user_data_suffix {
            Some(suffix) => format!("{}{}", base, suffix),
            None => base.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_production_serves_packaged_assets() {
        let ctx = LaunchContext::resolve(Some("production"), &argv(&["electron", ".", "8080"]));
        assert_eq!(ctx.mode, LaunchMode::Production);
        assert_eq!(ctx.url, "app://./home.html");
        assert!(!ctx.open_devtools);
        assert_eq!(ctx.serve_directory, Some(PathBuf::from("app")));
        assert_eq!(ctx.user_data_path("/data/MyApp"), "/data/MyApp");
    }

    #[test]
    fn test_development_loads_dev_server() {
        let ctx = LaunchContext::resolve(
            Some("development"),
            &argv(&["electron", ".", "3000", "--inspect=9292"]),
        );
        assert_eq!(ctx.mode, LaunchMode::Development);
        assert_eq!(ctx.url, "http://localhost:3000/home.html");
        assert!(ctx.open_devtools);
        assert!(ctx.serve_directory.is_none());
        assert_eq!(ctx.user_data_path("/data/MyApp"), "/data/MyApp (development)");
    }

    #[test]
    fn test_unset_node_env_is_development() {
        let ctx = LaunchContext::resolve(None, &argv(&["electron", ".", "4000"]));
        assert_eq!(ctx.mode, LaunchMode::Development);
        assert_eq!(ctx.url, "http://localhost:4000/home.html");
    }

    #[test]
    fn test_missing_or_bad_port_falls_back() {
        let ctx = LaunchContext::resolve(Some("development"), &argv(&["electron", "."]));
        assert_eq!(ctx.url, "http://localhost:8080/home.html");

        let ctx = LaunchContext::resolve(None, &argv(&["electron", ".", "--inspect=9292"]));
        assert_eq!(ctx.url, "http://localhost:8080/home.html");
    }
}
