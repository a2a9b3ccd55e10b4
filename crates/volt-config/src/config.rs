//! Orchestrator configuration types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Replaced with the renderer port in every argument list.
pub const PORT_PLACEHOLDER: &str = "{port}";

/// Replaced with the output directory in every argument list.
pub const OUT_DIR_PLACEHOLDER: &str = "{out_dir}";

/// Environment variable injected into the bundler and the host process.
pub const NODE_ENV: &str = "NODE_ENV";

/// Value of [`NODE_ENV`] while volt is running.
pub const NODE_ENV_DEVELOPMENT: &str = "development";

/// Top-level configuration, loaded from `volt.toml` / `volt.config.json`,
/// `VOLT_*` environment variables and CLI overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct VoltConfig {
    /// Bundler output directory, relative to the working directory.
    /// Deleted before the first build and on shutdown.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Port the renderer dev-server listens on. Passed to the host as its
    /// first positional argument.
    #[serde(default = "default_renderer_port")]
    pub renderer_port: u16,

    /// Pause between the old host exiting and the new one being spawned.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Grace period after a termination request before a child is killed.
    #[serde(default = "default_kill_timeout_ms")]
    pub kill_timeout_ms: u64,

    #[serde(default)]
    pub bundler: BundlerConfig,

    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub renderer: RendererConfig,
}

/// How the main-process bundle is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BundlerConfig {
    /// Program run once per compile pass
    #[serde(default = "default_bundler_command")]
    pub command: String,

    /// Arguments for a single (non-watching) build
    #[serde(default = "default_bundler_args")]
    pub args: Vec<String>,

    /// Source paths watched for changes, relative to the working directory
    #[serde(default = "default_watch_paths")]
    pub watch: Vec<PathBuf>,

    /// Extra ignore patterns (`node_modules`, hidden files and the output
    /// directory are always ignored)
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Quiet period collecting changes into one compile pass
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// The application host (main) process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    #[serde(default = "default_host_command")]
    pub command: String,

    /// Arguments placed before the renderer port
    #[serde(default = "default_host_args")]
    pub args: Vec<String>,

    /// Append remote-debugging and inspector flags
    #[serde(default = "default_true")]
    pub debug: bool,

    #[serde(default = "default_remote_debugging_port")]
    pub remote_debugging_port: u16,

    #[serde(default = "default_inspect_port")]
    pub inspect_port: u16,
}

/// The renderer (page) dev-server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RendererConfig {
    /// When false no dev-server is started
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_renderer_command")]
    pub command: String,

    #[serde(default = "default_renderer_args")]
    pub args: Vec<String>,
}

impl Default for VoltConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            renderer_port: default_renderer_port(),
            settle_delay_ms: default_settle_delay_ms(),
            kill_timeout_ms: default_kill_timeout_ms(),
            bundler: BundlerConfig::default(),
            host: HostConfig::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            command: default_bundler_command(),
            args: default_bundler_args(),
            watch: default_watch_paths(),
            ignore: Vec::new(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            command: default_host_command(),
            args: default_host_args(),
            debug: true,
            remote_debugging_port: default_remote_debugging_port(),
            inspect_port: default_inspect_port(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_renderer_command(),
            args: default_renderer_args(),
        }
    }
}

impl VoltConfig {
    /// Substitute `{port}` and `{out_dir}` in an argument list.
    pub fn expand_args(&self, args: &[String]) -> Vec<String> {
        let port = self.renderer_port.to_string();
        let out_dir = self.out_dir.to_string_lossy();
        args.iter()
            .map(|arg| {
                arg.replace(PORT_PLACEHOLDER, &port)
                    .replace(OUT_DIR_PLACEHOLDER, &out_dir)
            })
            .collect()
    }

    pub fn bundler_args(&self) -> Vec<String> {
        self.expand_args(&self.bundler.args)
    }

    /// Host arguments: configured args, the renderer port, then the
    /// debugging flags when enabled.
    pub fn host_args(&self) -> Vec<String> {
        let mut args = self.expand_args(&self.host.args);
        args.push(self.renderer_port.to_string());
        if self.host.debug {
            args.push(format!(
                "--remote-debugging-port={}",
                self.host.remote_debugging_port
            ));
            args.push(format!("--inspect={}", self.host.inspect_port));
        }
        args
    }

    pub fn renderer_args(&self) -> Vec<String> {
        self.expand_args(&self.renderer.args)
    }

    /// Output directory resolved against `cwd`.
    pub fn out_dir_in(&self, cwd: &Path) -> PathBuf {
        if self.out_dir.is_absolute() {
            self.out_dir.clone()
        } else {
            cwd.join(&self.out_dir)
        }
    }

    /// Watched source paths resolved against `cwd`.
    pub fn watch_paths_in(&self, cwd: &Path) -> Vec<PathBuf> {
        self.bundler
            .watch
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { cwd.join(p) })
            .collect()
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.kill_timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.bundler.debounce_ms)
    }

    /// Generate JSON Schema for the configuration file.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(VoltConfig);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}

pub fn default_out_dir() -> PathBuf {
    PathBuf::from("app")
}

pub fn default_renderer_port() -> u16 {
    8080
}

pub fn default_settle_delay_ms() -> u64 {
    1000
}

pub fn default_kill_timeout_ms() -> u64 {
    5000
}

pub fn default_debounce_ms() -> u64 {
    100
}

pub fn default_bundler_command() -> String {
    "npx".to_string()
}

pub fn default_bundler_args() -> Vec<String> {
    [
        "webpack",
        "--mode",
        "development",
        "--entry",
        "./main/background.ts",
        "--target",
        "electron-main",
        "--output-path",
        OUT_DIR_PLACEHOLDER,
        "--output-filename",
        "background.js",
        "--devtool",
        "inline-source-map",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub fn default_watch_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("main")]
}

pub fn default_host_command() -> String {
    "electron".to_string()
}

pub fn default_host_args() -> Vec<String> {
    vec![".".to_string()]
}

pub fn default_remote_debugging_port() -> u16 {
    5858
}

pub fn default_inspect_port() -> u16 {
    9292
}

pub fn default_renderer_command() -> String {
    "next".to_string()
}

pub fn default_renderer_args() -> Vec<String> {
    vec!["-p".to_string(), PORT_PLACEHOLDER.to_string(), "renderer".to_string()]
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_host_args_match_electron_launch() {
        let config = VoltConfig::default();
        assert_eq!(
            config.host_args(),
            vec![".", "8080", "--remote-debugging-port=5858", "--inspect=9292"]
        );
    }

    #[test]
    fn test_host_args_without_debug() {
        let mut config = VoltConfig::default();
        config.host.debug = false;
        config.renderer_port = 3000;
        assert_eq!(config.host_args(), vec![".", "3000"]);
    }

    #[test]
    fn test_renderer_args_substitute_port() {
        let mut config = VoltConfig::default();
        config.renderer_port = 9000;
        assert_eq!(config.renderer_args(), vec!["-p", "9000", "renderer"]);
    }

    #[test]
    fn test_bundler_args_substitute_out_dir() {
        let mut config = VoltConfig::default();
        config.out_dir = PathBuf::from("build/main");
        let args = config.bundler_args();
        let idx = args.iter().position(|a| a == "--output-path").unwrap();
        assert_eq!(args[idx + 1], "build/main");
    }

    #[test]
    fn test_out_dir_resolution() {
        let config = VoltConfig::default();
        assert_eq!(
            config.out_dir_in(Path::new("/project")),
            PathBuf::from("/project/app")
        );
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: VoltConfig =
            serde_json::from_str(r#"{ "renderer_port": 4000, "renderer": { "enabled": false } }"#)
                .unwrap();
        assert_eq!(config.renderer_port, 4000);
        assert!(!config.renderer.enabled);
        assert_eq!(config.renderer.command, "next");
        assert_eq!(config.out_dir, PathBuf::from("app"));
        assert_eq!(config.settle_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: std::result::Result<VoltConfig, _> =
            serde_json::from_str(r#"{ "outdir": "dist" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_schema_lists_fields() {
        let schema = VoltConfig::json_schema();
        let props = schema.get("properties").unwrap();
        assert!(props.get("out_dir").is_some());
        assert!(props.get("renderer_port").is_some());
    }
}
