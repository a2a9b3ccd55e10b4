//! Layered configuration loading.
//!
//! Priority: CLI overrides > `VOLT_*` environment > config file > defaults.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};

use crate::config::VoltConfig;
use crate::error::{ConfigError, Result};

/// Config files searched in the project root, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["volt.toml", "volt.config.json"];

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `VOLT_RENDERER__ENABLED=false`.
pub const ENV_PREFIX: &str = "VOLT_";

/// Finds and merges configuration sources for a project root.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    file: Option<PathBuf>,
    renderer_port: Option<u16>,
}

impl ConfigLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            file: None,
            renderer_port: None,
        }
    }

    /// Use an explicit config file instead of searching the root.
    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file.map(|f| if f.is_absolute() { f } else { self.root.join(f) });
        self
    }

    /// Override the renderer port (highest priority).
    pub fn with_renderer_port(mut self, port: Option<u16>) -> Self {
        self.renderer_port = port;
        self
    }

    /// Locate the config file, if any.
    pub fn find(&self) -> Option<PathBuf> {
        if let Some(file) = &self.file {
            return Some(file.clone());
        }
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| self.root.join(name))
            .find(|path| path.is_file())
    }

    /// Build the merged figment without extracting it.
    pub fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(VoltConfig::default()));

        if let Some(path) = self.find() {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path));
            }
            tracing::debug!("Loading config from {}", path.display());
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => figment.merge(Toml::file_exact(&path)),
                Some("json") => figment.merge(Json::file_exact(&path)),
                other => {
                    return Err(ConfigError::UnsupportedFormat(
                        other.unwrap_or("<none>").to_string(),
                    ));
                }
            };
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(port) = self.renderer_port {
            figment = figment.merge(Serialized::default("renderer_port", port));
        }

        Ok(figment)
    }

    /// Load and validate the configuration.
    pub fn load(&self) -> Result<VoltConfig> {
        let config: VoltConfig = self.figment()?.extract()?;
        config.validate(&self.root)?;
        Ok(config)
    }
}
