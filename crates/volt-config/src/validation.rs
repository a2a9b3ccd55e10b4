//! Logical validation of a loaded configuration.

use std::path::{Component, Path, PathBuf};

use crate::config::VoltConfig;
use crate::error::{ConfigError, Result};

impl VoltConfig {
    /// Validate configuration for logical consistency.
    ///
    /// `root` is the working directory the output directory is resolved
    /// against. The output directory is deleted recursively, so it must not
    /// be the root itself or one of its ancestors.
    pub fn validate(&self, root: &Path) -> Result<()> {
        require_command("bundler.command", &self.bundler.command)?;
        require_command("host.command", &self.host.command)?;
        if self.renderer.enabled {
            require_command("renderer.command", &self.renderer.command)?;
        }

        if self.renderer_port == 0 {
            return Err(invalid("renderer_port", "port must be between 1 and 65535"));
        }

        if self.bundler.debounce_ms == 0 {
            return Err(invalid("bundler.debounce_ms", "debounce must be at least 1ms"));
        }

        if self.bundler.watch.is_empty() {
            return Err(ConfigError::MissingField("bundler.watch".to_string()));
        }

        validate_out_dir(&self.out_dir, root)?;

        if self.host.debug {
            if self.host.remote_debugging_port == 0 || self.host.inspect_port == 0 {
                return Err(invalid("host", "debugging ports must be non-zero"));
            }
            if self.host.remote_debugging_port == self.host.inspect_port {
                return Err(invalid(
                    "host.inspect_port",
                    "inspector and remote debugging ports must differ",
                ));
            }
        }

        Ok(())
    }
}

fn require_command(field: &str, command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Err(invalid(field, "command cannot be empty"));
    }
    Ok(())
}

fn validate_out_dir(out_dir: &Path, root: &Path) -> Result<()> {
    let relative = normalize(out_dir);
    if relative.as_os_str().is_empty() {
        return Err(invalid("out_dir", "output directory cannot be the working directory"));
    }
    if relative.components().any(|c| c == Component::ParentDir) {
        return Err(invalid("out_dir", "output directory must not contain '..'"));
    }

    let resolved = normalize(&root.join(out_dir));
    if normalize(root).starts_with(&resolved) {
        return Err(invalid(
            "out_dir",
            "output directory cannot contain the working directory",
        ));
    }
    Ok(())
}

/// Lexically drop `.` components.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| *c != Component::CurDir)
        .collect()
}

fn invalid(field: &str, hint: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        hint: hint.to_string(),
    }
}
