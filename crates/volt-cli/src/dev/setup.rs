//! Turns a loaded [`VoltConfig`] into the supervised components.

use crate::dev::build_watcher::{BuildReporter, BuildWatcher, WatchOptions};
use crate::dev::builder::Bundler;
use crate::dev::orchestrator::Orchestrator;
use crate::dev::process::{ManagedProcess, ProcessRole, ProcessSpec};
use crate::dev::restart::rebuild_channel;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use volt_config::{LaunchContext, NODE_ENV, NODE_ENV_DEVELOPMENT, VoltConfig};

/// Development session settings: configuration plus the directory every
/// child runs in.
#[derive(Debug, Clone)]
pub struct DevSetup {
    pub config: VoltConfig,
    pub cwd: PathBuf,
}

impl DevSetup {
    /// # Arguments
    ///
    /// * `config` - Loaded and validated configuration
    /// * `cwd` - Project directory; relative paths in `config` resolve here
    pub fn new(config: VoltConfig, cwd: impl Into<PathBuf>) -> Self {
        Self {
            config,
            cwd: cwd.into(),
        }
    }

    /// Absolute output directory, deleted before the first pass and on
    /// shutdown.
    pub fn out_dir(&self) -> PathBuf {
        self.config.out_dir_in(&self.cwd)
    }

    /// Bundler runner with placeholders expanded.
    pub fn bundler(&self) -> Bundler {
        Bundler::new(
            self.config.bundler.command.clone(),
            self.config.bundler_args(),
            self.cwd.clone(),
            self.out_dir(),
        )
        .kill_timeout(self.config.kill_timeout())
    }

    /// Watched source paths, ignore patterns and debounce.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            root: self.cwd.clone(),
            paths: self.config.watch_paths_in(&self.cwd),
            ignore: self.config.bundler.ignore.clone(),
            debounce: self.config.debounce(),
        }
    }

    /// The host runs detached from volt's process group with
    /// `NODE_ENV=development`.
    pub fn host_spec(&self) -> ProcessSpec {
        ProcessSpec::new(ProcessRole::Host, self.config.host.command.clone(), &self.cwd)
            .args(self.config.host_args())
            .env(NODE_ENV, NODE_ENV_DEVELOPMENT)
            .detached(true)
            .kill_timeout(self.config.kill_timeout())
            .settle_delay(self.config.settle_delay())
    }

    /// `None` when the renderer dev-server is disabled.
    pub fn renderer_spec(&self) -> Option<ProcessSpec> {
        if !self.config.renderer.enabled {
            return None;
        }
        Some(
            ProcessSpec::new(
                ProcessRole::Renderer,
                self.config.renderer.command.clone(),
                &self.cwd,
            )
            .args(self.config.renderer_args())
            .kill_timeout(self.config.kill_timeout()),
        )
    }

    /// What the host will load once launched, derived from the
    /// environment and argv it receives.
    pub fn host_launch(&self) -> LaunchContext {
        let spec = self.host_spec();
        let node_env = spec
            .env
            .iter()
            .rev()
            .find(|(key, _)| key == NODE_ENV)
            .map(|(_, value)| value.as_str());
        let argv: Vec<String> = std::iter::once(spec.command.clone())
            .chain(spec.args.iter().cloned())
            .collect();
        LaunchContext::resolve(node_env, &argv)
    }

    /// Wire every component into a fresh orchestrator.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use volt_cli::dev::{DevSetup, TerminalReporter};
    /// use volt_config::VoltConfig;
    ///
    /// # async fn example() -> volt_cli::Result<()> {
    /// let setup = DevSetup::new(VoltConfig::default(), "/path/to/app");
    /// let mut orchestrator = setup.orchestrator(Arc::new(TerminalReporter));
    /// orchestrator.start().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn orchestrator(&self, reporter: Arc<dyn BuildReporter>) -> Orchestrator {
        let (notifier, rebuilds) = rebuild_channel();
        let build = BuildWatcher::new(self.bundler(), self.watch_options(), reporter, notifier);
        let host = ManagedProcess::new(self.host_spec());
        let renderer = self.renderer_spec().map(ManagedProcess::new);
        Orchestrator::new(build, host, renderer, rebuilds)
    }
}

/// Resolve `dir` against the current directory.
pub fn resolve_cwd(dir: Option<&Path>) -> std::io::Result<PathBuf> {
    let current = std::env::current_dir()?;
    Ok(match dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => current.join(dir),
        None => current,
    })
}
