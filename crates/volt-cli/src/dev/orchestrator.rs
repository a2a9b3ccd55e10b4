//! Top-level context owning every supervised component.
//!
//! The orchestrator starts the build watcher and the renderer, lets the
//! restart worker (re)launch the host after every successful rebuild, and on
//! shutdown tears everything down in a fixed order.

use crate::dev::build_watcher::BuildWatcher;
use crate::dev::process::{ExitRecord, ManagedProcess, ProcessHandle};
use crate::dev::restart::{RebuildSignal, SharedProcess, report_restart, spawn_restart_worker};
use crate::dev::signals::{ShutdownListener, ShutdownSignal};
use crate::error::Result;
use crate::ui;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// A component torn down on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    BuildWatcher,
    Host,
    Renderer,
}

/// Teardown order: stop producing builds, then the host, then the renderer.
pub const TEARDOWN_ORDER: [Component; 3] =
    [Component::BuildWatcher, Component::Host, Component::Renderer];

/// What shutdown did.
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Signal that triggered shutdown, if any
    pub signal: Option<ShutdownSignal>,
    /// Components torn down, in order
    pub steps: Vec<Component>,
    pub host_exit: Option<ExitRecord>,
    pub renderer_exit: Option<ExitRecord>,
}

type RestartObserver = Box<dyn Fn(&Result<ProcessHandle>) + Send + 'static>;

pub struct Orchestrator {
    build: BuildWatcher,
    host: SharedProcess,
    renderer: Option<ManagedProcess>,
    rebuilds: Option<RebuildSignal>,
    on_restart: Option<RestartObserver>,
    restart_worker: Option<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(
        build: BuildWatcher,
        host: ManagedProcess,
        renderer: Option<ManagedProcess>,
        rebuilds: RebuildSignal,
    ) -> Self {
        Self {
            build,
            host: Arc::new(Mutex::new(host)),
            renderer,
            rebuilds: Some(rebuilds),
            on_restart: None,
            restart_worker: None,
        }
    }

    /// Replace the default restart reporting.
    pub fn on_restart<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Result<ProcessHandle>) + Send + 'static,
    {
        self.on_restart = Some(Box::new(observer));
        self
    }

    /// Shared handle to the host supervisor.
    pub fn host(&self) -> SharedProcess {
        self.host.clone()
    }

    /// Start the build watcher, the restart worker and the renderer.
    ///
    /// The host is not started here: the first successful compile pass
    /// launches it through the restart worker.
    pub async fn start(&mut self) -> Result<()> {
        if let Some(rebuilds) = self.rebuilds.take() {
            let observer = self
                .on_restart
                .take()
                .unwrap_or_else(|| Box::new(report_restart) as RestartObserver);
            self.restart_worker = Some(spawn_restart_worker(self.host.clone(), rebuilds, observer));
        }

        self.build.start().await?;

        if let Some(renderer) = self.renderer.as_mut() {
            let handle = renderer.start()?;
            ui::success(&format!(
                "Started renderer dev-server (pid {}): {}",
                handle.pid,
                renderer.spec().display()
            ));
        }

        Ok(())
    }

    /// Run until a shutdown is requested, then tear down.
    pub async fn run(self, mut shutdown: ShutdownListener) -> TeardownReport {
        let signal = shutdown.recv().await;
        if let Some(signal) = signal {
            ui::info(&format!("Received {}, shutting down...", signal));
        }
        let mut report = self.shutdown().await;
        report.signal = signal;
        report
    }

    /// Tear down every component in [`TEARDOWN_ORDER`].
    ///
    /// An in-flight restart is cancelled, not awaited. Individual failures
    /// are logged and do not stop the sequence.
    pub async fn shutdown(mut self) -> TeardownReport {
        if let Some(worker) = self.restart_worker.take() {
            worker.abort();
            let _ = worker.await;
        }

        let mut report = TeardownReport::default();
        for component in TEARDOWN_ORDER {
            match component {
                Component::BuildWatcher => self.build.terminate().await,
                Component::Host => {
                    report.host_exit = self.host.lock().await.terminate().await;
                }
                Component::Renderer => {
                    if let Some(renderer) = self.renderer.as_mut() {
                        report.renderer_exit = renderer.terminate().await;
                    }
                }
            }
            tracing::debug!(?component, "Torn down");
            report.steps.push(component);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_order() {
        assert_eq!(
            TEARDOWN_ORDER,
            [Component::BuildWatcher, Component::Host, Component::Renderer]
        );
    }
}
