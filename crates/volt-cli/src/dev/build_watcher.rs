//! Bundler watch session.
//!
//! [`BuildWatcher`] owns the output directory and one watch session: a
//! file watcher over the main-process sources plus a task that runs a
//! compile pass at startup and after every debounced batch of changes.
//! Every pass goes to the [`BuildReporter`]; only successful passes raise a
//! rebuild notification.

use crate::dev::builder::{BuildOutcome, BuildResult, Bundler};
use crate::dev::restart::RebuildNotifier;
use crate::dev::watcher::{FileChange, FileWatcher, IgnoreRules};
use crate::error::{CliError, Result};
use crate::ui;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Receives the result of every compile pass.
pub trait BuildReporter: Send + Sync {
    fn report(&self, outcome: &BuildOutcome);
}

/// Prints failures to stderr and summaries to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalReporter;

impl BuildReporter for TerminalReporter {
    fn report(&self, outcome: &BuildOutcome) {
        match &outcome.result {
            BuildResult::Success { log, files } => {
                ui::print_build_summary(outcome.pass, outcome.duration, files, log);
            }
            BuildResult::Failed { exit_code, error } => {
                let code = exit_code
                    .map(|c| format!(" (exit code {})", c))
                    .unwrap_or_default();
                ui::error(&format!("Build #{} failed{}", outcome.pass, code));
                eprintln!("{}", error.trim_end());
            }
        }
    }
}

/// What the watch session needs besides the bundler itself.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Project root; changes outside it are ignored
    pub root: PathBuf,
    /// Source paths watched recursively
    pub paths: Vec<PathBuf>,
    /// Extra ignore patterns
    pub ignore: Vec<String>,
    /// Quiet period collecting changes into one pass
    pub debounce: Duration,
}

struct WatchSession {
    watcher: FileWatcher,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Manages a single bundler watch session.
pub struct BuildWatcher {
    bundler: Arc<Bundler>,
    options: WatchOptions,
    reporter: Arc<dyn BuildReporter>,
    notifier: RebuildNotifier,
    session: Option<WatchSession>,
}

impl BuildWatcher {
    pub fn new(
        bundler: Bundler,
        options: WatchOptions,
        reporter: Arc<dyn BuildReporter>,
        notifier: RebuildNotifier,
    ) -> Self {
        Self {
            bundler: Arc::new(bundler),
            options,
            reporter,
            notifier,
            session: None,
        }
    }

    pub fn out_dir(&self) -> &Path {
        self.bundler.out_dir()
    }

    pub fn is_watching(&self) -> bool {
        self.session.is_some()
    }

    /// Clear the previous build and start watching.
    ///
    /// The output directory is gone by the time this returns; the first
    /// compile pass runs in the background afterwards.
    pub async fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(CliError::AlreadyRunning("build watcher".to_string()));
        }

        clear_output_dir(self.out_dir()).await?;

        let root = tokio::fs::canonicalize(&self.options.root).await?;
        let out_dir = match self.out_dir().strip_prefix(&self.options.root) {
            Ok(rel) => root.join(rel),
            Err(_) => self.out_dir().to_path_buf(),
        };
        let rules = IgnoreRules::new(root.clone(), out_dir, &self.options.ignore);
        let paths = self
            .options
            .paths
            .iter()
            .map(|p| match p.strip_prefix(&self.options.root) {
                Ok(rel) => root.join(rel),
                Err(_) => p.clone(),
            })
            .collect();

        let (watcher, changes) = FileWatcher::new(paths, rules)?;
        for path in watcher.paths() {
            ui::info(&format!("Watching for changes in: {}", path.display()));
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(watch_loop(
            self.bundler.clone(),
            self.reporter.clone(),
            self.notifier.clone(),
            changes,
            stop_rx,
            self.options.debounce,
        ));

        self.session = Some(WatchSession {
            watcher,
            stop: stop_tx,
            task,
        });
        Ok(())
    }

    /// Stop watching, wait for the session to be released, then delete the
    /// output directory.
    ///
    /// A compile pass in flight is stopped together with every process it
    /// started before the directory is removed.
    ///
    /// Idempotent: the output directory is removed even if no session was
    /// ever started. Never fails; problems are logged.
    pub async fn terminate(&mut self) {
        if let Some(session) = self.session.take() {
            drop(session.watcher);
            let _ = session.stop.send(());
            if let Err(e) = session.task.await {
                if !e.is_cancelled() {
                    tracing::warn!("Build watch task ended abnormally: {}", e);
                }
            }
            tracing::debug!("Build watch session closed");
        }

        if let Err(e) = clear_output_dir(self.out_dir()).await {
            tracing::warn!("Failed to remove {}: {}", self.out_dir().display(), e);
        }
    }
}

/// Delete the output directory if it exists.
pub async fn clear_output_dir(out_dir: &Path) -> std::io::Result<()> {
    if tokio::fs::try_exists(out_dir).await? {
        tracing::debug!("Removing previous build at {}", out_dir.display());
        tokio::fs::remove_dir_all(out_dir).await?;
    }
    Ok(())
}

async fn watch_loop(
    bundler: Arc<Bundler>,
    reporter: Arc<dyn BuildReporter>,
    notifier: RebuildNotifier,
    mut changes: mpsc::Receiver<FileChange>,
    mut stop: oneshot::Receiver<()>,
    debounce: Duration,
) {
    let mut pass = 0;
    let mut pending = true;

    loop {
        if pending {
            pending = false;
            pass += 1;
            let stopped = async {
                let _ = (&mut stop).await;
            };
            let Some(outcome) = bundler.run(pass, stopped).await else {
                break;
            };
            reporter.report(&outcome);
            if outcome.is_success() {
                notifier.notify();
            }
        }

        tokio::select! {
            _ = &mut stop => break,
            change = changes.recv() => match change {
                Some(change) => {
                    ui::info(&format!("File changed: {}", change.path().display()));
                    if !drain_burst(&mut changes, debounce).await {
                        break;
                    }
                    pending = true;
                }
                None => break,
            },
        }
    }
}

/// Swallow further changes until `debounce` passes without one. Returns
/// false if the channel closed.
async fn drain_burst(changes: &mut mpsc::Receiver<FileChange>, debounce: Duration) -> bool {
    loop {
        match tokio::time::timeout(debounce, changes.recv()).await {
            Err(_) => return true,
            Ok(Some(change)) => tracing::debug!("Also changed: {}", change.path().display()),
            Ok(None) => return false,
        }
    }
}
