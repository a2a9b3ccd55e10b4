//! Rebuild notifications and the host restart queue.
//!
//! A successful compile pass bumps a counter in a single-slot
//! `watch` channel. The restart worker is the only caller of
//! [`ManagedProcess::restart`], so restarts never overlap, and any number
//! of notifications arriving while a restart is in flight (including its
//! settle delay) collapse into exactly one follow-up restart.

use crate::dev::process::{ManagedProcess, ProcessHandle};
use crate::ui;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

/// Sending half, held by the build watcher.
#[derive(Debug, Clone)]
pub struct RebuildNotifier {
    tx: Arc<watch::Sender<u64>>,
}

/// Receiving half, consumed by the restart worker.
#[derive(Debug)]
pub struct RebuildSignal {
    rx: watch::Receiver<u64>,
}

/// Create a connected notifier/signal pair.
pub fn rebuild_channel() -> (RebuildNotifier, RebuildSignal) {
    let (tx, rx) = watch::channel(0);
    (RebuildNotifier { tx: Arc::new(tx) }, RebuildSignal { rx })
}

impl RebuildNotifier {
    /// Record a successful emission.
    pub fn notify(&self) {
        self.tx.send_modify(|count| *count += 1);
    }

    /// Total notifications sent so far.
    pub fn count(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl RebuildSignal {
    /// Wait for the next notification, returning the latest count.
    ///
    /// Notifications received since the last call are coalesced. Returns
    /// `None` once every notifier has been dropped.
    pub async fn next(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

/// Host process shared between the restart worker and shutdown.
pub type SharedProcess = Arc<Mutex<ManagedProcess>>;

/// Spawn the task that restarts `host` once per (coalesced) notification.
///
/// The task ends when every [`RebuildNotifier`] has been dropped.
///
/// # Arguments
///
/// * `host` - Supervisor shared with shutdown; locked for the whole restart
/// * `signal` - Receiving half of [`rebuild_channel`]
/// * `on_restart` - Observes the result of every restart attempt
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio::sync::Mutex;
/// use volt_cli::dev::restart::{report_restart, spawn_restart_worker};
/// use volt_cli::dev::{ManagedProcess, ProcessRole, ProcessSpec, rebuild_channel};
///
/// # async fn example() {
/// let host = ManagedProcess::new(ProcessSpec::new(ProcessRole::Host, "electron", "."));
/// let (notifier, signal) = rebuild_channel();
/// let worker = spawn_restart_worker(Arc::new(Mutex::new(host)), signal, report_restart);
///
/// notifier.notify();
/// drop(notifier);
/// worker.await.ok();
/// # }
/// ```
pub fn spawn_restart_worker<F>(
    host: SharedProcess,
    mut signal: RebuildSignal,
    on_restart: F,
) -> JoinHandle<()>
where
    F: Fn(&crate::Result<ProcessHandle>) + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(count) = signal.next().await {
            tracing::debug!(notifications = count, "Restarting host after rebuild");
            let result = {
                let mut host = host.lock().await;
                if !host.role().restarts_on_rebuild() {
                    continue;
                }
                host.restart().await
            };
            on_restart(&result);
        }
    })
}

/// Default restart reporting.
pub fn report_restart(result: &crate::Result<ProcessHandle>) {
    match result {
        Ok(handle) if handle.generation == 1 => {
            ui::success(&format!("Started host process (pid {})", handle.pid))
        }
        Ok(handle) => ui::success(&format!("Restarted host process (pid {})", handle.pid)),
        Err(e) => ui::error(&format!("Failed to restart host process: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notifications_coalesce() {
        let (notifier, mut signal) = rebuild_channel();
        notifier.notify();
        notifier.notify();
        notifier.notify();

        assert_eq!(signal.next().await, Some(3));
        assert_eq!(notifier.count(), 3);

        // Nothing pending after the burst was consumed
        let pending = tokio::time::timeout(std::time::Duration::from_millis(50), signal.next()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_signal_ends_when_notifier_dropped() {
        let (notifier, mut signal) = rebuild_channel();
        drop(notifier);
        assert_eq!(signal.next().await, None);
    }
}
