//! OS termination signals and the shutdown trigger.
//!
//! SIGINT and SIGTERM are handled identically. However many signals
//! arrive, the [`Lifecycle`] lets exactly one of them through, so teardown
//! runs at most once.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Orchestrator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    ShuttingDown,
}

/// RUNNING → SHUTTING_DOWN state machine. The transition is one-way.
#[derive(Debug)]
pub struct Lifecycle {
    phase: Mutex<Phase>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            phase: Mutex::new(Phase::Running),
        }
    }
}

impl Lifecycle {
    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Move to SHUTTING_DOWN. Returns true only for the first caller.
    pub fn begin_shutdown(&self) -> bool {
        let mut phase = self.phase.lock();
        match *phase {
            Phase::Running => {
                *phase = Phase::ShuttingDown;
                true
            }
            Phase::ShuttingDown => false,
        }
    }
}

/// Fires the shutdown request. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    lifecycle: Arc<Lifecycle>,
    tx: mpsc::Sender<ShutdownSignal>,
}

/// Awaited by the orchestrator.
#[derive(Debug)]
pub struct ShutdownListener {
    lifecycle: Arc<Lifecycle>,
    rx: mpsc::Receiver<ShutdownSignal>,
}

/// Create a connected trigger/listener pair sharing one lifecycle.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownListener) {
    let lifecycle = Arc::new(Lifecycle::default());
    let (tx, rx) = mpsc::channel(1);
    (
        ShutdownTrigger {
            lifecycle: lifecycle.clone(),
            tx,
        },
        ShutdownListener { lifecycle, rx },
    )
}

impl ShutdownTrigger {
    /// Request shutdown. Returns false if shutdown was already requested.
    pub fn fire(&self, signal: ShutdownSignal) -> bool {
        if !self.lifecycle.begin_shutdown() {
            tracing::debug!("Ignoring {}: shutdown already in progress", signal);
            return false;
        }
        let _ = self.tx.try_send(signal);
        true
    }
}

impl ShutdownListener {
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Wait for the shutdown request. Returns `None` if every trigger was
    /// dropped without firing.
    pub async fn recv(&mut self) -> Option<ShutdownSignal> {
        self.rx.recv().await
    }
}

/// Install SIGINT/SIGTERM handlers forwarding every signal to `trigger`.
///
/// Handlers are registered before this returns, so a signal delivered
/// right after startup is not lost.
pub fn install_signal_handlers(trigger: ShutdownTrigger) -> std::io::Result<JoinHandle<()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        Ok(tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    Some(()) = sigint.recv() => ShutdownSignal::Interrupt,
                    Some(()) = sigterm.recv() => ShutdownSignal::Terminate,
                    else => break,
                };
                trigger.fire(received);
            }
        }))
    }

    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                trigger.fire(ShutdownSignal::Interrupt);
            }
        }))
    }
}
