//! Supervised child processes.
//!
//! The application host and the renderer dev-server share one
//! [`ManagedProcess`] type with a single termination contract: `terminate`
//! resolves only after the child has fully exited. The role decides whether
//! a successful rebuild restarts the process.

use crate::error::{CliError, Result};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

/// What a supervised process is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// Application host (main process), relaunched after every rebuild
    Host,
    /// Renderer dev-server, independent of the rebuild cycle
    Renderer,
}

impl ProcessRole {
    /// Human-readable name used in status lines and errors.
    pub fn name(self) -> &'static str {
        match self {
            ProcessRole::Host => "host process",
            ProcessRole::Renderer => "renderer dev-server",
        }
    }

    /// Whether a successful compile pass relaunches this process.
    pub fn restarts_on_rebuild(self) -> bool {
        matches!(self, ProcessRole::Host)
    }
}

/// How to launch a supervised process.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub role: ProcessRole,
    pub command: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Extra environment on top of the inherited one
    pub env: Vec<(String, String)>,
    /// Run in its own process group so terminal signals reach only volt
    pub detached: bool,
    /// Grace period between the termination request and a forced kill
    pub kill_timeout: Duration,
    /// Pause between exit and respawn on restart
    pub settle_delay: Duration,
}

impl ProcessSpec {
    /// Describe a process with no arguments, attached to volt's process
    /// group, a 5s kill timeout and a 1s settle delay.
    ///
    /// # Arguments
    ///
    /// * `role` - Host or renderer; decides the restart policy
    /// * `command` - Program to run, looked up on `PATH`
    /// * `cwd` - Working directory of the child
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use volt_cli::dev::{ProcessRole, ProcessSpec};
    ///
    /// let spec = ProcessSpec::new(ProcessRole::Host, "electron", ".")
    ///     .args([".", "8080"])
    ///     .env("NODE_ENV", "development")
    ///     .detached(true)
    ///     .kill_timeout(Duration::from_secs(2));
    /// assert_eq!(spec.display(), "electron . 8080");
    /// ```
    pub fn new(role: ProcessRole, command: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            role,
            command: command.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
            detached: false,
            kill_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_secs(1),
        }
    }

    /// Replace the argument list.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add an environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run the child as leader of its own process group. Termination then
    /// signals the whole group.
    pub fn detached(mut self, detached: bool) -> Self {
        self.detached = detached;
        self
    }

    /// Grace period between SIGTERM and the forced kill.
    pub fn kill_timeout(mut self, timeout: Duration) -> Self {
        self.kill_timeout = timeout;
        self
    }

    /// Pause between the old child's exit and the respawn in
    /// [`ManagedProcess::restart`].
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Printable command line.
    pub fn display(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(unix)]
        if self.detached {
            cmd.process_group(0);
        }

        cmd
    }
}

/// A spawned child as seen by its supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub spawned_at: Instant,
    /// 1 for the first spawn, incremented on every start
    pub generation: u64,
}

/// How a tracked child ended.
#[derive(Debug, Clone, Copy)]
pub struct ExitRecord {
    pub pid: u32,
    pub exited_at: Instant,
    pub status: Option<ExitStatus>,
    /// The child ignored the termination request and was killed
    pub forced: bool,
}

/// Owns at most one live child process.
#[derive(Debug)]
pub struct ManagedProcess {
    spec: ProcessSpec,
    child: Option<(Child, ProcessHandle)>,
    generation: u64,
    last_exit: Option<ExitRecord>,
}

impl ManagedProcess {
    /// Create a supervisor; nothing is spawned until [`start`](Self::start).
    pub fn new(spec: ProcessSpec) -> Self {
        Self {
            spec,
            child: None,
            generation: 0,
            last_exit: None,
        }
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    pub fn role(&self) -> ProcessRole {
        self.spec.role
    }

    /// Handle of the tracked child, live or not.
    pub fn handle(&self) -> Option<ProcessHandle> {
        self.child.as_ref().map(|(_, handle)| *handle)
    }

    /// Exit of the most recently terminated child.
    pub fn last_exit(&self) -> Option<ExitRecord> {
        self.last_exit
    }

    /// Whether the tracked child is still running.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some((child, _)) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Spawn the process with inherited stdio.
    ///
    /// Refuses to start while a previous child is still running; a child
    /// that already exited on its own is forgotten.
    pub fn start(&mut self) -> Result<ProcessHandle> {
        if self.is_running() {
            return Err(CliError::AlreadyRunning(self.spec.role.name().to_string()));
        }

        let child = self.spec.command().spawn().map_err(|source| CliError::Spawn {
            name: self.spec.role.name().to_string(),
            command: self.spec.command.clone(),
            source,
        })?;

        self.generation += 1;
        let handle = ProcessHandle {
            pid: child.id().unwrap_or_default(),
            spawned_at: Instant::now(),
            generation: self.generation,
        };
        tracing::debug!(
            pid = handle.pid,
            generation = handle.generation,
            "Spawned {}: {}",
            self.spec.role.name(),
            self.spec.display()
        );
        self.child = Some((child, handle));
        Ok(handle)
    }

    /// Terminate the tracked child and wait until it has fully exited.
    ///
    /// Resolves immediately with `None` when nothing is tracked or the child
    /// already exited. Otherwise sends a termination request, waits up to the
    /// kill timeout, then kills. A detached child is signalled as a whole
    /// process group. Never fails; problems are logged.
    ///
    /// The child stays tracked until its exit is observed, so a cancelled
    /// call can be repeated.
    pub async fn terminate(&mut self) -> Option<ExitRecord> {
        let (child, handle) = self.child.as_mut()?;
        let pid = handle.pid;

        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(pid, %status, "{} had already exited", self.spec.role.name());
                #[cfg(unix)]
                if self.spec.detached {
                    kill_leftovers(pid);
                }
                self.child = None;
                return None;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(pid, "Failed to poll {}: {}", self.spec.role.name(), e);
            }
        }

        let stopped = stop_child(child, self.spec.detached, self.spec.kill_timeout).await;
        let record = ExitRecord {
            pid,
            exited_at: Instant::now(),
            status: stopped.status,
            forced: stopped.forced,
        };
        tracing::debug!(
            pid,
            status = ?record.status,
            forced = record.forced,
            "{} exited",
            self.spec.role.name()
        );
        self.child = None;
        self.last_exit = Some(record);
        Some(record)
    }

    /// Terminate, wait the settle delay, then start again.
    ///
    /// The previous child has fully exited before the new one is spawned.
    pub async fn restart(&mut self) -> Result<ProcessHandle> {
        self.terminate().await;
        tokio::time::sleep(self.spec.settle_delay).await;
        self.start()
    }
}

/// How [`stop_child`] ended a child.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Stopped {
    pub status: Option<ExitStatus>,
    /// The termination request was ignored and the child was killed
    pub forced: bool,
}

/// Ask `child` to exit, kill it once `grace` passes, and reap it.
///
/// With `group` set the child must lead its own process group: every
/// signal goes to the whole group, and members still alive after the
/// leader exited are killed as well. Launchers such as `npx` or the
/// `electron` shim run the real program as a grandchild, which would
/// otherwise outlive the supervised pid.
pub(crate) async fn stop_child(child: &mut Child, group: bool, grace: Duration) -> Stopped {
    let pid = child.id();

    if let Err(e) = send_signal(child, group, false) {
        tracing::warn!(?pid, "Failed to request termination: {}", e);
    }

    let stopped = match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => Stopped {
            status: Some(status),
            forced: false,
        },
        Ok(Err(e)) => {
            tracing::warn!(?pid, "Failed to wait for child: {}", e);
            Stopped {
                status: None,
                forced: false,
            }
        }
        Err(_) => {
            tracing::warn!(?pid, "Child did not exit within {:?}, killing it", grace);
            if let Err(e) = send_signal(child, group, true) {
                tracing::warn!(?pid, "Failed to kill child: {}", e);
            }
            Stopped {
                status: child.wait().await.ok(),
                forced: true,
            }
        }
    };

    #[cfg(unix)]
    if group {
        if let Some(pgid) = pid {
            kill_leftovers(pgid);
        }
    }

    stopped
}

#[cfg(unix)]
fn send_signal(child: &mut Child, group: bool, force: bool) -> std::io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill, killpg};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = Pid::from_raw(pid as i32);
    let signal = if force { Signal::SIGKILL } else { Signal::SIGTERM };
    let result = if group {
        killpg(pid, signal)
    } else {
        kill(pid, signal)
    };

    match result {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn send_signal(child: &mut Child, _group: bool, _force: bool) -> std::io::Result<()> {
    child.start_kill()
}

/// SIGKILL whatever is left of a process group whose leader has exited.
#[cfg(unix)]
fn kill_leftovers(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        Ok(()) => tracing::debug!(pgid, "Killed leftover members of process group"),
        Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pgid, "Failed to kill process group: {}", e),
    }
}
