//! One compile pass of the external bundler.
//!
//! The bundler is run as a one-shot child per pass with development
//! settings injected. Its exit status decides success; its output becomes
//! either the build summary or the error report.

use crate::dev::process::stop_child;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use volt_config::{NODE_ENV, NODE_ENV_DEVELOPMENT};

/// Result of one compile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// 1 for the initial pass
    pub pass: u64,
    pub duration: Duration,
    pub result: BuildResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResult {
    /// Bundler exited successfully and artifacts were emitted
    Success {
        /// Bundler output
        log: String,
        /// Emitted top-level files as (name, size)
        files: Vec<(String, u64)>,
    },
    /// Bundler reported errors or could not run
    Failed {
        exit_code: Option<i32>,
        error: String,
    },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.result, BuildResult::Success { .. })
    }

    /// Error text of a failed pass.
    pub fn error(&self) -> Option<&str> {
        match &self.result {
            BuildResult::Failed { error, .. } => Some(error),
            BuildResult::Success { .. } => None,
        }
    }
}

/// Runs the configured bundler command.
#[derive(Debug, Clone)]
pub struct Bundler {
    command: String,
    args: Vec<String>,
    cwd: PathBuf,
    out_dir: PathBuf,
    kill_timeout: Duration,
}

impl Bundler {
    /// Create a bundler runner.
    ///
    /// # Arguments
    ///
    /// * `command` - Program started once per pass
    /// * `args` - Its arguments, placeholders already expanded
    /// * `cwd` - Directory the bundler runs in
    /// * `out_dir` - Where the bundler writes; listed after a successful pass
    pub fn new(command: impl Into<String>, args: Vec<String>, cwd: PathBuf, out_dir: PathBuf) -> Self {
        Self {
            command: command.into(),
            args,
            cwd,
            out_dir,
            kill_timeout: Duration::from_secs(5),
        }
    }

    /// Grace period for a cancelled pass before its processes are killed.
    pub fn kill_timeout(mut self, timeout: Duration) -> Self {
        self.kill_timeout = timeout;
        self
    }

    pub fn out_dir(&self) -> &PathBuf {
        &self.out_dir
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .env(NODE_ENV, NODE_ENV_DEVELOPMENT)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own group so a cancelled pass takes the compiler started by
        // launchers like npx down with it
        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }

    /// Run one compile pass unless `cancel` resolves first.
    ///
    /// Never fails: a bundler that cannot be spawned is reported as a failed
    /// pass so the watch keeps running. On cancellation the bundler's whole
    /// process group is stopped and reaped before `None` is returned, so
    /// nothing writes to the output directory afterwards.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example(bundler: volt_cli::dev::Bundler) {
    /// let outcome = bundler.run(1, std::future::pending()).await;
    /// assert!(outcome.is_some());
    /// # }
    /// ```
    pub async fn run<C>(&self, pass: u64, cancel: C) -> Option<BuildOutcome>
    where
        C: Future<Output = ()>,
    {
        let start = Instant::now();
        tracing::debug!(pass, "Running bundler: {} {}", self.command, self.args.join(" "));

        let mut child = match self.command().spawn() {
            Ok(child) => child,
            Err(e) => {
                return Some(BuildOutcome {
                    pass,
                    duration: start.elapsed(),
                    result: BuildResult::Failed {
                        exit_code: None,
                        error: format!("failed to run bundler '{}': {}", self.command, e),
                    },
                });
            }
        };

        let stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr = tokio::spawn(read_pipe(child.stderr.take()));

        tokio::pin!(cancel);
        let status = tokio::select! {
            status = child.wait() => status,
            _ = &mut cancel => {
                tracing::debug!(pass, "Stopping bundler");
                stop_child(&mut child, true, self.kill_timeout).await;
                stdout.abort();
                stderr.abort();
                return None;
            }
        };

        let stdout = stdout.await.unwrap_or_default();
        let stderr = stderr.await.unwrap_or_default();

        let result = match status {
            Ok(status) if status.success() => BuildResult::Success {
                log: String::from_utf8_lossy(&stdout).into_owned(),
                files: self.emitted_files().await,
            },
            Ok(status) => {
                let stderr = String::from_utf8_lossy(&stderr);
                // Some bundlers (webpack) print compile errors on stdout
                let error = if stderr.trim().is_empty() {
                    String::from_utf8_lossy(&stdout).into_owned()
                } else {
                    stderr.into_owned()
                };
                BuildResult::Failed {
                    exit_code: status.code(),
                    error,
                }
            }
            Err(e) => BuildResult::Failed {
                exit_code: None,
                error: format!("failed to wait for bundler '{}': {}", self.command, e),
            },
        };

        Some(BuildOutcome {
            pass,
            duration: start.elapsed(),
            result,
        })
    }

    /// List top-level files in the output directory, sorted by name.
    async fn emitted_files(&self) -> Vec<(String, u64)> {
        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.out_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("No output to list in {}: {}", self.out_dir.display(), e);
                return files;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            files.push((entry.file_name().to_string_lossy().into_owned(), metadata.len()));
        }

        files.sort();
        files
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            tracing::debug!("Failed to read bundler output: {}", e);
        }
    }
    buf
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, cwd: &TempDir) -> Bundler {
        Bundler::new(
            "sh",
            vec!["-c".to_string(), script.to_string()],
            cwd.path().to_path_buf(),
            cwd.path().join("app"),
        )
    }

    async fn run(bundler: &Bundler, pass: u64) -> BuildOutcome {
        bundler.run(pass, std::future::pending()).await.unwrap()
    }

    #[tokio::test]
    async fn test_successful_pass_lists_outputs() {
        let temp = TempDir::new().unwrap();
        let bundler = sh(
            "mkdir -p app && printf 'x' > app/background.js && echo compiled",
            &temp,
        );

        let outcome = run(&bundler, 1).await;
        assert!(outcome.is_success());
        match outcome.result {
            BuildResult::Success { log, files } => {
                assert!(log.contains("compiled"));
                assert_eq!(files, vec![("background.js".to_string(), 1)]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_pass_captures_stderr() {
        let temp = TempDir::new().unwrap();
        let outcome = run(&sh("echo 'Module not found' >&2; exit 2", &temp), 4).await;
        assert_eq!(outcome.pass, 4);
        assert!(!outcome.is_success());
        assert!(outcome.error().unwrap().contains("Module not found"));
        assert!(matches!(
            outcome.result,
            BuildResult::Failed { exit_code: Some(2), .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_pass_falls_back_to_stdout() {
        let temp = TempDir::new().unwrap();
        let outcome = run(&sh("echo 'ERROR in ./main/background.ts'; exit 1", &temp), 1).await;
        assert!(outcome.error().unwrap().contains("ERROR in"));
    }

    #[tokio::test]
    async fn test_node_env_is_injected() {
        let temp = TempDir::new().unwrap();
        let outcome = run(&sh("test \"$NODE_ENV\" = development", &temp), 1).await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_missing_bundler_is_failed_pass() {
        let temp = TempDir::new().unwrap();
        let bundler = Bundler::new(
            "volt-definitely-not-a-real-bundler",
            vec![],
            temp.path().to_path_buf(),
            temp.path().join("app"),
        );
        let outcome = run(&bundler, 1).await;
        assert!(outcome.error().unwrap().contains("failed to run bundler"));
    }

    #[tokio::test]
    async fn test_cancelled_pass_stops_background_writers() {
        let temp = TempDir::new().unwrap();
        let bundler = sh(
            "(sleep 1; mkdir -p app; echo late > app/background.js) & wait",
            &temp,
        )
        .kill_timeout(Duration::from_millis(500));

        let cancel = tokio::time::sleep(Duration::from_millis(200));
        assert!(bundler.run(1, cancel).await.is_none());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!temp.path().join("app").exists());
    }
}
