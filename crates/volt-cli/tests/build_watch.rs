//! Integration tests for the bundler watch session.

#![cfg(unix)]

use parking_lot::Mutex;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::time::{Duration, sleep, timeout};
use volt_cli::CliError;
use volt_cli::dev::{
    BuildOutcome, BuildReporter, BuildWatcher, Bundler, WatchOptions, rebuild_channel,
};

/// Records every pass instead of printing it.
#[derive(Default)]
struct Recorder {
    outcomes: Mutex<Vec<BuildOutcome>>,
}

impl BuildReporter for Recorder {
    fn report(&self, outcome: &BuildOutcome) {
        self.outcomes.lock().push(outcome.clone());
    }
}

impl Recorder {
    async fn wait_for(&self, passes: usize) {
        for _ in 0..100 {
            if self.outcomes.lock().len() >= passes {
                return;
            }
            sleep(Duration::from_millis(50)).await;
        }
        panic!("expected {} compile passes", passes);
    }
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("main")).unwrap();
    fs::write(temp.path().join("main/background.ts"), "export {};\n").unwrap();
    temp
}

fn sh_bundler(root: &Path, script: &str) -> Bundler {
    Bundler::new(
        "sh",
        vec!["-c".to_string(), script.to_string()],
        root.to_path_buf(),
        root.join("app"),
    )
}

fn options(root: &Path) -> WatchOptions {
    WatchOptions {
        root: root.to_path_buf(),
        paths: vec![root.join("main")],
        ignore: vec![],
        debounce: Duration::from_millis(50),
    }
}

#[tokio::test]
async fn test_terminate_without_start_removes_output() {
    let temp = project();
    let app = temp.path().join("app");
    fs::create_dir_all(&app).unwrap();
    fs::write(app.join("background.js"), "stale").unwrap();

    let (notifier, _signal) = rebuild_channel();
    let mut watcher = BuildWatcher::new(
        sh_bundler(temp.path(), "true"),
        options(temp.path()),
        Arc::new(Recorder::default()),
        notifier,
    );

    watcher.terminate().await;
    assert!(!app.exists());
    watcher.terminate().await;
}

#[tokio::test]
async fn test_start_clears_previous_build_first() {
    let temp = project();
    let app = temp.path().join("app");
    fs::create_dir_all(&app).unwrap();
    fs::write(app.join("old.js"), "stale").unwrap();

    let (notifier, _signal) = rebuild_channel();
    let mut watcher = BuildWatcher::new(
        sh_bundler(temp.path(), "sleep 5"),
        options(temp.path()),
        Arc::new(Recorder::default()),
        notifier,
    );

    watcher.start().await.unwrap();
    assert!(!app.exists());
    assert!(watcher.is_watching());
    assert!(matches!(
        watcher.start().await,
        Err(CliError::AlreadyRunning(_))
    ));

    // Terminating mid-pass cancels the bundler
    timeout(Duration::from_secs(2), watcher.terminate()).await.unwrap();
    assert!(!watcher.is_watching());
}

#[tokio::test]
async fn test_failed_pass_does_not_notify() {
    let temp = project();
    let recorder = Arc::new(Recorder::default());
    let (notifier, mut signal) = rebuild_channel();
    let mut watcher = BuildWatcher::new(
        sh_bundler(temp.path(), "echo 'ERROR in ./main/background.ts' >&2; exit 1"),
        options(temp.path()),
        recorder.clone(),
        notifier.clone(),
    );

    watcher.start().await.unwrap();
    recorder.wait_for(1).await;

    {
        let outcomes = recorder.outcomes.lock();
        assert!(!outcomes[0].is_success());
        assert!(outcomes[0].error().unwrap().contains("ERROR in"));
    }
    assert_eq!(notifier.count(), 0);
    assert!(
        timeout(Duration::from_millis(200), signal.next())
            .await
            .is_err()
    );

    watcher.terminate().await;
}

#[tokio::test]
async fn test_successful_pass_notifies_and_change_rebuilds() {
    let temp = project();
    let recorder = Arc::new(Recorder::default());
    let (notifier, mut signal) = rebuild_channel();
    let mut watcher = BuildWatcher::new(
        sh_bundler(temp.path(), "mkdir -p app && echo bundle > app/background.js"),
        options(temp.path()),
        recorder.clone(),
        notifier,
    );

    watcher.start().await.unwrap();
    let first = timeout(Duration::from_secs(5), signal.next()).await.unwrap();
    assert_eq!(first, Some(1));
    assert!(temp.path().join("app/background.js").exists());

    fs::write(temp.path().join("main/background.ts"), "export const x = 1;\n").unwrap();
    let second = timeout(Duration::from_secs(5), signal.next()).await.unwrap();
    assert!(second.unwrap() >= 2);
    assert!(recorder.outcomes.lock().iter().all(BuildOutcome::is_success));

    watcher.terminate().await;
    assert!(!temp.path().join("app").exists());
}

#[tokio::test]
async fn test_missing_watch_path_fails_start() {
    let temp = TempDir::new().unwrap();
    let (notifier, _signal) = rebuild_channel();
    let mut watcher = BuildWatcher::new(
        sh_bundler(temp.path(), "true"),
        options(temp.path()),
        Arc::new(Recorder::default()),
        notifier,
    );

    assert!(matches!(
        watcher.start().await,
        Err(CliError::FileNotFound(_))
    ));
}

#[tokio::test]
async fn test_terminate_stops_bundler_children_before_clearing_output() {
    let temp = project();
    let app = temp.path().join("app");
    let (notifier, _signal) = rebuild_channel();
    let bundler = sh_bundler(
        temp.path(),
        "(sleep 1; mkdir -p app; echo late > app/background.js) & wait",
    )
    .kill_timeout(Duration::from_millis(500));
    let mut watcher = BuildWatcher::new(
        bundler,
        options(temp.path()),
        Arc::new(Recorder::default()),
        notifier,
    );

    watcher.start().await.unwrap();
    sleep(Duration::from_millis(200)).await;
    timeout(Duration::from_secs(3), watcher.terminate()).await.unwrap();
    assert!(!app.exists());

    // The background writer would have fired by now
    sleep(Duration::from_millis(1500)).await;
    assert!(!app.exists(), "output directory recreated after terminate");
}
