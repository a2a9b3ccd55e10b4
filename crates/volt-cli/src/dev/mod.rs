//! Development orchestration.
//!
//! Supervises the three long-lived pieces of a desktop-app dev session:
//! - the bundler watch session that compiles the main-process code
//! - the application host, restarted after every successful compile
//! - the renderer dev-server, started once
//!
//! and tears all of them down on SIGINT/SIGTERM.

pub mod build_watcher;
pub mod builder;
pub mod orchestrator;
pub mod process;
pub mod restart;
pub mod setup;
pub mod signals;
pub mod watcher;

// Re-exports
pub use build_watcher::{BuildReporter, BuildWatcher, TerminalReporter, WatchOptions};
pub use builder::{BuildOutcome, BuildResult, Bundler};
pub use orchestrator::{Component, Orchestrator, TEARDOWN_ORDER, TeardownReport};
pub use process::{ExitRecord, ManagedProcess, ProcessHandle, ProcessRole, ProcessSpec};
pub use restart::{RebuildNotifier, RebuildSignal, SharedProcess, rebuild_channel};
pub use setup::DevSetup;
pub use signals::{
    Lifecycle, Phase, ShutdownListener, ShutdownSignal, ShutdownTrigger, install_signal_handlers,
    shutdown_channel,
};
pub use watcher::{FileChange, FileWatcher, IgnoreRules};
