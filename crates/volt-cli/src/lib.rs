//! Volt CLI - development orchestrator for Electron-style desktop apps.
//!
//! Running `volt` supervises a development session:
//!
//! - the bundler recompiles the main-process code whenever its sources change
//! - the application host is restarted after every successful compile
//! - the renderer dev-server runs alongside, untouched by rebuilds
//! - SIGINT/SIGTERM tears everything down once, in a fixed order, and
//!   removes the build output
//!
//! # Architecture
//!
//! - [`cli`] - Argument parsing
//! - [`commands`] - Command implementations
//! - [`dev`] - Process supervision, the build watch and the orchestrator
//! - [`error`] - Error types with actionable hints
//! - [`logger`] - Structured logging with tracing
//! - [`ui`] - Terminal status lines and build summaries
//!
//! # Example
//!
//! ```rust
//! use volt_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
