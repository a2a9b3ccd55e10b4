//! Configuration for the volt development orchestrator.
//!
//! Describes the three external tools volt keeps in sync (the bundler, the
//! application host and the renderer dev-server), how configuration is
//! layered from defaults, files and environment, and the launch contract the
//! application host follows when it is started by volt.

pub mod config;
pub mod error;
pub mod launch;
pub mod loading;
pub mod validation;

// Re-export main types
pub use config::*;
pub use error::*;
pub use launch::{LaunchContext, LaunchMode};
pub use loading::{ConfigLoader, CONFIG_FILE_NAMES, ENV_PREFIX};
