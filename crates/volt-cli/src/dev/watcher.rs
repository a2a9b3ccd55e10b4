//! File system watcher for the main-process sources.
//!
//! Watches the configured source paths recursively and forwards relevant
//! changes through a channel, ignoring node_modules, the bundler's own
//! output and configured patterns.

use crate::error::{CliError, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Patterns ignored regardless of configuration.
pub const DEFAULT_IGNORE: &[&str] = &["node_modules", "*.log", "*.swp", "*~"];

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// File was modified
    Modified(PathBuf),
    /// File was created
    Created(PathBuf),
    /// File was removed
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Filter deciding which paths are relevant.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: PathBuf,
    out_dir: PathBuf,
    patterns: Vec<String>,
}

impl IgnoreRules {
    pub fn new(root: PathBuf, out_dir: PathBuf, extra: &[String]) -> Self {
        let patterns = DEFAULT_IGNORE
            .iter()
            .map(|p| p.to_string())
            .chain(extra.iter().cloned())
            .collect();
        Self {
            root,
            out_dir,
            patterns,
        }
    }

    /// Check if a path should be ignored.
    pub fn should_ignore(&self, path: &Path) -> bool {
        // The bundler writes here; reacting would rebuild forever
        if path.starts_with(&self.out_dir) {
            return true;
        }

        let rel_path = match path.strip_prefix(&self.root) {
            Ok(p) => p,
            Err(_) => return true,
        };

        let path_str = rel_path.to_string_lossy();

        for pattern in &self.patterns {
            if let Some(ext) = pattern.strip_prefix('*') {
                // Suffix pattern like "*.log"
                if path_str.ends_with(ext) {
                    return true;
                }
            } else if rel_path
                .components()
                .any(|c| c.as_os_str().to_string_lossy() == pattern.as_str())
            {
                // Directory or file name like "node_modules"
                return true;
            }
        }

        // Ignore hidden files and directories
        rel_path.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
        })
    }
}

/// Recursive watcher over a set of source paths.
///
/// Dropping the watcher stops the OS-level watch and closes the channel.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    paths: Vec<PathBuf>,
}

impl FileWatcher {
    /// Start watching `paths` and return the receiver for change events.
    ///
    /// Watcher errors raised after startup are logged and watching
    /// continues.
    ///
    /// # Errors
    ///
    /// Returns an error if a path does not exist or cannot be watched.
    pub fn new(
        paths: Vec<PathBuf>,
        rules: IgnoreRules,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        for path in &paths {
            if !path.exists() {
                return Err(CliError::FileNotFound(path.clone()));
            }
        }

        let (tx, rx) = mpsc::channel(256);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("File watcher error: {}", e);
                    return;
                }
            };

            for path in &event.paths {
                if rules.should_ignore(path) {
                    continue;
                }

                let change = match event.kind {
                    notify::EventKind::Create(_) => FileChange::Created(path.clone()),
                    notify::EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    notify::EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };

                // A full queue already guarantees another compile pass
                let _ = tx.try_send(change);
            }
        })?;

        for path in &paths {
            watcher.watch(path, RecursiveMode::Recursive)?;
        }

        Ok((
            Self {
                _watcher: watcher,
                paths,
            },
            rx,
        ))
    }

    /// Paths being watched.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(extra: &[&str]) -> IgnoreRules {
        IgnoreRules::new(
            PathBuf::from("/project"),
            PathBuf::from("/project/app"),
            &extra.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_should_ignore_output_dir() {
        let rules = rules(&[]);
        assert!(rules.should_ignore(Path::new("/project/app/background.js")));
        assert!(!rules.should_ignore(Path::new("/project/application/main.ts")));
    }

    #[test]
    fn test_should_ignore_node_modules() {
        let rules = rules(&[]);
        assert!(rules.should_ignore(Path::new("/project/main/node_modules/pkg/index.js")));
        assert!(!rules.should_ignore(Path::new("/project/main/background.ts")));
    }

    #[test]
    fn test_should_ignore_extension() {
        let rules = rules(&["*.tmp"]);
        assert!(rules.should_ignore(Path::new("/project/main/debug.log")));
        assert!(rules.should_ignore(Path::new("/project/main/file.tmp")));
        assert!(!rules.should_ignore(Path::new("/project/main/index.ts")));
    }

    #[test]
    fn test_should_ignore_configured_name() {
        let rules = rules(&["fixtures"]);
        assert!(rules.should_ignore(Path::new("/project/main/fixtures/data.json")));
        assert!(!rules.should_ignore(Path::new("/project/main/fixtures.ts")));
    }

    #[test]
    fn test_should_ignore_hidden_files() {
        let rules = rules(&[]);
        assert!(rules.should_ignore(Path::new("/project/.git/config")));
        assert!(rules.should_ignore(Path::new("/project/main/.hidden/file.ts")));
    }

    #[test]
    fn test_should_ignore_outside_root() {
        let rules = rules(&[]);
        assert!(rules.should_ignore(Path::new("/other/file.ts")));
    }

    #[test]
    fn test_file_change_path() {
        let path = PathBuf::from("/project/main/background.ts");
        assert_eq!(FileChange::Modified(path.clone()).path(), path.as_path());
        assert_eq!(FileChange::Created(path.clone()).path(), path.as_path());
        assert_eq!(FileChange::Removed(path.clone()).path(), path.as_path());
    }

    #[test]
    fn test_missing_path_is_error() {
        let result = FileWatcher::new(vec![PathBuf::from("/definitely/missing/volt")], rules(&[]));
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }
}
