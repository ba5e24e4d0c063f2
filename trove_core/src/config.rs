//! Sorter configuration.

use crate::classify::CategoryTable;
use crate::hash::Algorithm;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default pause between poll ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Everything a [`crate::Sorter`] needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory scanned for new files (not recursive).
    pub watch_dir: PathBuf,
    /// Root of the categorized destination tree.
    pub dest_dir: PathBuf,
    /// JSON log file.
    pub log_file: PathBuf,
    /// Pause between ticks.
    pub poll_interval: Duration,
    /// Digest used for the `hash` field of log entries.
    pub algorithm: Algorithm,
    /// Extension to category mapping.
    pub categories: CategoryTable,
}

impl Config {
    /// Default layout under `base`:
    /// - `watch_folder/` is scanned
    /// - `sorted/<category>/` receives files
    /// - `logs/log.json` is the audit log
    pub fn with_base<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref();
        Self {
            watch_dir: base.join("watch_folder"),
            dest_dir: base.join("sorted"),
            log_file: base.join("logs").join("log.json"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            algorithm: Algorithm::default(),
            categories: CategoryTable::default(),
        }
    }

    pub fn watch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.watch_dir = dir.into();
        self
    }

    pub fn dest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dest_dir = dir.into();
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = path.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn categories(mut self, categories: CategoryTable) -> Self {
        self.categories = categories;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = Config::with_base("/srv/inbox");
        assert_eq!(config.watch_dir, Path::new("/srv/inbox/watch_folder"));
        assert_eq!(config.dest_dir, Path::new("/srv/inbox/sorted"));
        assert_eq!(config.log_file, Path::new("/srv/inbox/logs/log.json"));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.algorithm, Algorithm::Sha256);
    }

    #[test]
    fn test_overrides() {
        let config = Config::with_base("base")
            .watch_dir("in")
            .dest_dir("out")
            .log_file("audit.json")
            .poll_interval(Duration::from_millis(500))
            .algorithm(Algorithm::Blake3)
            .categories(CategoryTable::empty());

        assert_eq!(config.watch_dir, Path::new("in"));
        assert_eq!(config.dest_dir, Path::new("out"));
        assert_eq!(config.log_file, Path::new("audit.json"));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.algorithm, Algorithm::Blake3);
        assert!(config.categories.is_empty());
    }
}
