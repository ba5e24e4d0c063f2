//! The watch loop: poll a directory and sort what arrives.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::log::{LogEntry, LogStore};
use crate::mover::move_file;
use crate::summary::{Summarizer, summarizer_from_env};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// What happened to one file during a tick.
#[derive(Debug)]
pub enum FileOutcome {
    /// Moved and recorded in the log.
    Sorted(LogEntry),
    /// Moved, but the log append failed.
    Unlogged { entry: LogEntry, error: Error },
    /// Left in the watch directory; it is retried on the next tick.
    Skipped { path: PathBuf, error: Error },
}

impl FileOutcome {
    /// Whether the file left the watch directory.
    pub fn is_moved(&self) -> bool {
        !matches!(self, FileOutcome::Skipped { .. })
    }
}

/// Per-file outcomes of one tick, in processing order.
#[derive(Debug, Default)]
pub struct TickReport {
    pub outcomes: Vec<FileOutcome>,
}

impl TickReport {
    /// Files moved and logged.
    pub fn sorted(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Sorted(_)))
    }

    /// Files moved without a log entry.
    pub fn unlogged(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Unlogged { .. }))
    }

    /// Files left in place.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    /// Check if the tick found no files.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Sorts files from a watch directory into a categorized tree.
///
/// Single-threaded: each file is classified, hashed, summarized, moved and
/// logged before the next one is looked at. Assumes it is the only process
/// writing to its destination tree and log.
pub struct Sorter {
    config: Config,
    log: LogStore,
    summarizer: Box<dyn Summarizer>,
}

impl fmt::Debug for Sorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sorter")
            .field("config", &self.config)
            .field("log", &self.log)
            .field("summarizer", &self.summarizer.name())
            .finish()
    }
}

impl Sorter {
    /// Create the directory layout and open the log.
    pub fn new(config: Config, summarizer: Box<dyn Summarizer>) -> Result<Self> {
        ensure_dirs(&config)?;
        let log = LogStore::open(&config.log_file)?;

        Ok(Self {
            config,
            log,
            summarizer,
        })
    }

    /// Like [`Sorter::new`], with the summarizer chosen by `AI_API_ENABLED`.
    pub fn from_env(config: Config) -> Result<Self> {
        Self::new(config, summarizer_from_env())
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a reference to the log.
    pub fn log(&self) -> &LogStore {
        &self.log
    }

    /// Create any missing directories. Safe to call repeatedly.
    pub fn ensure_dirs(&self) -> Result<()> {
        ensure_dirs(&self.config)
    }

    /// Regular files currently in the watch directory, sorted by name.
    ///
    /// Subdirectories, symlinks and other non-regular entries are ignored.
    /// Entries that cannot be inspected are skipped with a warning; only a
    /// missing or unreadable watch directory is an error.
    pub fn pending(&self) -> Result<Vec<PathBuf>> {
        let watch_dir = &self.config.watch_dir;
        if !fs::metadata(watch_dir)?.is_dir() {
            return Err(Error::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    format!("Watch path is not a directory: {}", watch_dir.display()),
                ),
            });
        }

        let walker = ignore::WalkBuilder::new(watch_dir)
            .max_depth(Some(1)) // Only immediate children
            .standard_filters(false) // Hidden and ignored files are sorted too
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // Depth 0 is the watch directory itself: nothing can be listed
                Err(e) if e.depth().is_none_or(|d| d == 0) => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable watch entry");
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }
            if entry.file_type().is_some_and(|t| t.is_file()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Run one poll tick over a snapshot of the watch directory.
    pub fn tick(&self) -> Result<TickReport> {
        let files = self.pending()?;
        let mut report = TickReport::default();

        for path in files {
            report.outcomes.push(self.process_file(&path));
        }

        if !report.is_empty() {
            tracing::debug!(
                sorted = report.sorted(),
                unlogged = report.unlogged(),
                skipped = report.skipped(),
                "tick complete"
            );
        }

        Ok(report)
    }

    /// Sort a single file: classify, hash, summarize, move, then log.
    ///
    /// Failures before the move leave the file where it is. Once the file
    /// has moved, the log append is still attempted and its failure is
    /// reported as [`FileOutcome::Unlogged`].
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let entry = match self.relocate(path) {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(file = %name, error = %error, "error processing file");
                return FileOutcome::Skipped {
                    path: path.to_path_buf(),
                    error,
                };
            }
        };

        match self.log.append(&entry) {
            Ok(()) => {
                tracing::info!(
                    "Processed {} -> {} (hash={})",
                    entry.original_name,
                    entry.category,
                    entry.hash.short()
                );
                FileOutcome::Sorted(entry)
            }
            Err(error) => {
                tracing::warn!(
                    file = %name,
                    destination = %entry.destination,
                    error = %error,
                    "moved file but could not log it"
                );
                FileOutcome::Unlogged { entry, error }
            }
        }
    }

    /// Poll forever, sleeping the configured interval between ticks.
    pub fn watch(&self) -> ! {
        tracing::info!("Watching folder: {}", self.config.watch_dir.display());
        loop {
            self.run_tick();
            std::thread::sleep(self.config.poll_interval);
        }
    }

    /// Run `ticks` ticks with the poll interval between them.
    ///
    /// Returns the report of every tick that could list the watch
    /// directory.
    pub fn watch_for(&self, ticks: usize) -> Vec<TickReport> {
        let mut reports = Vec::with_capacity(ticks);
        for i in 0..ticks {
            if i > 0 {
                std::thread::sleep(self.config.poll_interval);
            }
            if let Some(report) = self.run_tick() {
                reports.push(report);
            }
        }
        reports
    }

    /// Tick, logging instead of returning a listing failure.
    fn run_tick(&self) -> Option<TickReport> {
        match self.tick() {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(
                    watch_dir = %self.config.watch_dir.display(),
                    error = %e,
                    "could not list watch folder"
                );
                None
            }
        }
    }

    /// Everything up to and including the move. Builds the log entry.
    fn relocate(&self, path: &Path) -> Result<LogEntry> {
        // The move works on the raw OsStr; only the log gets a lossy copy
        let original_name = path
            .file_name()
            .ok_or_else(|| Error::invalid_file_name(path))?
            .to_string_lossy()
            .into_owned();

        let category = self.config.categories.classify(&original_name).to_string();
        let hash = Hash::hash_file(self.config.algorithm, path)?;
        let summary = self.summarizer.summarize(path);
        let destination = move_file(path, &category, &self.config.dest_dir)?;

        Ok(LogEntry::new(
            unix_now(),
            original_name,
            destination.display().to_string(),
            category,
            hash,
            summary,
        ))
    }
}

/// Create the watch directory, destination root, one directory per
/// category, and the log directory.
pub fn ensure_dirs(config: &Config) -> Result<()> {
    fs::create_dir_all(&config.watch_dir)?;
    fs::create_dir_all(&config.dest_dir)?;
    for category in config.categories.categories() {
        fs::create_dir_all(config.dest_dir.join(category))?;
    }
    if let Some(parent) = config.log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::CategoryTable;
    use crate::hash::Algorithm;
    use crate::summary::{HeuristicSummarizer, IMAGE_SUMMARY};
    use std::time::Duration;
    use tempfile::TempDir;

    struct NoSummary;

    impl Summarizer for NoSummary {
        fn summarize(&self, _path: &Path) -> Option<String> {
            None
        }

        fn name(&self) -> &'static str {
            "none"
        }
    }

    fn sorter(temp_dir: &TempDir) -> Sorter {
        let config = Config::with_base(temp_dir.path()).poll_interval(Duration::from_millis(1));
        Sorter::new(config, Box::new(HeuristicSummarizer)).unwrap()
    }

    fn drop_file(sorter: &Sorter, name: &str, content: &[u8]) -> PathBuf {
        let path = sorter.config().watch_dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_new_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);
        let config = sorter.config();

        assert!(config.watch_dir.is_dir());
        assert!(config.log_file.is_file());
        assert_eq!(
            dir_names(&config.dest_dir),
            vec![
                "archives",
                "audio",
                "code",
                "documents",
                "images",
                "others",
                "spreadsheets",
                "video"
            ]
        );
    }

    #[test]
    fn test_ensure_dirs_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);
        let before = dir_names(&sorter.config().dest_dir);

        sorter.ensure_dirs().unwrap();
        sorter.ensure_dirs().unwrap();

        assert_eq!(dir_names(&sorter.config().dest_dir), before);
        assert!(sorter.log().is_empty().unwrap());
    }

    #[test]
    fn test_sort_text_file() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);
        let source = drop_file(&sorter, "notes.txt", b"remember the milk");

        let report = sorter.tick().unwrap();
        assert_eq!(report.sorted(), 1);

        let dest = sorter.config().dest_dir.join("documents").join("notes.txt");
        assert!(dest.is_file());
        assert!(!source.exists());
        assert!(dir_names(&sorter.config().watch_dir).is_empty());

        let entries = sorter.log().entries().unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.original_name, "notes.txt");
        assert_eq!(entry.category, "documents");
        assert_eq!(entry.destination, dest.display().to_string());
        assert_eq!(
            entry.hash,
            Hash::hash_bytes(Algorithm::Sha256, b"remember the milk")
        );
        assert_eq!(entry.summary.as_deref(), Some("remember the milk"));
        assert!(entry.timestamp > 0);
    }

    #[test]
    fn test_same_name_across_ticks() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);

        drop_file(&sorter, "photo.png", b"first picture");
        sorter.tick().unwrap();
        drop_file(&sorter, "photo.png", b"second picture");
        sorter.tick().unwrap();

        let images = sorter.config().dest_dir.join("images");
        assert_eq!(dir_names(&images), vec!["photo.png", "photo_1.png"]);

        let algo = Algorithm::Sha256;
        let first = Hash::hash_file(algo, &images.join("photo.png")).unwrap();
        let second = Hash::hash_file(algo, &images.join("photo_1.png")).unwrap();
        assert_eq!(first, Hash::hash_bytes(algo, b"first picture"));
        assert_eq!(second, Hash::hash_bytes(algo, b"second picture"));

        let entries = sorter.log().entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].hash, first);
        assert_eq!(entries[1].hash, second);
        assert!(entries[1].destination.ends_with("photo_1.png"));
        assert_eq!(entries[1].summary.as_deref(), Some(IMAGE_SUMMARY));
    }

    #[test]
    fn test_tick_order_and_filtering() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);

        drop_file(&sorter, "b.mp3", b"b");
        drop_file(&sorter, "a.csv", b"a");
        drop_file(&sorter, ".hidden", b"h");
        fs::create_dir(sorter.config().watch_dir.join("nested")).unwrap();
        fs::write(sorter.config().watch_dir.join("nested").join("deep.txt"), b"d").unwrap();

        let report = sorter.tick().unwrap();
        assert_eq!(report.sorted(), 3);

        let names: Vec<_> = sorter
            .log()
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| (e.original_name, e.category))
            .collect();
        assert_eq!(
            names,
            vec![
                (".hidden".to_string(), "others".to_string()),
                ("a.csv".to_string(), "spreadsheets".to_string()),
                ("b.mp3".to_string(), "audio".to_string()),
            ]
        );

        // Subdirectories are left alone
        assert_eq!(dir_names(&sorter.config().watch_dir), vec!["nested"]);
        assert!(
            sorter
                .config()
                .watch_dir
                .join("nested")
                .join("deep.txt")
                .exists()
        );
    }

    #[test]
    fn test_empty_tick() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);

        let report = sorter.tick().unwrap();
        assert!(report.is_empty());
        assert!(sorter.log().is_empty().unwrap());
    }

    #[test]
    fn test_failed_move_skips_and_retries() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);
        let documents = sorter.config().dest_dir.join("documents");

        // A plain file where the category directory should be
        fs::remove_dir(&documents).unwrap();
        fs::write(&documents, b"in the way").unwrap();

        let blocked = drop_file(&sorter, "report.pdf", b"%PDF-1.4");
        let fine = drop_file(&sorter, "song.wav", b"RIFF");

        let report = sorter.tick().unwrap();
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.sorted(), 1);
        match &report.outcomes[0] {
            FileOutcome::Skipped { path, .. } => assert_eq!(path, &blocked),
            other => panic!("expected skip, got {:?}", other),
        }
        assert!(blocked.exists());
        assert!(!fine.exists());
        assert_eq!(sorter.log().len().unwrap(), 1);

        // Retried on the next tick once the obstacle is gone
        fs::remove_file(&documents).unwrap();
        let report = sorter.tick().unwrap();
        assert_eq!(report.sorted(), 1);
        assert!(!blocked.exists());
        assert!(documents.join("report.pdf").is_file());
        assert_eq!(sorter.log().len().unwrap(), 2);
    }

    #[test]
    fn test_vanished_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);
        let ghost = sorter.config().watch_dir.join("ghost.txt");

        let outcome = sorter.process_file(&ghost);
        assert!(matches!(
            outcome,
            FileOutcome::Skipped {
                error: Error::Io { .. },
                ..
            }
        ));
        assert!(!outcome.is_moved());
        assert!(sorter.log().is_empty().unwrap());
    }

    #[test]
    fn test_log_failure_after_move_is_unlogged() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);

        // A directory in place of the log file cannot be replaced by rename
        let log_file = sorter.config().log_file.clone();
        fs::remove_file(&log_file).unwrap();
        fs::create_dir(&log_file).unwrap();

        let source = drop_file(&sorter, "clip.mov", b"moov");
        let report = sorter.tick().unwrap();

        assert_eq!(report.unlogged(), 1);
        assert!(report.outcomes[0].is_moved());
        assert!(!source.exists());
        assert!(
            sorter
                .config()
                .dest_dir
                .join("video")
                .join("clip.mov")
                .is_file()
        );
    }

    #[test]
    fn test_corrupt_log_recovered_by_tick() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);
        fs::write(&sorter.config().log_file, b"not json at all").unwrap();

        drop_file(&sorter, "data.zip", b"PK");
        let report = sorter.tick().unwrap();
        assert_eq!(report.sorted(), 1);

        let content = fs::read_to_string(&sorter.config().log_file).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["category"], "archives");
    }

    #[test]
    fn test_missing_watch_dir_is_tick_error() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);
        fs::remove_dir(&sorter.config().watch_dir).unwrap();

        assert!(sorter.tick().is_err());
        // The loop keeps going and reports nothing
        assert!(sorter.watch_for(2).is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_unreadable_watch_dir_is_tick_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);
        let watch_dir = sorter.config().watch_dir.clone();
        drop_file(&sorter, "notes.txt", b"hidden");
        fs::set_permissions(&watch_dir, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop root
        let readable = fs::read_dir(&watch_dir).is_ok();
        let result = sorter.tick();
        fs::set_permissions(&watch_dir, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        assert!(matches!(result, Err(Error::Io { .. })));
        assert!(watch_dir.join("notes.txt").is_file());
        assert!(sorter.log().is_empty().unwrap());
    }

    #[test]
    #[cfg(unix)]
    fn test_sort_non_utf8_name() {
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);
        let name = std::ffi::OsStr::from_bytes(b"caf\xE9.txt");
        let source = sorter.config().watch_dir.join(name);
        fs::write(&source, b"menu").unwrap();

        let report = sorter.tick().unwrap();
        assert_eq!(report.sorted(), 1);
        assert!(!source.exists());

        let dest = sorter.config().dest_dir.join("documents").join(name);
        assert!(dest.is_file());

        let entries = sorter.log().entries().unwrap();
        assert_eq!(entries[0].original_name, "caf\u{FFFD}.txt");
        assert_eq!(entries[0].category, "documents");
    }

    #[test]
    fn test_watch_for_multiple_ticks() {
        let temp_dir = TempDir::new().unwrap();
        let sorter = sorter(&temp_dir);
        drop_file(&sorter, "main.cpp", b"int main() {}");

        let reports = sorter.watch_for(3);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].sorted(), 1);
        assert!(reports[1].is_empty());
        assert!(reports[2].is_empty());
    }

    #[test]
    fn test_custom_table_and_algorithm() {
        let temp_dir = TempDir::new().unwrap();
        let table = CategoryTable::empty()
            .with_extension(".heic", "photos")
            .unwrap();
        let config = Config::with_base(temp_dir.path())
            .categories(table)
            .algorithm(Algorithm::Blake3);
        let sorter = Sorter::new(config, Box::new(NoSummary)).unwrap();

        assert_eq!(dir_names(&sorter.config().dest_dir), vec!["others", "photos"]);

        drop_file(&sorter, "IMG_1.HEIC", b"heic");
        drop_file(&sorter, "photo.png", b"png");
        sorter.tick().unwrap();

        let entries = sorter.log().entries().unwrap();
        assert_eq!(entries[0].category, "photos");
        assert_eq!(entries[0].hash, Hash::hash_bytes(Algorithm::Blake3, b"heic"));
        assert_eq!(entries[0].summary, None);
        assert_eq!(entries[1].category, "others");
    }
}
