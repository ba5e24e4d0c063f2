//! Append-only JSON audit log of sorted files.
//!
//! The log is a single JSON array on disk. Every append re-reads the whole
//! array, pushes one entry and writes the array back through a temporary
//! file that is renamed over the target, so a crash mid-write leaves the
//! previous version in place. A file that cannot be parsed is treated as
//! empty on the next append; its old content is lost.

use crate::error::{Error, Result};
use crate::hash::Hash;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One sorted file, as recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unix timestamp when processing of the file completed.
    pub timestamp: i64,
    /// File name as it appeared in the watch directory.
    pub original_name: String,
    /// Path the file was moved to.
    pub destination: String,
    /// Category the file was sorted into.
    pub category: String,
    /// Content digest.
    pub hash: Hash,
    /// Optional short description. Written as `null` when absent.
    #[serde(rename = "ai_summary")]
    pub summary: Option<String>,
}

impl LogEntry {
    /// Create a new log entry.
    pub fn new(
        timestamp: i64,
        original_name: String,
        destination: String,
        category: String,
        hash: Hash,
        summary: Option<String>,
    ) -> Self {
        Self {
            timestamp,
            original_name,
            destination,
            category,
            hash,
            summary,
        }
    }
}

/// JSON array log at a fixed path. Assumes a single writer process.
#[derive(Debug)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    /// Open or create a log at the given path.
    ///
    /// Creates the parent directory if needed, and writes `[]` if the file
    /// does not exist yet. An existing file is left untouched, even if it
    /// is corrupt.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Self { path };
        if !store.path.exists() {
            store.write_all(&[])?;
        }

        Ok(store)
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry to the log.
    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        let mut entries = match self.entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "log unreadable, starting a new one"
                );
                Vec::new()
            }
        };
        entries.push(entry.clone());
        self.write_all(&entries)
    }

    /// Read every entry in append order.
    ///
    /// Unlike [`LogStore::append`], a missing or corrupt file is reported as
    /// an error here.
    pub fn entries(&self) -> Result<Vec<LogEntry>> {
        let content = fs::read(&self.path)?;
        serde_json::from_slice(&content)
            .map_err(|e| Error::log_store(&self.path, format!("Invalid log content: {}", e)))
    }

    /// Read the most recent N entries from the log.
    pub fn read_recent(&self, count: usize) -> Result<Vec<LogEntry>> {
        let entries = self.entries()?;
        if count >= entries.len() {
            Ok(entries)
        } else {
            Ok(entries[entries.len() - count..].to_vec())
        }
    }

    /// Number of entries in the log.
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    /// Check if the log has no entries.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Write the whole array atomically using tempfile.
    fn write_all(&self, entries: &[LogEntry]) -> Result<()> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| Error::log_store(&self.path, format!("Serialization failed: {}", e)))?;

        let temp_dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = tempfile::NamedTempFile::new_in(temp_dir)?;

        temp_file.write_all(&json)?;
        temp_file.flush()?;
        temp_file.as_file().sync_all()?;

        // Persist atomically
        temp_file.persist(&self.path)?;

        Ok(())
    }
}
