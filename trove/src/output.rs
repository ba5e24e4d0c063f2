//! Text and JSON rendering of command results.
//!
//! Every result type implements [`Render`] for the text form and
//! `Serialize` for `--json`, so commands only build the data.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write};
use trove_core::{FileOutcome, Hash, LogEntry};

/// Human-readable form of a command result.
pub trait Render {
    fn render_text(&self) -> String;
}

/// Writes command results to stdout and errors to stderr.
pub struct OutputWriter {
    json: bool,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// The exact text `write` would print for `data`.
    pub fn render<T: Serialize + Render>(&self, data: &T) -> Result<String> {
        if self.json {
            Ok(serde_json::to_string_pretty(data)? + "\n")
        } else {
            Ok(data.render_text())
        }
    }

    pub fn write<T: Serialize + Render>(&self, data: &T) -> Result<()> {
        io::stdout().lock().write_all(self.render(data)?.as_bytes())?;
        Ok(())
    }

    /// Error text for stderr, with the full context chain.
    pub fn render_error(&self, error: &anyhow::Error, result_code: u8) -> String {
        let message = format!("{:#}", error);
        if self.json {
            let output = ErrorOutput {
                success: false,
                result_code,
                error: message.clone(),
            };
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                return json + "\n";
            }
        }
        format!("Error: {}\n", message)
    }

    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        let _ = io::stderr().write_all(self.render_error(error, result_code).as_bytes());
    }
}

/// Render a unix timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn human_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Error output structure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// Output for `init` command.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub result_code: u8,
    pub watch_dir: String,
    pub dest_dir: String,
    pub log_file: String,
    pub categories: Vec<String>,
}

/// One file handled during `once`.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcomeInfo {
    pub status: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&FileOutcome> for FileOutcomeInfo {
    fn from(outcome: &FileOutcome) -> Self {
        match outcome {
            FileOutcome::Sorted(entry) => Self::moved("sorted", entry, None),
            FileOutcome::Unlogged { entry, error } => {
                Self::moved("unlogged", entry, Some(error.to_string()))
            }
            FileOutcome::Skipped { path, error } => Self {
                status: "skipped",
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                category: None,
                destination: None,
                hash: None,
                error: Some(error.to_string()),
            },
        }
    }
}

impl FileOutcomeInfo {
    fn moved(status: &'static str, entry: &LogEntry, error: Option<String>) -> Self {
        Self {
            status,
            name: entry.original_name.clone(),
            category: Some(entry.category.clone()),
            destination: Some(entry.destination.clone()),
            hash: Some(entry.hash),
            error,
        }
    }
}

/// Output for `once` command.
#[derive(Debug, Serialize)]
pub struct OnceOutput {
    pub success: bool,
    pub result_code: u8,
    pub sorted: usize,
    pub unlogged: usize,
    pub skipped: usize,
    pub files: Vec<FileOutcomeInfo>,
}

/// Log entry information.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntryInfo {
    pub timestamp: i64,
    pub timestamp_human: String,
    pub original_name: String,
    pub destination: String,
    pub category: String,
    pub hash: Hash,
    pub ai_summary: Option<String>,
}

impl From<LogEntry> for LogEntryInfo {
    fn from(entry: LogEntry) -> Self {
        Self {
            timestamp_human: human_timestamp(entry.timestamp),
            timestamp: entry.timestamp,
            original_name: entry.original_name,
            destination: entry.destination,
            category: entry.category,
            hash: entry.hash,
            ai_summary: entry.summary,
        }
    }
}

/// Output for `log` command.
#[derive(Debug, Serialize)]
pub struct LogOutput {
    pub success: bool,
    pub result_code: u8,
    pub entries: Vec<LogEntryInfo>,
}

/// Classification of one name for `classify`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyInfo {
    pub name: String,
    pub category: String,
}

/// Output for `classify` command.
#[derive(Debug, Serialize)]
pub struct ClassifyOutput {
    pub success: bool,
    pub result_code: u8,
    pub results: Vec<ClassifyInfo>,
}

impl Render for InitOutput {
    fn render_text(&self) -> String {
        format!(
            "Watching: {}\nSorting into: {} ({})\nLog: {}\n",
            self.watch_dir,
            self.dest_dir,
            self.categories.join(", "),
            self.log_file
        )
    }
}

impl Render for OnceOutput {
    fn render_text(&self) -> String {
        let mut text = String::new();
        for file in &self.files {
            let _ = match (&file.destination, &file.error) {
                (Some(dest), None) => writeln!(text, "{} -> {}", file.name, dest),
                (Some(dest), Some(err)) => {
                    writeln!(text, "{} -> {} (not logged: {})", file.name, dest, err)
                }
                (None, err) => writeln!(
                    text,
                    "{} skipped: {}",
                    file.name,
                    err.as_deref().unwrap_or("unknown error")
                ),
            };
        }
        let _ = writeln!(
            text,
            "Sorted {}, skipped {}",
            self.sorted + self.unlogged,
            self.skipped
        );
        text
    }
}

impl Render for LogOutput {
    fn render_text(&self) -> String {
        if self.entries.is_empty() {
            return "No entries\n".to_string();
        }
        let mut text = String::new();
        for entry in &self.entries {
            let _ = writeln!(
                text,
                "{} {} [{}] {} -> {}",
                entry.timestamp_human,
                entry.hash.short(),
                entry.category,
                entry.original_name,
                entry.destination
            );
            if let Some(summary) = &entry.ai_summary {
                let _ = writeln!(text, "    {}", summary);
            }
        }
        text
    }
}

impl Render for ClassifyOutput {
    fn render_text(&self) -> String {
        self.results
            .iter()
            .map(|r| format!("{} {}\n", r.category, r.name))
            .collect()
    }
}
