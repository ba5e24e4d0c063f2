//! Short human-readable summaries of sorted files.
//!
//! A [`Summarizer`] never fails: any problem reading the file shows up as
//! `None`. The offline [`HeuristicSummarizer`] looks at the leading text of
//! text-like files and describes everything else by type. The
//! [`RemoteSummarizer`] stands in for an external summarization service and
//! is selected with `AI_API_ENABLED=1`; it makes no network requests.

use crate::classify::extension_of;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Environment toggle selecting the remote summarizer when set to `"1"`.
pub const AI_TOGGLE_ENV: &str = "AI_API_ENABLED";

/// Maximum summary length in characters, before the ellipsis.
pub const MAX_SUMMARY_CHARS: usize = 200;

/// Lines read from the head of a text-like file.
const EXCERPT_LINES: usize = 10;

/// Upper bound on bytes read for an excerpt, so one huge line stays cheap.
const EXCERPT_BYTES: u64 = 64 * 1024;

const TEXT_EXTENSIONS: &[&str] = &[".txt", ".md", ".py", ".java", ".js"];
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".png", ".jpeg", ".gif"];

pub const PDF_SUMMARY: &str = "PDF file - content summary not available in offline mode.";
pub const IMAGE_SUMMARY: &str = "Image file - visual content.";
pub const REMOTE_SUMMARY: &str = "AI-generated summary (API integration required).";

/// Produces an optional short description of a file.
pub trait Summarizer {
    /// Summarize the file at `path`. Must not panic or report errors.
    fn summarize(&self, path: &Path) -> Option<String>;

    /// Name used in diagnostics.
    fn name(&self) -> &'static str;
}

/// Offline summarizer based on the file extension and leading text.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSummarizer;

impl Summarizer for HeuristicSummarizer {
    fn summarize(&self, path: &Path) -> Option<String> {
        let ext = path
            .file_name()
            .and_then(|n| extension_of(&n.to_string_lossy()));

        match ext.as_deref() {
            Some(e) if TEXT_EXTENSIONS.contains(&e) => {
                let excerpt = read_excerpt(path).ok()?;
                Some(truncate_summary(&excerpt, MAX_SUMMARY_CHARS))
            }
            Some(".pdf") => Some(PDF_SUMMARY.to_string()),
            Some(e) if IMAGE_EXTENSIONS.contains(&e) => Some(IMAGE_SUMMARY.to_string()),
            Some(e) => Some(format!("File type {} detected.", e)),
            None => Some("File type unknown detected.".to_string()),
        }
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Placeholder for an external summarization service.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteSummarizer;

impl Summarizer for RemoteSummarizer {
    fn summarize(&self, _path: &Path) -> Option<String> {
        // TODO: call a summarization endpoint once one is configured; until
        // then no request is made.
        Some(REMOTE_SUMMARY.to_string())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Pick a summarizer from the `AI_API_ENABLED` environment variable.
pub fn summarizer_from_env() -> Box<dyn Summarizer> {
    summarizer_for(toggle_enabled(std::env::var(AI_TOGGLE_ENV).ok().as_deref()))
}

/// Only the exact value `"1"` turns the remote summarizer on.
fn toggle_enabled(value: Option<&str>) -> bool {
    value == Some("1")
}

/// Pick a summarizer from an explicit toggle.
pub fn summarizer_for(remote: bool) -> Box<dyn Summarizer> {
    if remote {
        Box::new(RemoteSummarizer)
    } else {
        Box::new(HeuristicSummarizer)
    }
}

/// Collapse whitespace runs to single spaces and cap the result at
/// `max_len` characters, appending `...` when anything was cut.
pub fn truncate_summary(text: &str, max_len: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &collapsed[..cut]),
        None => collapsed,
    }
}

/// Read up to `EXCERPT_LINES` lines from the head of a file, lossily decoded.
fn read_excerpt(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file.take(EXCERPT_BYTES));
    let mut buf = Vec::new();
    for _ in 0..EXCERPT_LINES {
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
