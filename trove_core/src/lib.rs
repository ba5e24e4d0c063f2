//! # Trove Core
//!
//! Watches a folder and sorts the files that land in it.
//!
//! Each poll tick lists the watch folder, and every regular file found there
//! is classified by extension, hashed, summarized, moved into
//! `<dest>/<category>/` without overwriting anything, and recorded in a JSON
//! audit log.
//!
//! ## Features
//!
//! - Extension based categories with an `others` fallback
//! - SHA-256 (default) or BLAKE3 content digests
//! - Collision-free moves: `photo.png`, `photo_1.png`, `photo_2.png`, ...
//! - Append-only JSON log written atomically
//! - Per-file failure isolation: a file that cannot be sorted stays put and
//!   is retried on the next tick
//!
//! ## Example
//!
//! ```no_run
//! use trove_core::{Config, Sorter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sorter = Sorter::from_env(Config::with_base("./inbox"))?;
//!
//! // Sort whatever is there right now
//! let report = sorter.tick()?;
//! println!("Sorted {} files", report.sorted());
//!
//! // Or keep polling until the process is stopped
//! sorter.watch();
//! # }
//! ```

mod classify;
mod config;
mod error;
mod hash;
mod log;
mod mover;
mod sorter;
mod summary;

pub use classify::{CategoryTable, FALLBACK_CATEGORY, extension_of};
pub use config::{Config, DEFAULT_POLL_INTERVAL};
pub use error::{Error, Result};
pub use hash::{Algorithm, Hash};
pub use log::{LogEntry, LogStore};
pub use mover::{MAX_DISAMBIGUATION, move_file, resolve_destination};
pub use sorter::{FileOutcome, Sorter, TickReport, ensure_dirs};
pub use summary::{
    AI_TOGGLE_ENV, HeuristicSummarizer, RemoteSummarizer, Summarizer, summarizer_for,
    summarizer_from_env, truncate_summary,
};
