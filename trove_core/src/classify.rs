//! Extension based classification of incoming files.

use crate::error::{Error, Result};
use std::path::Path;

/// Category for files whose extension is not in the table.
pub const FALLBACK_CATEGORY: &str = "others";

/// Built-in extension table, in the order category directories are created.
const DEFAULT_TABLE: &[(&str, &[&str])] = &[
    ("images", &[".png", ".jpg", ".jpeg", ".gif", ".bmp"]),
    ("documents", &[".pdf", ".docx", ".doc", ".txt", ".md"]),
    ("spreadsheets", &[".xls", ".xlsx", ".csv"]),
    ("audio", &[".mp3", ".wav", ".ogg"]),
    ("video", &[".mp4", ".mkv", ".mov"]),
    ("archives", &[".zip", ".tar", ".gz"]),
    ("code", &[".py", ".js", ".java", ".c", ".cpp", ".ipynb"]),
];

/// Mapping from lowercase extension (with leading dot) to category name.
///
/// Extensions are unique: remapping an extension replaces its previous
/// category. Category names double as directory names under the
/// destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    entries: Vec<(String, String)>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        let entries = DEFAULT_TABLE
            .iter()
            .flat_map(|(category, exts)| {
                exts.iter()
                    .map(move |ext| (ext.to_string(), category.to_string()))
            })
            .collect();
        Self { entries }
    }
}

impl CategoryTable {
    /// An empty table; every file falls back to `others`.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Map `extension` to `category`, replacing any earlier mapping.
    ///
    /// The extension is normalized to lowercase with a leading dot, so
    /// `"HEIC"` and `".heic"` are the same key.
    pub fn with_extension(mut self, extension: &str, category: &str) -> Result<Self> {
        let ext = normalize_extension(extension)?;
        validate_category(category)?;

        match self.entries.iter_mut().find(|(e, _)| *e == ext) {
            Some(entry) => entry.1 = category.to_string(),
            None => self.entries.push((ext, category.to_string())),
        }
        Ok(self)
    }

    /// Parse a `.ext=category` mapping and apply it.
    pub fn with_mapping(self, mapping: &str) -> Result<Self> {
        let (ext, category) = mapping.split_once('=').ok_or_else(|| {
            Error::invalid_mapping(format!("{} (expected .ext=category)", mapping))
        })?;
        self.with_extension(ext.trim(), category.trim())
    }

    /// Category for a file name. Never fails; unknown extensions map to
    /// [`FALLBACK_CATEGORY`].
    pub fn classify(&self, filename: &str) -> &str {
        let Some(ext) = extension_of(filename) else {
            return FALLBACK_CATEGORY;
        };
        self.entries
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, category)| category.as_str())
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// All category directory names: table categories in first-seen order,
    /// then the fallback.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (_, category) in &self.entries {
            if !out.contains(&category.as_str()) {
                out.push(category);
            }
        }
        if !out.contains(&FALLBACK_CATEGORY) {
            out.push(FALLBACK_CATEGORY);
        }
        out
    }

    /// Number of extensions in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no extensions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase extension of `filename` including the leading dot.
///
/// Follows `Path::extension`: `archive.tar.gz` gives `.gz`, and dotfiles
/// such as `.bashrc` have no extension.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

fn normalize_extension(extension: &str) -> Result<String> {
    let bare = extension.strip_prefix('.').unwrap_or(extension);
    if bare.is_empty() || bare.contains('.') || bare.contains('/') || bare.contains('\\') {
        return Err(Error::invalid_mapping(format!(
            "Invalid extension: {:?}",
            extension
        )));
    }
    Ok(format!(".{}", bare.to_lowercase()))
}

fn validate_category(category: &str) -> Result<()> {
    // Categories become directory names under the destination root
    if category.is_empty()
        || category == "."
        || category == ".."
        || category.contains('/')
        || category.contains('\\')
    {
        return Err(Error::invalid_mapping(format!(
            "Invalid category name: {:?}",
            category
        )));
    }
    Ok(())
}
