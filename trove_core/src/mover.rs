//! Collision-safe relocation of files into the destination tree.

use crate::error::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// Highest disambiguation index tried before giving up.
pub const MAX_DISAMBIGUATION: u32 = 10_000;

/// Pick a free path for `file_name` inside `dir`.
///
/// Returns `dir/file_name` if nothing exists there, otherwise
/// `dir/<stem>_<n><ext>` for the smallest `n >= 1` that is free. Names
/// are handled as `OsStr`, so they need not be valid UTF-8.
pub fn resolve_destination(dir: &Path, file_name: impl AsRef<OsStr>) -> Result<PathBuf> {
    resolve_destination_with_limit(dir, file_name.as_ref(), MAX_DISAMBIGUATION)
}

fn resolve_destination_with_limit(dir: &Path, file_name: &OsStr, limit: u32) -> Result<PathBuf> {
    let candidate = dir.join(file_name);
    if !occupied(&candidate) {
        return Ok(candidate);
    }

    for n in 1..=limit {
        let candidate = dir.join(disambiguated_name(file_name, n));
        if !occupied(&candidate) {
            return Ok(candidate);
        }
    }

    Err(Error::destination_exhausted(dir, file_name.to_string_lossy()))
}

/// Move `source` into `dest_root/category/`, never overwriting.
///
/// Returns the path the file now lives at. The file is renamed, not
/// copied: a rename that fails (cross-device, permissions, vanished
/// source) is reported as [`Error::Move`] and the source stays put.
pub fn move_file(source: &Path, category: &str, dest_root: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| Error::invalid_file_name(source))?;

    let dir = dest_root.join(category);
    fs::create_dir_all(&dir)?;

    let destination = resolve_destination(&dir, file_name)?;
    fs::rename(source, &destination)
        .map_err(|e| Error::move_failed(source, &destination, e))?;

    Ok(destination)
}

/// Existence check that also counts dangling symlinks as taken.
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// `<stem>_<n><.ext>`, splitting the way `Path::file_stem` and
/// `Path::extension` do.
fn disambiguated_name(file_name: &OsStr, n: u32) -> OsString {
    let path = Path::new(file_name);
    let mut name = path
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_else(|| file_name.to_os_string());
    name.push(format!("_{}", n));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}
