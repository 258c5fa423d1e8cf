//! File enumeration below project directories.

use crate::error::{BuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, Pattern};
use texpack_common::dedup::rm_dup;
use texpack_common::paths::normalize;

/// List the regular files at or below the project-relative `entry`.
///
/// A regular file yields itself; a directory yields every file beneath it,
/// recursively, in sorted order. Returned paths are relative to `root`.
///
/// # Errors
///
/// Returns [`BuildError::MissingSource`] when `entry` does not exist, and
/// I/O or UTF-8 errors encountered while walking the tree.
pub fn children(root: &Utf8Path, entry: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let absolute = normalize(&root.join(entry));
    if absolute.is_file() {
        return Ok(vec![entry.to_owned()]);
    }
    if !absolute.is_dir() {
        return Err(BuildError::MissingSource {
            path: entry.to_owned(),
        });
    }

    let pattern = format!("{}/**/*", Pattern::escape(absolute.as_str()));
    let options = MatchOptions {
        require_literal_leading_dot: false,
        ..MatchOptions::new()
    };
    let mut files = Vec::new();
    for found in glob::glob_with(&pattern, options)? {
        let path = found.map_err(std::io::Error::from)?;
        if !path.is_file() {
            continue;
        }
        let path = Utf8PathBuf::try_from(path)
            .map_err(|e| BuildError::NonUtf8Path { path: e.into_path_buf() })?;
        let relative = path
            .strip_prefix(root)
            .map_or_else(|_| path.clone(), Utf8Path::to_owned);
        files.push(relative);
    }
    files.sort();
    Ok(rm_dup(files))
}
