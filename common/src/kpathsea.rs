//! Helpers for kpathsea search paths as printed by `kpsewhich -show-path`.

/// Separator between search path entries on the host platform.
#[must_use]
pub const fn search_path_separator() -> char {
    if cfg!(windows) { ';' } else { ':' }
}

/// Remove current-directory entries (`.`, `./`, `.//`, ...) from a search
/// path.
///
/// Files imported from the TeX Directory Structure must come from the TDS
/// itself, never from the directory being imported into. Empty entries are
/// kept because kpathsea expands them to the default path.
///
/// # Examples
///
/// ```
/// use texpack_common::kpathsea::clean_search_path;
///
/// assert_eq!(clean_search_path(".:/a:./:/b:.", ':'), "/a:/b");
/// assert_eq!(clean_search_path("/a::/b", ':'), "/a::/b");
/// ```
#[must_use]
pub fn clean_search_path(path: &str, separator: char) -> String {
    let separator_str = separator.to_string();
    path.split(separator)
        .filter(|entry| !is_current_dir(entry))
        .collect::<Vec<_>>()
        .join(&separator_str)
}

fn is_current_dir(entry: &str) -> bool {
    entry
        .strip_prefix('.')
        .is_some_and(|rest| rest.chars().all(|c| c == '/' || c == '\\'))
}
