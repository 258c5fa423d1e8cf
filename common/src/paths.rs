//! Lexical path helpers.
//!
//! These never touch the filesystem; they only rewrite path text.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Collapse `.` components and fold `..` into the preceding component.
///
/// Leading `..` components of a relative path are kept, as is a root or
/// prefix. An empty result is rendered as `.`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use texpack_common::paths::normalize;
///
/// assert_eq!(normalize(Utf8Path::new("./a/./b/../c")), "a/c");
/// assert_eq!(normalize(Utf8Path::new("a/..")), ".");
/// assert_eq!(normalize(Utf8Path::new("../x")), "../x");
/// ```
#[must_use]
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut parts: Vec<Utf8Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match parts.last() {
                Some(Utf8Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return Utf8PathBuf::from(".");
    }
    parts.iter().map(|c| c.as_str()).collect()
}

/// Render a path with `/` separators regardless of the host platform.
///
/// Archive member names and sed patterns are always written this way.
#[must_use]
pub fn posix_path(path: &Utf8Path) -> String {
    path.as_str().split(std::path::MAIN_SEPARATOR).collect::<Vec<_>>().join("/")
}
