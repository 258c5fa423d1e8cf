//! Leading-directory stripping for archive members.
//!
//! Sources handed to an archive builder are usually deep paths such as
//! `build/docs/paper.tex`. Stripping `build` stores the member as
//! `docs/paper.tex`. When a project builds out of tree, the build directory
//! mirrors a source directory, so a requested directory drags its mirrored
//! counterpart into the prefix set as well.

use crate::dedup::rm_dup;
use crate::error::Result;
use crate::paths::posix_path;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;

/// Directories requested for stripping, in the shapes a manifest accepts.
///
/// `false` (the default) strips nothing, `true` strips the current
/// directory, and a string or list of strings names directories relative to
/// the current directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StripDirs {
    /// `true` strips the current directory; `false` strips nothing.
    Flag(bool),
    /// A single directory identifier.
    One(String),
    /// An ordered list of directory identifiers.
    Many(Vec<String>),
}

impl Default for StripDirs {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl StripDirs {
    fn identifiers(&self) -> Vec<&str> {
        match self {
            Self::Flag(true) => vec!["."],
            Self::Flag(false) => Vec::new(),
            Self::One(dir) => vec![dir.as_str()],
            Self::Many(dirs) => dirs.iter().map(String::as_str).collect(),
        }
    }
}

/// Read-only view of the project directory tree.
///
/// Implementations decide how identifiers map onto directories and which
/// directories mirror one another.
pub trait DirectoryTree {
    /// Resolve a directory identifier relative to the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ConfigError::InvalidDirectory`] when the
    /// identifier does not denote a usable directory.
    fn resolve_dir(&self, id: &str) -> Result<Utf8PathBuf>;

    /// Return the directory mirroring `dir`, or `dir` itself when it has no
    /// counterpart.
    fn mirror_of(&self, dir: &Utf8Path) -> Utf8PathBuf;
}

/// Duplicate-free set of directory prefixes to strip from member paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripPrefixes {
    dirs: Vec<Utf8PathBuf>,
}

impl StripPrefixes {
    /// Build a prefix set, dropping duplicates.
    #[must_use]
    pub fn new<I>(dirs: I) -> Self
    where
        I: IntoIterator<Item = Utf8PathBuf>,
    {
        Self { dirs: rm_dup(dirs) }
    }

    /// Return the prefixes.
    #[must_use]
    pub fn dirs(&self) -> &[Utf8PathBuf] {
        &self.dirs
    }

    /// Returns `true` when nothing will be stripped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Remove the longest matching prefix from `member`.
    ///
    /// Prefixes match whole path components only. A member equal to a prefix,
    /// or matching none, is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use texpack_common::strip::StripPrefixes;
    ///
    /// let prefixes = StripPrefixes::new(["sub1".into(), "sub1/sub2".into()]);
    /// assert_eq!(prefixes.strip(Utf8Path::new("sub1/sub2/bar.txt")), "bar.txt");
    /// assert_eq!(prefixes.strip(Utf8Path::new("sub10/x.txt")), "sub10/x.txt");
    /// ```
    #[must_use]
    pub fn strip(&self, member: &Utf8Path) -> Utf8PathBuf {
        self.dirs
            .iter()
            .filter_map(|dir| member.strip_prefix(dir).ok())
            .filter(|rest| !rest.as_str().is_empty())
            .min_by_key(|rest| rest.as_str().len())
            .unwrap_or(member)
            .to_owned()
    }

    /// Render the prefixes as a sed basic regular expression alternation.
    ///
    /// Each prefix is escaped, given a trailing `/*`, and the alternatives
    /// are joined with `\|` (with cmd escaping on Windows).
    #[must_use]
    pub fn sed_pattern(&self) -> String {
        sed_pattern_for(&self.dirs, cfg!(windows))
    }
}

fn sed_pattern_for(dirs: &[Utf8PathBuf], windows: bool) -> String {
    let paths = dirs.iter().map(|dir| {
        let escaped = escape_chars(&posix_path(dir), ".[]:*", '\\');
        format!("{}/*", escaped.trim_end_matches('/'))
    });
    if windows {
        paths
            .map(|p| escape_chars(&p, "&<>|'`,;=()!^", '^'))
            .collect::<Vec<_>>()
            .join("\\^|")
    } else {
        paths.collect::<Vec<_>>().join("\\|")
    }
}

fn escape_chars(text: &str, special: &str, escape: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(c) {
            out.push(escape);
        }
        out.push(c);
    }
    out
}

/// Compute the prefixes to strip from archive member paths.
///
/// Every requested directory is resolved through `tree`; when its mirrored
/// counterpart differs it is added too. Duplicates are dropped.
///
/// # Errors
///
/// Returns [`crate::error::ConfigError::InvalidDirectory`] when any
/// identifier cannot be resolved. Such errors are never skipped, since a
/// wrong strip directory would leak unwanted path segments into a
/// distributed archive.
///
/// # Examples
///
/// ```
/// use camino::{Utf8Path, Utf8PathBuf};
/// use texpack_common::error::Result;
/// use texpack_common::strip::{DirectoryTree, StripDirs, compute_strip_prefixes};
///
/// struct Flat;
///
/// impl DirectoryTree for Flat {
///     fn resolve_dir(&self, id: &str) -> Result<Utf8PathBuf> {
///         Ok(Utf8PathBuf::from(id))
///     }
///     fn mirror_of(&self, dir: &Utf8Path) -> Utf8PathBuf {
///         dir.to_owned()
///     }
/// }
///
/// let dirs = StripDirs::Many(vec!["a/b".to_owned(), "a/b".to_owned()]);
/// let prefixes = compute_strip_prefixes(&dirs, &Flat)?;
/// assert_eq!(prefixes.dirs(), [Utf8PathBuf::from("a/b")]);
/// # Ok::<(), texpack_common::error::ConfigError>(())
/// ```
pub fn compute_strip_prefixes<T>(dirs: &StripDirs, tree: &T) -> Result<StripPrefixes>
where
    T: DirectoryTree + ?Sized,
{
    let mut resolved = Vec::new();
    for id in dirs.identifiers() {
        let dir = tree.resolve_dir(id)?;
        let mirror = tree.mirror_of(&dir);
        resolved.push(dir.clone());
        if mirror != dir {
            resolved.push(mirror);
        }
    }
    let prefixes = StripPrefixes::new(resolved);
    debug!("strip prefixes: {:?}", prefixes.dirs());
    Ok(prefixes)
}
