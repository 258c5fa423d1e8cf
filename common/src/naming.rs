//! Target and alias name resolution for named artefacts.
//!
//! Every artefact texpack produces (an archive, a compiled document) has a
//! name. From that name and a handful of optional overrides, this module
//! derives the file the artefact is written to,
//! `[<out_dir>/]<name>[-<version>]<suffix>`, and the alias a user types to
//! build it, `<name>[-<alias_suffix>]`.
//!
//! Explicit values always win: a fixed `target` bypasses the composition
//! entirely, and a fixed `alias` (including the "no alias" marker) bypasses
//! alias composition.

use crate::error::{ConfigError, Result};
use crate::paths::normalize;
use crate::precedence::first_present;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fmt;

/// The validated, non-empty name of an artefact.
///
/// # Examples
///
/// ```
/// use texpack_common::naming::ArtefactName;
///
/// let name = ArtefactName::try_from("package").expect("valid name");
/// assert_eq!(name.as_str(), "package");
/// assert!(ArtefactName::try_from("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtefactName(String);

impl ArtefactName {
    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ArtefactName {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingName);
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for ArtefactName {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self> {
        Self::try_from(value.to_owned())
    }
}

impl AsRef<str> for ArtefactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtefactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An explicit alias choice that bypasses alias composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasSetting {
    /// Register the artefact under exactly this alias.
    Named(String),
    /// Do not register any alias for the artefact.
    Disabled,
}

impl AliasSetting {
    fn to_option(&self) -> Option<String> {
        match self {
            Self::Named(alias) => Some(alias.clone()),
            Self::Disabled => None,
        }
    }
}

/// Overrides that shape the target file path of an artefact.
///
/// `default_suffix` is normally filled in by the entry point (for example
/// `.tar.gz` for gzipped archives) while the remaining fields come from the
/// user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingOptions {
    /// Fixed target path, returned verbatim when set.
    pub target: Option<Utf8PathBuf>,
    /// Suffix for the target file, preferred over `default_suffix`.
    pub suffix: Option<String>,
    /// Suffix used when `suffix` is not given.
    pub default_suffix: Option<String>,
    /// Version inserted between the name and the suffix.
    pub version: Option<String>,
    /// Output directory; relative paths are taken from the current directory.
    pub out_dir: Option<Utf8PathBuf>,
}

impl NamingOptions {
    /// Resolve the target file path for the artefact `name`.
    ///
    /// When no explicit target is configured the result is
    /// `<cwd>/<out_dir>/<name>[-<version>]<suffix>`, lexically normalised,
    /// with the suffix taken from `suffix`, then `default_suffix`, then the
    /// empty string. An empty version is treated as no version.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use texpack_common::naming::{ArtefactName, NamingOptions};
    ///
    /// let name = ArtefactName::try_from("package").expect("valid name");
    /// let options = NamingOptions {
    ///     default_suffix: Some(".tar".to_owned()),
    ///     version: Some("1.2".to_owned()),
    ///     out_dir: Some("dist".into()),
    ///     ..NamingOptions::default()
    /// };
    /// assert_eq!(
    ///     options.resolve_target(&name, Utf8Path::new("proj")),
    ///     "proj/dist/package-1.2.tar"
    /// );
    /// ```
    #[must_use]
    pub fn resolve_target(&self, name: &ArtefactName, cwd: &Utf8Path) -> Utf8PathBuf {
        let out_dir = match &self.out_dir {
            Some(dir) => cwd.join(dir),
            None => cwd.to_owned(),
        };
        let compose = |suffix: &str| normalize(&out_dir.join(self.file_name(name, suffix)));

        let target = first_present(
            self.target.clone(),
            self.suffix.as_deref().map(compose),
            self.default_suffix.as_deref().map(compose),
            compose(""),
        );
        debug!("resolved target for {name}: {target}");
        target
    }

    fn file_name(&self, name: &ArtefactName, suffix: &str) -> String {
        match self.version.as_deref().filter(|v| !v.is_empty()) {
            Some(version) => format!("{name}-{version}{suffix}"),
            None => format!("{name}{suffix}"),
        }
    }
}

/// Overrides that shape the build alias of an artefact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasOptions {
    /// Fixed alias, or [`AliasSetting::Disabled`] to suppress the alias.
    pub alias: Option<AliasSetting>,
    /// Alias suffix, preferred over `default_alias_suffix`.
    pub alias_suffix: Option<String>,
    /// Alias suffix used when `alias_suffix` is not given.
    pub default_alias_suffix: Option<String>,
}

impl AliasOptions {
    /// Resolve the build alias for the artefact `name`.
    ///
    /// Returns `None` when the alias was explicitly disabled. Otherwise the
    /// alias is the explicit one, or `<name>-<suffix>` with the first present
    /// suffix, or `name` itself when that suffix is missing or empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use texpack_common::naming::{AliasOptions, AliasSetting, ArtefactName};
    ///
    /// let name = ArtefactName::try_from("pkg").expect("valid name");
    /// let defaults = AliasOptions {
    ///     default_alias_suffix: Some("tgz".to_owned()),
    ///     ..AliasOptions::default()
    /// };
    /// assert_eq!(defaults.resolve_alias(&name).as_deref(), Some("pkg-tgz"));
    ///
    /// let disabled = AliasOptions {
    ///     alias: Some(AliasSetting::Disabled),
    ///     ..defaults
    /// };
    /// assert_eq!(disabled.resolve_alias(&name), None);
    /// ```
    #[must_use]
    pub fn resolve_alias(&self, name: &ArtefactName) -> Option<String> {
        let compose = |suffix: &str| Some(compose_alias(name, suffix));

        let alias = first_present(
            self.alias.as_ref().map(AliasSetting::to_option),
            self.alias_suffix.as_deref().map(compose),
            self.default_alias_suffix.as_deref().map(compose),
            Some(name.to_string()),
        );
        debug!("resolved alias for {name}: {alias:?}");
        alias
    }
}

fn compose_alias(name: &ArtefactName, suffix: &str) -> String {
    if suffix.is_empty() {
        name.to_string()
    } else {
        format!("{name}-{suffix}")
    }
}
