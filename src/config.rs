//! Project manifest loader.
//!
//! A texpack project describes its artefacts in `texpack.toml`: archives to
//! package, documents to compile and files to import from the TeX Directory
//! Structure, together with construction variables and variant (out of tree)
//! build directories. The manifest only records what the user wrote; turning
//! it into target paths and aliases is the job of `texpack_common::naming`.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::BTreeMap;
use texpack_common::{AliasOptions, AliasSetting, NamingOptions, StripDirs};
use thiserror::Error;

/// Default manifest file name looked up in the project root.
pub const MANIFEST_FILE: &str = "texpack.toml";

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// Path of the manifest.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid TOML or does not match the schema.
    #[error("invalid manifest {path}: {source}")]
    Parse {
        /// Path of the manifest.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// A parsed `texpack.toml`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Project-wide settings.
    pub project: ProjectSection,
    /// Construction variables available for `$NAME` substitution.
    pub variables: BTreeMap<String, String>,
    /// Build directories mirrored from source directories.
    #[serde(rename = "variant")]
    pub variants: Vec<VariantSection>,
    /// Archives to package.
    #[serde(rename = "archive")]
    pub archives: Vec<ArchiveSection>,
    /// Documents to compile.
    #[serde(rename = "document")]
    pub documents: Vec<DocumentSection>,
    /// Files to import from the TeX Directory Structure.
    #[serde(rename = "import")]
    pub imports: Vec<ImportSection>,
}

impl Manifest {
    /// Read and parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] when the file cannot be read and
    /// [`ManifestError::Parse`] when its content is invalid.
    pub fn load(path: &Utf8Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ManifestError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

/// The `[project]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSection {
    /// Output directory used by artefacts that do not set their own.
    pub out_dir: Option<Utf8PathBuf>,
}

/// A `[[variant]]` entry: `build_dir` mirrors `src_dir`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VariantSection {
    /// The generated (out of tree) directory.
    pub build_dir: Utf8PathBuf,
    /// The source directory it mirrors.
    pub src_dir: Utf8PathBuf,
}

/// The `alias` key: a fixed alias name, or a boolean where `false` disables
/// the alias and `true` keeps the generated one.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum AliasField {
    /// `true` or `false`.
    Flag(bool),
    /// A fixed alias name.
    Name(String),
}

impl AliasField {
    fn to_setting(&self) -> Option<AliasSetting> {
        match self {
            Self::Flag(true) => None,
            Self::Flag(false) => Some(AliasSetting::Disabled),
            Self::Name(name) => Some(AliasSetting::Named(name.clone())),
        }
    }
}

/// An `[[archive]]` entry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArchiveSection {
    /// Package name.
    pub name: String,
    /// Archive format: `tar`, `tar.gz`, `tar.bz2` or `tar.zst`.
    #[serde(default = "ArchiveSection::default_format")]
    pub format: String,
    /// Files and directories to include.
    pub sources: Vec<Utf8PathBuf>,
    /// Package version used in the file name.
    pub version: Option<String>,
    /// Target file suffix.
    pub suffix: Option<String>,
    /// Fixed target path.
    pub target: Option<Utf8PathBuf>,
    /// Output directory.
    pub out_dir: Option<Utf8PathBuf>,
    /// Alias override.
    pub alias: Option<AliasField>,
    /// Alias suffix override.
    pub alias_suffix: Option<String>,
    /// Directories stripped from member names.
    #[serde(default)]
    pub strip_dirs: StripDirs,
}

impl ArchiveSection {
    fn default_format() -> String {
        "tar".to_owned()
    }

    /// Naming overrides for this archive, inheriting the project `out_dir`.
    ///
    /// The default suffix is left unset; it belongs to the archive format.
    #[must_use]
    pub fn naming(&self, project: &ProjectSection) -> NamingOptions {
        naming_options(
            self.target.as_ref(),
            self.suffix.as_ref(),
            self.version.as_ref(),
            self.out_dir.as_ref().or(project.out_dir.as_ref()),
        )
    }

    /// Alias overrides for this archive.
    #[must_use]
    pub fn alias_options(&self) -> AliasOptions {
        alias_options(self.alias.as_ref(), self.alias_suffix.as_ref())
    }
}

/// A `[[document]]` entry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DocumentSection {
    /// Document name.
    pub name: String,
    /// Builder: `dvi`, `pdf` or `dvipdfm`.
    #[serde(default = "DocumentSection::default_builder")]
    pub builder: String,
    /// Main TeX source; defaults to `<name>.tex`.
    pub source: Option<Utf8PathBuf>,
    /// Extra files the document depends on.
    #[serde(default)]
    pub deps: Vec<Utf8PathBuf>,
    /// Engine flags replacing the construction variable flags.
    pub flags: Option<String>,
    /// Version used in the file name.
    pub version: Option<String>,
    /// Target file suffix (ignored by the DVI builder).
    pub suffix: Option<String>,
    /// Fixed target path.
    pub target: Option<Utf8PathBuf>,
    /// Output directory.
    pub out_dir: Option<Utf8PathBuf>,
    /// Alias override.
    pub alias: Option<AliasField>,
    /// Alias suffix override.
    pub alias_suffix: Option<String>,
}

impl DocumentSection {
    fn default_builder() -> String {
        "dvi".to_owned()
    }

    /// Naming overrides for this document, inheriting the project `out_dir`.
    #[must_use]
    pub fn naming(&self, project: &ProjectSection) -> NamingOptions {
        naming_options(
            self.target.as_ref(),
            self.suffix.as_ref(),
            self.version.as_ref(),
            self.out_dir.as_ref().or(project.out_dir.as_ref()),
        )
    }

    /// Alias overrides for this document.
    #[must_use]
    pub fn alias_options(&self) -> AliasOptions {
        alias_options(self.alias.as_ref(), self.alias_suffix.as_ref())
    }
}

/// An `[[import]]` entry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImportSection {
    /// File names to locate with `kpsewhich`.
    pub sources: Vec<String>,
    /// Where to copy the files; defaults to the current directory.
    pub out_dir: Option<Utf8PathBuf>,
    /// Optional alias for the imported files.
    pub alias: Option<String>,
}

fn naming_options(
    target: Option<&Utf8PathBuf>,
    suffix: Option<&String>,
    version: Option<&String>,
    out_dir: Option<&Utf8PathBuf>,
) -> NamingOptions {
    NamingOptions {
        target: target.cloned(),
        suffix: suffix.cloned(),
        default_suffix: None,
        version: version.cloned(),
        out_dir: out_dir.cloned(),
    }
}

fn alias_options(alias: Option<&AliasField>, alias_suffix: Option<&String>) -> AliasOptions {
    AliasOptions {
        alias: alias.and_then(AliasField::to_setting),
        alias_suffix: alias_suffix.cloned(),
        default_alias_suffix: None,
    }
}
