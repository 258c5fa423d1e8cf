//! Source archive builders.
//!
//! Packs project files into `.tar`, `.tar.gz`, `.tar.bz2` or `.tar.zst`
//! archives. The archive file is named by the name resolver
//! (`[<out_dir>/]<name>[-<version>]<suffix>`) and registered under an alias
//! (`<name>-tar`, `<name>-tgz`, `<name>-tbz2`, `<name>-tzst` unless
//! overridden). Members are stored under their project-relative paths with
//! the requested strip directories removed from the front.

use crate::artefact::{BuilderDefaults, ResolvedArtefact, resolve};
use crate::children::children;
use crate::env::BuildEnv;
use crate::error::{BuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::io::Write;
use std::str::FromStr;
use texpack::config::{ArchiveSection, ProjectSection};
use texpack_common::dedup::rm_dup;
use texpack_common::error::ConfigError;
use texpack_common::paths::{normalize, posix_path};
use texpack_common::{
    AliasOptions, ArtefactName, NamingOptions, StripDirs, StripPrefixes, compute_strip_prefixes,
};

/// Construction variable overriding the plain tar suffix.
const TAR_SUFFIX_VARIABLE: &str = "TARFILESUFFIX";

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Uncompressed tar.
    Tar,
    /// Gzip-compressed tar.
    TarGz,
    /// Bzip2-compressed tar.
    TarBz2,
    /// Zstandard-compressed tar.
    TarZst,
}

impl ArchiveFormat {
    /// Canonical format name as written in the manifest.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarZst => "tar.zst",
        }
    }

    /// Default target suffix and alias suffix for this format.
    ///
    /// Plain tar archives honour `$TARFILESUFFIX`.
    #[must_use]
    pub fn defaults(self, env: &BuildEnv) -> BuilderDefaults {
        let (suffix, alias_suffix) = match self {
            Self::Tar => (env.variable(TAR_SUFFIX_VARIABLE).unwrap_or(".tar"), "tar"),
            Self::TarGz => (".tar.gz", "tgz"),
            Self::TarBz2 => (".tar.bz2", "tbz2"),
            Self::TarZst => (".tar.zst", "tzst"),
        };
        BuilderDefaults {
            suffix: suffix.to_owned(),
            alias_suffix,
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tar" => Ok(Self::Tar),
            "tar.gz" | "tgz" | "gz" => Ok(Self::TarGz),
            "tar.bz2" | "tbz2" | "bz2" => Ok(Self::TarBz2),
            "tar.zst" | "tzst" | "zst" => Ok(Self::TarZst),
            _ => Err(ConfigError::UnknownFormat { name: s.to_owned() }),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to package sources into an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRequest {
    /// Package name.
    pub name: ArtefactName,
    /// Archive format.
    pub format: ArchiveFormat,
    /// File or directory identifiers, relative to the current directory.
    pub sources: Vec<String>,
    /// Target naming overrides.
    pub naming: NamingOptions,
    /// Alias overrides.
    pub alias: AliasOptions,
    /// Directories stripped from member names.
    pub strip_dirs: StripDirs,
}

impl ArchiveRequest {
    /// Build a request from a manifest `[[archive]]` entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingName`] or [`ConfigError::UnknownFormat`]
    /// for invalid entries.
    pub fn from_section(
        section: &ArchiveSection,
        project: &ProjectSection,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            name: ArtefactName::try_from(section.name.as_str())?,
            format: section.format.parse()?,
            sources: section.sources.iter().map(ToString::to_string).collect(),
            naming: section.naming(project),
            alias: section.alias_options(),
            strip_dirs: section.strip_dirs.clone(),
        })
    }

    /// Resolve the archive's target and alias.
    #[must_use]
    pub fn resolve(&self, env: &BuildEnv) -> ResolvedArtefact {
        resolve(
            env,
            &self.name,
            &self.naming,
            &self.alias,
            &self.format.defaults(env),
        )
    }

    /// Compute the prefixes stripped from member names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDirectory`] for unresolvable strip
    /// directories.
    pub fn strip_prefixes(
        &self,
        env: &BuildEnv,
    ) -> std::result::Result<StripPrefixes, ConfigError> {
        compute_strip_prefixes(&self.strip_dirs, env.tree())
    }
}

/// One file stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Project-relative path of the file on disk.
    pub source: Utf8PathBuf,
    /// Name stored in the archive.
    pub name: String,
}

/// Output produced by [`build_archive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArchive {
    /// The archive's resolved names.
    pub artefact: ResolvedArtefact,
    /// Member names in archive order.
    pub members: Vec<String>,
}

/// Expand the request's sources into archive members.
///
/// Directories contribute every file below them; duplicates and the
/// archive's own target are skipped.
///
/// # Errors
///
/// Returns [`BuildError::EmptySources`] when no sources are declared,
/// [`BuildError::MissingSource`] when a source does not exist, and
/// configuration errors for unresolvable identifiers.
pub fn collect_members(
    env: &BuildEnv,
    request: &ArchiveRequest,
    prefixes: &StripPrefixes,
    target: &Utf8Path,
) -> Result<Vec<ArchiveMember>> {
    if request.sources.is_empty() {
        return Err(BuildError::EmptySources {
            name: request.name.to_string(),
        });
    }

    let mut files = Vec::new();
    for id in &request.sources {
        let entry = env.tree().resolve_file(id)?;
        files.extend(children(env.tree().root(), &entry)?);
    }

    let own = project_relative(env.tree().root(), target);
    Ok(rm_dup(files)
        .into_iter()
        .filter(|file| *file != own)
        .map(|source| {
            let name = posix_path(&prefixes.strip(&source));
            ArchiveMember { source, name }
        })
        .collect())
}

/// `path` normalised and, when it lies below `root`, made relative to it.
fn project_relative(root: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    let path = normalize(path);
    if path.is_absolute() {
        path.strip_prefix(root).map_or_else(|_| path.clone(), Utf8Path::to_owned)
    } else {
        path
    }
}

/// Package the request's sources and register the archive's alias.
///
/// Archives are always rebuilt.
///
/// # Errors
///
/// Returns configuration errors for invalid identifiers, source errors from
/// [`collect_members`], and I/O errors while writing the archive.
pub fn build_archive(env: &mut BuildEnv, request: &ArchiveRequest) -> Result<BuiltArchive> {
    let artefact = request.resolve(env);
    let prefixes = request.strip_prefixes(env)?;
    let members = collect_members(env, request, &prefixes, &artefact.target)?;

    let output_path = env.absolute(&artefact.target);
    let entries: Vec<(Utf8PathBuf, String)> = members
        .iter()
        .map(|m| (env.absolute(&m.source), m.name.clone()))
        .collect();
    write_archive(request.format, &output_path, &entries)?;
    info!(
        "packed {} file(s) into {}",
        entries.len(),
        artefact.target
    );

    if let Some(alias) = &artefact.alias {
        env.register_alias(alias, [artefact.target.clone()]);
    }
    Ok(BuiltArchive {
        artefact,
        members: members.into_iter().map(|m| m.name).collect(),
    })
}

/// Create an archive at `output_path` in the given format.
///
/// Each entry in `files` is a `(source_path, archive_name)` pair; the
/// archive name determines the member's path inside the archive. Missing
/// parent directories of `output_path` are created.
///
/// # Errors
///
/// Returns [`BuildError::Io`] if any source file cannot be read or the
/// output file cannot be written.
pub fn write_archive(
    format: ArchiveFormat,
    output_path: &Utf8Path,
    files: &[(Utf8PathBuf, String)],
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let output_file = fs::File::create(output_path)?;
    debug!("writing {format} archive {output_path}");

    match format {
        ArchiveFormat::Tar => {
            append_all(output_file, files)?;
        }
        ArchiveFormat::TarGz => {
            let encoder =
                flate2::write::GzEncoder::new(output_file, flate2::Compression::default());
            append_all(encoder, files)?.finish()?;
        }
        ArchiveFormat::TarBz2 => {
            let encoder = bzip2::write::BzEncoder::new(output_file, bzip2::Compression::default());
            append_all(encoder, files)?.finish()?;
        }
        ArchiveFormat::TarZst => {
            let encoder = zstd::Encoder::new(output_file, 0)?;
            append_all(encoder, files)?.finish()?;
        }
    }
    Ok(())
}

fn append_all<W: Write>(writer: W, files: &[(Utf8PathBuf, String)]) -> Result<W> {
    let mut archive = tar::Builder::new(writer);
    for (source_path, archive_name) in files {
        archive.append_path_with_name(source_path, archive_name)?;
    }
    Ok(archive.into_inner()?)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
