//! Error types for texpack builds.
//!
//! Configuration mistakes, missing inputs and failing external programs all
//! surface here so the CLI can report them with the offending path or
//! command.

use camino::Utf8PathBuf;
use texpack::ManifestError;
use texpack_common::ConfigError;
use thiserror::Error;

/// Errors that can occur while planning or running a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The project configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The manifest could not be loaded.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source or dependency file does not exist.
    #[error("source {path} does not exist")]
    MissingSource {
        /// Project-relative path of the missing file.
        path: Utf8PathBuf,
    },

    /// An archive was declared without sources.
    #[error("archive {name} has no sources")]
    EmptySources {
        /// Name of the archive.
        name: String,
    },

    /// An external program exited unsuccessfully.
    #[error("{program} failed: {message}")]
    CommandFailed {
        /// The program that was run.
        program: String,
        /// Exit status and trailing diagnostic output.
        message: String,
    },

    /// An external program finished but did not produce the expected file.
    #[error("{program} did not produce {path}")]
    MissingOutput {
        /// The program that was run.
        program: String,
        /// The file that was expected.
        path: Utf8PathBuf,
    },

    /// A required external program is not installed.
    #[error("{program} is not available; install it or set ${variable}")]
    ToolUnavailable {
        /// The program that was probed.
        program: String,
        /// The construction variable that overrides the program name.
        variable: &'static str,
    },

    /// `kpsewhich` could not locate a file in the TeX Directory Structure.
    #[error("{file} not found in the TeX Directory Structure")]
    NotInTds {
        /// The requested file name.
        file: String,
    },

    /// A requested alias is not registered.
    #[error("unknown alias {alias}; run `texpack aliases` to list them")]
    UnknownAlias {
        /// The requested alias.
        alias: String,
    },

    /// A path found on disk is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path {
        /// The offending path.
        path: std::path::PathBuf,
    },

    /// A file enumeration pattern could not be compiled.
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// The build plan could not be serialised.
    #[error("plan serialisation error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Test stub received an invocation it has no answer for.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of the unexpected invocation.
        message: String,
    },
}

/// Result type alias using [`BuildError`].
pub type Result<T> = std::result::Result<T, BuildError>;
