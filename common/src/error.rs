//! Configuration errors raised while resolving artefact names and paths.
//!
//! Missing optional settings are never errors; they fall back to documented
//! defaults. The variants here cover the inputs that cannot be repaired by a
//! fallback and must be fixed by the caller.

use thiserror::Error;

/// Errors arising from invalid build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An artefact was declared without a name.
    #[error("artefact name must not be empty")]
    MissingName,

    /// A directory identifier could not be resolved to a directory.
    #[error("cannot resolve directory \"{id}\": {reason}")]
    InvalidDirectory {
        /// The identifier as supplied by the caller.
        id: String,
        /// Description of why resolution failed.
        reason: String,
    },

    /// A file identifier could not be resolved to a project path.
    #[error("cannot resolve path \"{id}\": {reason}")]
    InvalidPath {
        /// The identifier as supplied by the caller.
        id: String,
        /// Description of why resolution failed.
        reason: String,
    },

    /// A document builder name is not one of the supported builders.
    #[error("unsupported builder: {name:?}; expected one of: DVI, PDF, DVIPDFM")]
    UnsupportedBuilder {
        /// The rejected builder name.
        name: String,
    },

    /// An archive format name is not recognised.
    #[error("unknown archive format {name:?}; expected one of: tar, tar.gz, tar.bz2, tar.zst")]
    UnknownFormat {
        /// The rejected format name.
        name: String,
    },

    /// A file requested from the TeX Directory Structure has no suffix, so
    /// its search path cannot be determined.
    #[error("can't import file \"{file}\" which has no suffix")]
    MissingSuffix {
        /// The offending file name.
        file: String,
    },
}

/// Result type alias using [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
