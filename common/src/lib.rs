//! Shared core for texpack: artefact name resolution, archive path
//! stripping, and the small string and path helpers the builders rely on.

pub mod dedup;
pub mod error;
pub mod flags;
pub mod kpathsea;
pub mod naming;
pub mod paths;
pub mod precedence;
pub mod strip;

pub use error::ConfigError;
pub use naming::{AliasOptions, AliasSetting, ArtefactName, NamingOptions};
pub use strip::{DirectoryTree, StripDirs, StripPrefixes, compute_strip_prefixes};
