//! texpack project manifest.
//!
//! The manifest (`texpack.toml`) lists the archives, documents and TDS
//! imports of a LaTeX project. The builder crate turns it into targets,
//! aliases and external tool invocations.

pub mod config;

pub use config::{Manifest, ManifestError, MANIFEST_FILE};
