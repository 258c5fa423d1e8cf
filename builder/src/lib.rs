//! texpack builder library.
//!
//! This crate turns a `texpack.toml` manifest into LaTeX documents, files
//! imported from the TeX Directory Structure and source archives. It is used
//! by the `texpack` CLI binary and can be driven programmatically in tests.
//!
//! # Modules
//!
//! - [`archive`] - Tar archive builders with member path stripping
//! - [`artefact`] - Target and alias resolution with builder defaults
//! - [`children`] - File enumeration below project directories
//! - [`cli`] - Command-line argument definitions
//! - [`commands`] - Build, clean, plan and alias listing handlers
//! - [`document`] - DVI and PDF document builders
//! - [`env`] - Project tree, construction variables, aliases and tools
//! - [`error`] - Error types for planning and building
//! - [`exec`] - External program execution
//! - [`import`] - Copying files out of the TeX Directory Structure
//! - [`plan`] - Build plans derived from the manifest

pub mod archive;
pub mod artefact;
pub mod children;
pub mod cli;
pub mod commands;
pub mod document;
pub mod env;
pub mod error;
pub mod exec;
pub mod import;
pub mod plan;
