//! Target and alias resolution shared by the builders.
//!
//! Each builder knows its own default suffix and default alias suffix; this
//! module folds those into the user's overrides and runs the name resolver
//! from the current directory.

use crate::env::BuildEnv;
use camino::Utf8PathBuf;
use serde::Serialize;
use texpack_common::{AliasOptions, ArtefactName, NamingOptions};

/// Defaults contributed by a builder entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderDefaults {
    /// Target suffix used when the user gives none.
    pub suffix: String,
    /// Alias suffix used when the user gives none.
    pub alias_suffix: &'static str,
}

/// The resolved names of one artefact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtefact {
    /// Artefact name.
    pub name: String,
    /// Target path, relative to the project root unless given absolute.
    pub target: Utf8PathBuf,
    /// Build alias, or `None` when the alias is disabled.
    pub alias: Option<String>,
}

/// Resolve the target and alias of `name` with a builder's defaults.
#[must_use]
pub fn resolve(
    env: &BuildEnv,
    name: &ArtefactName,
    naming: &NamingOptions,
    alias: &AliasOptions,
    defaults: &BuilderDefaults,
) -> ResolvedArtefact {
    let naming = NamingOptions {
        default_suffix: Some(defaults.suffix.clone()),
        ..naming.clone()
    };
    let alias = AliasOptions {
        default_alias_suffix: Some(defaults.alias_suffix.to_owned()),
        ..alias.clone()
    };
    ResolvedArtefact {
        name: name.to_string(),
        target: naming.resolve_target(name, env.cwd()),
        alias: alias.resolve_alias(name),
    }
}
