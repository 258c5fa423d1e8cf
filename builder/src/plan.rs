//! Build plans derived from the project manifest.
//!
//! A plan lists every artefact declared in `texpack.toml` in manifest order
//! (archives, then documents, then imports). Resolving a plan computes each
//! step's targets, alias and archive strip pattern without touching the
//! filesystem beyond directory checks.

use crate::archive::ArchiveRequest;
use crate::document::DocumentRequest;
use crate::env::BuildEnv;
use crate::error::{BuildError, Result};
use crate::import::{ImportRequest, import_targets};
use camino::Utf8PathBuf;
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;
use texpack::Manifest;
use texpack_common::error::ConfigError;

/// One unit of work in a build plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Pack sources into an archive.
    Archive(ArchiveRequest),
    /// Compile a LaTeX document.
    Document(DocumentRequest),
    /// Copy files out of the TeX Directory Structure.
    Import(ImportRequest),
}

impl Step {
    /// Short label for the kind of step.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Archive(_) => "archive",
            Self::Document(_) => "document",
            Self::Import(_) => "import",
        }
    }

    /// Human-readable step name.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Archive(request) => request.name.to_string(),
            Self::Document(request) => request.name.to_string(),
            Self::Import(request) => request.sources.join(" "),
        }
    }

    /// Resolve the step's targets, alias and strip pattern.
    ///
    /// # Errors
    ///
    /// Returns configuration errors for invalid identifiers.
    pub fn resolve(&self, env: &BuildEnv) -> std::result::Result<PlannedStep, ConfigError> {
        let (targets, alias, strip_pattern) = match self {
            Self::Archive(request) => {
                let artefact = request.resolve(env);
                let prefixes = request.strip_prefixes(env)?;
                let pattern = (!prefixes.is_empty()).then(|| prefixes.sed_pattern());
                (vec![artefact.target], artefact.alias, pattern)
            }
            Self::Document(request) => {
                let artefact = request.resolve(env);
                (vec![artefact.target], artefact.alias, None)
            }
            Self::Import(request) => {
                let targets = import_targets(env, request)?
                    .into_iter()
                    .map(|t| t.target)
                    .collect();
                (targets, request.alias.clone(), None)
            }
        };
        Ok(PlannedStep {
            kind: self.kind(),
            name: self.name(),
            targets,
            alias,
            strip_pattern,
        })
    }
}

/// A resolved step, as printed by `texpack plan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    /// Step kind: `archive`, `document` or `import`.
    pub kind: &'static str,
    /// Step name.
    pub name: String,
    /// Files the step produces.
    pub targets: Vec<Utf8PathBuf>,
    /// Alias building the step, if any.
    pub alias: Option<String>,
    /// Sed expression stripping directories from archive members.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_pattern: Option<String>,
}

/// Every step declared by a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    steps: Vec<Step>,
}

impl BuildPlan {
    /// Convert manifest entries into steps.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found in the manifest.
    pub fn from_manifest(manifest: &Manifest) -> std::result::Result<Self, ConfigError> {
        let project = &manifest.project;
        let archives = manifest
            .archives
            .iter()
            .map(|section| ArchiveRequest::from_section(section, project).map(Step::Archive));
        let documents = manifest
            .documents
            .iter()
            .map(|section| DocumentRequest::from_section(section, project).map(Step::Document));
        let imports = manifest
            .imports
            .iter()
            .map(|section| Ok(Step::Import(ImportRequest::from(section))));
        let steps = archives
            .chain(documents)
            .chain(imports)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    /// The steps in build order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Resolve every step and register its alias with `env`.
    ///
    /// # Errors
    ///
    /// Returns configuration errors for invalid identifiers.
    pub fn resolve(&self, env: &mut BuildEnv) -> Result<Vec<PlannedStep>> {
        let mut planned = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let resolved = step.resolve(env)?;
            if let Some(alias) = &resolved.alias {
                env.register_alias(alias, resolved.targets.iter().cloned());
            }
            planned.push(resolved);
        }
        Ok(planned)
    }

    /// Select the steps producing targets behind `aliases`; every step when
    /// `aliases` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownAlias`] for unregistered aliases, plus
    /// the errors of [`BuildPlan::resolve`].
    pub fn select(&self, env: &mut BuildEnv, aliases: &[String]) -> Result<Vec<&Step>> {
        let planned = self.resolve(env)?;
        if aliases.is_empty() {
            return Ok(self.steps.iter().collect());
        }

        let mut wanted = BTreeSet::new();
        for alias in aliases {
            let targets = env
                .aliases()
                .targets(alias)
                .ok_or_else(|| BuildError::UnknownAlias {
                    alias: alias.clone(),
                })?;
            wanted.extend(targets.iter().cloned());
        }
        debug!("selected targets: {wanted:?}");

        Ok(self
            .steps
            .iter()
            .zip(planned)
            .filter(|(_, resolved)| resolved.targets.iter().any(|t| wanted.contains(t)))
            .map(|(step, _)| step)
            .collect())
    }
}

/// Format resolved steps for human-readable output.
#[must_use]
pub fn format_human(steps: &[PlannedStep]) -> String {
    if steps.is_empty() {
        return String::from("Nothing to build.");
    }

    let mut output = String::new();
    for step in steps {
        output.push_str(&format!("{} {}\n", step.kind, step.name));
        for target in &step.targets {
            output.push_str(&format!("  target: {target}\n"));
        }
        if let Some(alias) = &step.alias {
            output.push_str(&format!("  alias: {alias}\n"));
        }
        if let Some(pattern) = &step.strip_pattern {
            output.push_str(&format!("  strip: {pattern}\n"));
        }
    }
    output
}

/// Format resolved steps as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`BuildError::Serialization`] if serialization fails.
pub fn format_json(steps: &[PlannedStep]) -> Result<String> {
    Ok(serde_json::to_string_pretty(steps)?)
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
