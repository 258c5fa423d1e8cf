//! Command handlers for the `texpack` binary.
//!
//! Each handler works on a loaded [`Project`] and writes its report to the
//! supplied writer, so the binary only parses arguments and maps errors to
//! exit codes.

use crate::archive::build_archive;
use crate::document::build_document;
use crate::env::BuildEnv;
use crate::error::Result;
use crate::exec::CommandExecutor;
use crate::import::{import_from_tds, import_targets};
use crate::plan::{BuildPlan, Step, format_human, format_json};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs;
use std::io::Write;
use texpack::Manifest;

/// A manifest together with the environment it is built in.
#[derive(Debug)]
pub struct Project {
    /// The build environment rooted at the project directory.
    pub env: BuildEnv,
    /// Every step the manifest declares.
    pub plan: BuildPlan,
}

impl Project {
    /// Load the manifest at `manifest_path` for the project rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns manifest errors for unreadable or invalid files and
    /// configuration errors for invalid entries.
    pub fn load(root: &Utf8Path, manifest_path: &Utf8Path) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        debug!("loaded {manifest_path}");
        Ok(Self {
            env: BuildEnv::from_manifest(root.to_owned(), &manifest),
            plan: BuildPlan::from_manifest(&manifest)?,
        })
    }
}

/// Build every step, or only those behind `aliases`.
///
/// Progress lines are written to `progress` unless `quiet` is set.
///
/// # Errors
///
/// Returns the first error raised by a builder; later steps are not run.
pub fn run_build(
    project: &mut Project,
    executor: &dyn CommandExecutor,
    aliases: &[String],
    quiet: bool,
    progress: &mut dyn Write,
) -> Result<()> {
    let Project { env, plan } = project;
    for step in plan.select(env, aliases)? {
        let message = match step {
            Step::Archive(request) => {
                let built = build_archive(env, request)?;
                format!(
                    "packed {} ({} files)",
                    built.artefact.target,
                    built.members.len()
                )
            }
            Step::Document(request) => {
                let built = build_document(env, executor, request)?;
                if built.rebuilt {
                    format!("built {}", built.artefact.target)
                } else {
                    format!("{} is up to date", built.artefact.target)
                }
            }
            Step::Import(request) => {
                let imported = import_from_tds(env, executor, request)?;
                format!("imported {} file(s)", imported.len())
            }
        };
        if !quiet {
            writeln!(progress, "{message}")?;
        }
    }
    Ok(())
}

/// Remove the files produced by every step, or only those behind
/// `aliases`. Returns the removed paths.
///
/// # Errors
///
/// Returns configuration errors, unknown aliases, and I/O errors other than
/// a file already being absent.
pub fn run_clean(
    project: &mut Project,
    aliases: &[String],
    quiet: bool,
    progress: &mut dyn Write,
) -> Result<Vec<Utf8PathBuf>> {
    let Project { env, plan } = project;
    let mut removed = Vec::new();
    for step in plan.select(env, aliases)? {
        for target in produced_files(env, step)? {
            let path = env.absolute(&target);
            if !path.is_file() {
                continue;
            }
            fs::remove_file(&path)?;
            info!("removed {target}");
            if !quiet {
                writeln!(progress, "removed {target}")?;
            }
            removed.push(target);
        }
    }
    Ok(removed)
}

fn produced_files(env: &BuildEnv, step: &Step) -> Result<Vec<Utf8PathBuf>> {
    Ok(match step {
        Step::Archive(request) => vec![request.resolve(env).target],
        Step::Document(request) => vec![request.resolve(env).target],
        Step::Import(request) => import_targets(env, request)?
            .into_iter()
            .map(|t| t.target)
            .collect(),
    })
}

/// Print the resolved plan, as text or JSON.
///
/// # Errors
///
/// Returns configuration errors and write failures.
pub fn run_plan(project: &mut Project, json: bool, stdout: &mut dyn Write) -> Result<()> {
    let planned = project.plan.resolve(&mut project.env)?;
    let output = if json {
        format_json(&planned)?
    } else {
        format_human(&planned)
    };
    writeln!(stdout, "{}", output.trim_end())?;
    Ok(())
}

/// Print every registered alias with its targets.
///
/// # Errors
///
/// Returns configuration errors and write failures.
pub fn run_aliases(project: &mut Project, stdout: &mut dyn Write) -> Result<()> {
    project.plan.resolve(&mut project.env)?;
    for (alias, targets) in project.env.aliases().iter() {
        let targets: Vec<&str> = targets.iter().map(|t| t.as_str()).collect();
        writeln!(stdout, "{alias}: {}", targets.join(" "))?;
    }
    Ok(())
}
