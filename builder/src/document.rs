//! LaTeX document builders.
//!
//! A document is compiled by `latex` (DVI), `pdflatex` (PDF) or `latex`
//! followed by `dvipdfm` (PDF through DVI). Targets and aliases come from the
//! name resolver with the builder's defaults; the engines are located through
//! the environment's one-time tool probe.

use crate::artefact::{BuilderDefaults, ResolvedArtefact, resolve};
use crate::env::{BuildEnv, Tool};
use crate::error::{BuildError, Result};
use crate::exec::{CommandExecutor, run_checked};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::str::FromStr;
use std::time::SystemTime;
use texpack::config::{DocumentSection, ProjectSection};
use texpack_common::error::ConfigError;
use texpack_common::flags::append_flags;
use texpack_common::{AliasOptions, ArtefactName, NamingOptions};

/// Construction variable holding the default `dvipdfm` flags.
const DVIPDFM_FLAGS_VARIABLE: &str = "DVIPDFMFLAGS";

/// Available document builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocBuilder {
    /// `latex` producing a DVI file.
    Dvi,
    /// `pdflatex` producing a PDF file.
    Pdf,
    /// `latex` then `dvipdfm` producing a PDF file.
    DviPdfm,
}

impl DocBuilder {
    /// Canonical builder name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dvi => "DVI",
            Self::Pdf => "PDF",
            Self::DviPdfm => "DVIPDFM",
        }
    }

    /// Default target suffix and alias suffix for this builder.
    #[must_use]
    pub fn defaults(self, env: &BuildEnv) -> BuilderDefaults {
        let (suffix, alias_suffix) = match self {
            Self::Dvi => (".dvi", "dvi"),
            Self::Pdf => (env.variable("PDFSUFFIX").unwrap_or(".pdf"), "pdf"),
            Self::DviPdfm => (env.variable("DVIPDFMSUFFIX").unwrap_or(".pdf"), "pdf"),
        };
        BuilderDefaults {
            suffix: suffix.to_owned(),
            alias_suffix,
        }
    }

    const fn engine(self) -> Tool {
        match self {
            Self::Pdf => Tool::PdfLatex,
            Self::Dvi | Self::DviPdfm => Tool::Latex,
        }
    }

    const fn flags_variable(self) -> &'static str {
        match self {
            Self::Pdf => "PDFLATEXFLAGS",
            Self::Dvi | Self::DviPdfm => "LATEXFLAGS",
        }
    }
}

impl FromStr for DocBuilder {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DVI" => Ok(Self::Dvi),
            "PDF" => Ok(Self::Pdf),
            "DVIPDFM" => Ok(Self::DviPdfm),
            _ => Err(ConfigError::UnsupportedBuilder { name: s.to_owned() }),
        }
    }
}

impl fmt::Display for DocBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to compile a LaTeX document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    /// Document name.
    pub name: ArtefactName,
    /// Builder to run.
    pub builder: DocBuilder,
    /// Main source identifier; `<name>.tex` when absent.
    pub source: Option<String>,
    /// Additional inputs that must exist.
    pub deps: Vec<String>,
    /// Engine flags replacing the construction variable flags.
    pub flags: Option<String>,
    /// Target naming overrides.
    pub naming: NamingOptions,
    /// Alias overrides.
    pub alias: AliasOptions,
}

impl DocumentRequest {
    /// Build a request from a manifest `[[document]]` entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingName`] or
    /// [`ConfigError::UnsupportedBuilder`] for invalid entries.
    pub fn from_section(
        section: &DocumentSection,
        project: &ProjectSection,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            name: ArtefactName::try_from(section.name.as_str())?,
            builder: section.builder.parse()?,
            source: section.source.as_ref().map(ToString::to_string),
            deps: section.deps.iter().map(ToString::to_string).collect(),
            flags: section.flags.clone(),
            naming: section.naming(project),
            alias: section.alias_options(),
        })
    }

    /// Resolve the document's target and alias.
    ///
    /// The DVI builder always produces `.dvi` files, so an explicit suffix
    /// is dropped for it.
    #[must_use]
    pub fn resolve(&self, env: &BuildEnv) -> ResolvedArtefact {
        let naming = match self.builder {
            DocBuilder::Dvi => NamingOptions {
                suffix: None,
                ..self.naming.clone()
            },
            DocBuilder::Pdf | DocBuilder::DviPdfm => self.naming.clone(),
        };
        resolve(
            env,
            &self.name,
            &naming,
            &self.alias,
            &self.builder.defaults(env),
        )
    }

    /// Project-relative path of the main source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPath`] for unresolvable identifiers.
    pub fn source_path(&self, env: &BuildEnv) -> std::result::Result<Utf8PathBuf, ConfigError> {
        let default = format!("{}.tex", self.name);
        env.tree()
            .resolve_file(self.source.as_deref().unwrap_or(&default))
    }
}

/// Output produced by [`build_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltDocument {
    /// The document's resolved names.
    pub artefact: ResolvedArtefact,
    /// Whether the engine ran; `false` when the target was up to date.
    pub rebuilt: bool,
}

/// Compile a document unless its target is newer than all of its inputs,
/// then register its alias.
///
/// # Errors
///
/// Returns [`BuildError::MissingSource`] for absent inputs,
/// [`BuildError::ToolUnavailable`] when the engine is not installed,
/// [`BuildError::CommandFailed`] when an engine fails, and
/// [`BuildError::MissingOutput`] when it produces nothing.
pub fn build_document(
    env: &mut BuildEnv,
    executor: &dyn CommandExecutor,
    request: &DocumentRequest,
) -> Result<BuiltDocument> {
    let artefact = request.resolve(env);
    let source = request.source_path(env)?;
    let mut inputs = vec![source.clone()];
    for dep in &request.deps {
        inputs.push(env.tree().resolve_file(dep)?);
    }
    for input in &inputs {
        if !env.absolute(input).is_file() {
            return Err(BuildError::MissingSource {
                path: input.clone(),
            });
        }
    }

    let target = env.absolute(&artefact.target);
    let absolute_inputs: Vec<Utf8PathBuf> = inputs.iter().map(|i| env.absolute(i)).collect();
    let rebuilt = if is_up_to_date(&target, &absolute_inputs) {
        debug!("{} is up to date", artefact.target);
        false
    } else {
        let job = Job::new(&target, &env.absolute(&source))?;
        compile(env, executor, request, &job)?;
        info!("built {}", artefact.target);
        true
    };

    if let Some(alias) = &artefact.alias {
        env.register_alias(alias, [artefact.target.clone()]);
    }
    Ok(BuiltDocument { artefact, rebuilt })
}

/// Absolute paths of one engine run.
struct Job {
    target: Utf8PathBuf,
    target_dir: Utf8PathBuf,
    jobname: String,
    source: Utf8PathBuf,
    source_dir: Utf8PathBuf,
}

impl Job {
    fn new(target: &Utf8Path, source: &Utf8Path) -> Result<Self> {
        let target_dir = target.parent().map_or_else(Utf8PathBuf::new, Utf8Path::to_owned);
        fs::create_dir_all(&target_dir)?;
        Ok(Self {
            target: target.to_owned(),
            jobname: target.file_stem().unwrap_or_default().to_owned(),
            target_dir,
            source: source.to_owned(),
            source_dir: source.parent().map_or_else(Utf8PathBuf::new, Utf8Path::to_owned),
        })
    }

    fn output(&self, extension: &str) -> Utf8PathBuf {
        self.target_dir.join(format!("{}.{extension}", self.jobname))
    }
}

fn compile(
    env: &BuildEnv,
    executor: &dyn CommandExecutor,
    request: &DocumentRequest,
    job: &Job,
) -> Result<()> {
    let engine = request.builder.engine();
    let program = env.require(executor, engine)?;
    let output_directory = format!("-output-directory={}", job.target_dir);
    let jobname = format!("-jobname={}", job.jobname);
    let args = append_flags(
        request.flags.as_deref(),
        env.variable(request.builder.flags_variable()),
        &[
            "-interaction=nonstopmode",
            output_directory.as_str(),
            jobname.as_str(),
            job.source.as_str(),
        ],
    );
    run_checked(executor, &program, &args, &job.source_dir)?;

    match request.builder {
        DocBuilder::Dvi => move_output(&program, &job.output("dvi"), &job.target),
        DocBuilder::Pdf => move_output(&program, &job.output("pdf"), &job.target),
        DocBuilder::DviPdfm => {
            let dvi = job.output("dvi");
            ensure_exists(&program, &dvi)?;
            convert_dvi(env, executor, job)
        }
    }
}

fn convert_dvi(env: &BuildEnv, executor: &dyn CommandExecutor, job: &Job) -> Result<()> {
    let program = env.require(executor, Tool::DviPdfm)?;
    let output_name = job.target.file_name().unwrap_or_default();
    let dvi_name = format!("{}.dvi", job.jobname);
    let args = append_flags(
        None,
        env.variable(DVIPDFM_FLAGS_VARIABLE),
        &["-o", output_name, dvi_name.as_str()],
    );
    run_checked(executor, &program, &args, &job.target_dir)?;
    ensure_exists(&program, &job.target)
}

fn move_output(program: &str, produced: &Utf8Path, target: &Utf8Path) -> Result<()> {
    ensure_exists(program, produced)?;
    if produced != target {
        debug!("renaming {produced} to {target}");
        fs::rename(produced, target)?;
    }
    Ok(())
}

fn ensure_exists(program: &str, path: &Utf8Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BuildError::MissingOutput {
            program: program.to_owned(),
            path: path.to_owned(),
        })
    }
}

fn modified(path: &Utf8Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn is_up_to_date(target: &Utf8Path, inputs: &[Utf8PathBuf]) -> bool {
    let Some(built) = modified(target) else {
        return false;
    };
    inputs
        .iter()
        .all(|input| modified(input).is_some_and(|changed| changed <= built))
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
