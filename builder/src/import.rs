//! Importing files from the TeX Directory Structure.
//!
//! Each requested file is located with `kpsewhich`, searching only the TDS
//! path registered for the file's suffix, and copied into the project.

use crate::env::{BuildEnv, Tool};
use crate::error::{BuildError, Result};
use crate::exec::{CommandExecutor, run_checked};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs;
use texpack::config::ImportSection;
use texpack_common::error::ConfigError;
use texpack_common::kpathsea::{clean_search_path, search_path_separator};

/// A request to copy files out of the TeX Directory Structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRequest {
    /// File names to look up, such as `article.cls`.
    pub sources: Vec<String>,
    /// Destination directory identifier; the current directory when absent.
    pub out_dir: Option<String>,
    /// Alias registered for the imported files.
    pub alias: Option<String>,
}

impl From<&ImportSection> for ImportRequest {
    fn from(section: &ImportSection) -> Self {
        Self {
            sources: section.sources.clone(),
            out_dir: section.out_dir.as_ref().map(ToString::to_string),
            alias: section.alias.clone(),
        }
    }
}

/// One file to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    /// File name passed to `kpsewhich`.
    pub file: String,
    /// Suffix selecting the kpathsea search path, including the dot.
    pub suffix: String,
    /// Project-relative destination.
    pub target: Utf8PathBuf,
}

/// Resolve where each requested file will be copied.
///
/// # Errors
///
/// Returns [`ConfigError::MissingSuffix`] for file names without a suffix
/// and [`ConfigError::InvalidPath`] for unresolvable names or directories.
pub fn import_targets(
    env: &BuildEnv,
    request: &ImportRequest,
) -> std::result::Result<Vec<ImportTarget>, ConfigError> {
    let out_dir = env
        .tree()
        .resolve_file(request.out_dir.as_deref().unwrap_or("."))?;
    request
        .sources
        .iter()
        .map(|source| {
            let file = env.subst(source)?;
            let suffix = Utf8Path::new(&file)
                .extension()
                .filter(|ext| !ext.is_empty())
                .map(|ext| format!(".{ext}"))
                .ok_or_else(|| ConfigError::MissingSuffix { file: file.clone() })?;
            let target = env.tree().resolve_file(&format!("#{}", out_dir.join(&file)))?;
            Ok(ImportTarget {
                file,
                suffix,
                target,
            })
        })
        .collect()
}

/// Copy the requested files out of the TDS and register the alias.
///
/// Returns the project-relative paths of the copied files.
///
/// # Errors
///
/// Returns configuration errors from [`import_targets`],
/// [`BuildError::ToolUnavailable`] without `kpsewhich`,
/// [`BuildError::NotInTds`] when a file cannot be found, and I/O errors
/// while copying.
pub fn import_from_tds(
    env: &mut BuildEnv,
    executor: &dyn CommandExecutor,
    request: &ImportRequest,
) -> Result<Vec<Utf8PathBuf>> {
    let targets = import_targets(env, request)?;
    let program = env.require(executor, Tool::Kpsewhich)?;
    let cwd = env.absolute(env.cwd());

    let mut imported = Vec::with_capacity(targets.len());
    for target in targets {
        let found = locate(executor, &program, &target, &cwd)?;
        let destination = env.absolute(&target.target);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&found, &destination)?;
        info!("imported {found} to {}", target.target);
        imported.push(target.target);
    }

    if let Some(alias) = &request.alias {
        env.register_alias(alias, imported.iter().cloned());
    }
    Ok(imported)
}

fn locate(
    executor: &dyn CommandExecutor,
    program: &str,
    target: &ImportTarget,
    cwd: &Utf8Path,
) -> Result<Utf8PathBuf> {
    let output = run_checked(
        executor,
        program,
        &[format!("-show-path={}", target.suffix)],
        cwd,
    )?;
    let raw_path = String::from_utf8_lossy(&output.stdout);
    let path = clean_search_path(raw_path.trim(), search_path_separator());
    debug!("search path for {}: {path}", target.suffix);

    // kpsewhich exits unsuccessfully when nothing is found.
    let output = executor.run(
        program,
        &[format!("-path={path}"), target.file.clone()],
        cwd,
    )?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    match stdout.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(found) if output.status.success() => Ok(Utf8PathBuf::from(found)),
        _ => Err(BuildError::NotInTds {
            file: target.file.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{ProjectTree, Variables};
    use crate::exec::{StubExecutor, StubOutput};
    use rstest::{fixture, rstest};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct Project {
        _dir: TempDir,
        root: Utf8PathBuf,
        tds: Utf8PathBuf,
    }

    #[fixture]
    fn project() -> Project {
        let dir = TempDir::new().expect("temp dir creation succeeds");
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let root = base.join("project");
        let tds = base.join("texmf/tex/latex/base");
        fs::create_dir_all(&root).expect("mkdir project");
        fs::create_dir_all(&tds).expect("mkdir tds");
        fs::write(tds.join("article.cls"), b"% article").expect("write class");
        Project {
            _dir: dir,
            root,
            tds,
        }
    }

    fn env(project: &Project) -> BuildEnv {
        let variables = BTreeMap::from([("CLASS".to_owned(), "article".to_owned())]);
        BuildEnv::new(ProjectTree::new(
            project.root.clone(),
            Variables::new(variables),
            Vec::new(),
        ))
    }

    fn kpsewhich(project: &Project) -> StubExecutor {
        StubExecutor::new()
            .with_response("kpsewhich", "--version", StubOutput::ok("kpathsea version 6.3.5"))
            .with_response("kpsewhich", "-show-path", StubOutput::ok(".:./:/usr/share/texmf//\n"))
            .with_response(
                "kpsewhich",
                "article.cls",
                StubOutput::ok(format!("{}\n", project.tds.join("article.cls"))),
            )
            .with_response("kpsewhich", "", StubOutput::failed())
            .with_response("latex", "", StubOutput::failed())
            .with_response("pdflatex", "", StubOutput::failed())
            .with_response("dvipdfm", "", StubOutput::failed())
    }

    fn request(sources: &[&str], out_dir: Option<&str>) -> ImportRequest {
        ImportRequest {
            sources: sources.iter().map(|s| (*s).to_owned()).collect(),
            out_dir: out_dir.map(str::to_owned),
            alias: Some("tds".to_owned()),
        }
    }

    #[rstest]
    fn targets_land_in_the_output_directory(project: Project) {
        let req = request(&["$CLASS.cls"], Some("tds"));
        let targets = import_targets(&env(&project), &req).expect("resolves");
        assert_eq!(
            targets,
            vec![ImportTarget {
                file: "article.cls".to_owned(),
                suffix: ".cls".to_owned(),
                target: Utf8PathBuf::from("tds/article.cls"),
            }]
        );
    }

    #[rstest]
    fn files_without_suffix_are_rejected(project: Project) {
        let req = request(&["Makefile"], None);
        let err = import_targets(&env(&project), &req).expect_err("no suffix");
        assert_eq!(
            err,
            ConfigError::MissingSuffix {
                file: "Makefile".to_owned()
            }
        );
    }

    #[rstest]
    fn files_are_copied_from_the_tds(project: Project) {
        let mut env = env(&project);
        let executor = kpsewhich(&project);

        let req = request(&["article.cls"], None);
        let imported = import_from_tds(&mut env, &executor, &req).expect("imports");
        assert_eq!(imported, vec![Utf8PathBuf::from("article.cls")]);
        assert_eq!(
            fs::read_to_string(project.root.join("article.cls")).expect("copied"),
            "% article"
        );
        assert_eq!(env.aliases().targets("tds"), Some(imported.as_slice()));
    }

    #[rstest]
    fn current_directory_is_removed_from_the_search_path(project: Project) {
        let mut env = env(&project);
        let executor = kpsewhich(&project);
        import_from_tds(&mut env, &executor, &request(&["article.cls"], None)).expect("imports");

        let lookup = executor
            .calls()
            .into_iter()
            .find(|call| call.args.iter().any(|a| a == "article.cls"))
            .expect("lookup call");
        assert_eq!(lookup.args.first().map(String::as_str), Some("-path=/usr/share/texmf//"));
    }

    #[rstest]
    fn unknown_files_are_reported(project: Project) {
        let mut env = env(&project);
        let executor = kpsewhich(&project);

        let err = import_from_tds(&mut env, &executor, &request(&["missing.sty"], None))
            .expect_err("not in tds");
        assert!(matches!(err, BuildError::NotInTds { file } if file == "missing.sty"));
    }
}
