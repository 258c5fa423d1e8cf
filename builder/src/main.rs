//! `texpack` CLI entrypoint.
//!
//! Loads `texpack.toml` from the project directory and builds, cleans or
//! describes the artefacts it declares.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::io::Write;
use texpack_builder::cli::{Cli, Command};
use texpack_builder::commands::{Project, run_aliases, run_build, run_clean, run_plan};
use texpack_builder::error::{BuildError, Result};
use texpack_builder::exec::SystemCommandExecutor;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let root = project_root(cli.directory.as_deref())?;
    let mut project = Project::load(&root, &root.join(&cli.manifest))?;
    let mut stdout = std::io::stdout();

    match &cli.command {
        Command::Build { aliases } => run_build(
            &mut project,
            &SystemCommandExecutor,
            aliases,
            cli.quiet,
            stderr,
        ),
        Command::Clean { aliases } => {
            run_clean(&mut project, aliases, cli.quiet, stderr).map(|_| ())
        }
        Command::Plan { json } => run_plan(&mut project, *json, &mut stdout),
        Command::Aliases => run_aliases(&mut project, &mut stdout),
    }
}

/// Resolve the absolute project root from the `-C` option.
fn project_root(directory: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| BuildError::NonUtf8Path {
        path: e.into_path_buf(),
    })?;
    Ok(directory.map_or_else(|| cwd.clone(), |dir| cwd.join(dir)))
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}
