//! CLI argument definitions for `texpack`.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use texpack::MANIFEST_FILE;

/// Build LaTeX documents, TDS imports and source archives.
#[derive(Parser, Debug)]
#[command(name = "texpack")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build every artefact declared in texpack.toml:\n",
    "    $ texpack build\n\n",
    "  Build only the gzipped source archive of `package`:\n",
    "    $ texpack build package-tgz\n\n",
    "  Show resolved targets, aliases and strip patterns:\n",
    "    $ texpack plan --json\n",
))]
pub struct Cli {
    /// Manifest file, relative to the project directory.
    #[arg(short = 'f', long = "file", value_name = "FILE", default_value = MANIFEST_FILE)]
    pub manifest: Utf8PathBuf,

    /// Project directory [default: current directory].
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    pub directory: Option<Utf8PathBuf>,

    /// Suppress progress output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build artefacts, all of them unless aliases are given.
    Build {
        /// Aliases to build.
        aliases: Vec<String>,
    },

    /// Remove built artefacts, all of them unless aliases are given.
    Clean {
        /// Aliases to clean.
        aliases: Vec<String>,
    },

    /// Print resolved targets, aliases and strip patterns.
    Plan {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List registered aliases and their targets.
    Aliases,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
