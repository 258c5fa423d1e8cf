//! Test support utilities for builder behavioural tests.
//!
//! Provides a throw-away project directory and a build environment rooted at
//! it.

use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;
use texpack_builder::env::{BuildEnv, ProjectTree, Variables};

/// A temporary directory holding a project tree and, optionally, a fake
/// TeX Directory Structure beside it.
pub struct Sandbox {
    _dir: TempDir,
    base: Utf8PathBuf,
}

impl Sandbox {
    /// Create an empty sandbox with a `project` directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir creation succeeds");
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        fs::create_dir_all(base.join("project")).expect("mkdir project");
        Self { _dir: dir, base }
    }

    /// The project root.
    pub fn root(&self) -> Utf8PathBuf {
        self.base.join("project")
    }

    /// Write `contents` to `relative`, below the sandbox base, creating
    /// parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> Utf8PathBuf {
        let path = self.base.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// A build environment rooted at the project with no variables.
    pub fn env(&self) -> BuildEnv {
        BuildEnv::new(ProjectTree::new(
            self.root(),
            Variables::new(BTreeMap::new()),
            Vec::new(),
        ))
    }
}
