//! The build environment shared by every builder.
//!
//! A [`BuildEnv`] owns the project root, construction variables, variant
//! build directories, the alias registry and the lazily probed set of
//! available TeX tools. Builders receive it explicitly; nothing is kept in
//! process-wide state.

use crate::error::{BuildError, Result};
use crate::exec::CommandExecutor;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use once_cell::unsync::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use texpack::config::VariantSection;
use texpack::Manifest;
use texpack_common::error::ConfigError;
use texpack_common::paths::normalize;
use texpack_common::strip::DirectoryTree;

/// Construction variables available for `$NAME` and `${NAME}` substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables(BTreeMap<String, String>);

impl Variables {
    /// Wrap a variable map.
    #[must_use]
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self(values)
    }

    /// Look up a variable, treating empty values as unset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Substitute `$NAME`, `${NAME}` and `$$` in `text`.
    ///
    /// # Errors
    ///
    /// Returns the name of the first variable that is not defined, or the
    /// unterminated `{NAME` text of a brace reference missing its `}`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use texpack_builder::env::Variables;
    ///
    /// let vars = Variables::new(BTreeMap::from([("BUILD".to_owned(), "out".to_owned())]));
    /// assert_eq!(vars.subst("$BUILD/docs").as_deref(), Ok("out/docs"));
    /// assert_eq!(vars.subst("${BUILD}x").as_deref(), Ok("outx"));
    /// assert_eq!(vars.subst("$$HOME").as_deref(), Ok("$HOME"));
    /// assert_eq!(vars.subst("$NOPE"), Err("NOPE".to_owned()));
    /// assert_eq!(vars.subst("${BUILD"), Err("{BUILD".to_owned()));
    /// ```
    pub fn subst(&self, text: &str) -> std::result::Result<String, String> {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            let name = match chars.peek() {
                Some('$') => {
                    chars.next();
                    out.push('$');
                    continue;
                }
                Some('{') => {
                    chars.next();
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break name,
                            Some(ch) => name.push(ch),
                            None => return Err(format!("{{{name}")),
                        }
                    }
                }
                _ => {
                    let mut name = String::new();
                    while let Some(&ch) = chars.peek() {
                        if ch.is_ascii_alphanumeric() || ch == '_' {
                            name.push(ch);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if name.is_empty() {
                        out.push('$');
                        continue;
                    }
                    name
                }
            };
            let value = self.0.get(&name).ok_or_else(|| name.clone())?;
            out.push_str(value);
        }
        Ok(out)
    }
}

/// A build directory mirrored from a source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    build_dir: Utf8PathBuf,
    src_dir: Utf8PathBuf,
}

impl Variant {
    /// Create a variant from project-relative directories.
    #[must_use]
    pub fn new(build_dir: &Utf8Path, src_dir: &Utf8Path) -> Self {
        Self {
            build_dir: normalize(build_dir),
            src_dir: normalize(src_dir),
        }
    }
}

impl From<&VariantSection> for Variant {
    fn from(section: &VariantSection) -> Self {
        Self::new(&section.build_dir, &section.src_dir)
    }
}

/// The project directory tree.
///
/// Paths handed out are relative to the project root (the root itself is
/// `.`); identifiers are interpreted relative to the current directory,
/// with a leading `#` meaning the project root.
#[derive(Debug, Clone)]
pub struct ProjectTree {
    root: Utf8PathBuf,
    cwd: Utf8PathBuf,
    variables: Variables,
    variants: Vec<Variant>,
}

impl ProjectTree {
    /// Create a tree rooted at `root` with the root as current directory.
    #[must_use]
    pub fn new(root: Utf8PathBuf, variables: Variables, variants: Vec<Variant>) -> Self {
        Self {
            root: normalize(&root),
            cwd: Utf8PathBuf::from("."),
            variables,
            variants,
        }
    }

    /// Change the current directory, given relative to the project root.
    #[must_use]
    pub fn with_cwd(mut self, cwd: &Utf8Path) -> Self {
        self.cwd = normalize(cwd);
        self
    }

    /// The absolute project root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The current directory relative to the project root.
    #[must_use]
    pub fn cwd(&self) -> &Utf8Path {
        &self.cwd
    }

    /// Turn a project-relative path into an absolute one.
    #[must_use]
    pub fn absolute(&self, path: &Utf8Path) -> Utf8PathBuf {
        normalize(&self.root.join(path))
    }

    /// Resolve a file identifier to a project-relative path.
    ///
    /// The file does not need to exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPath`] when the identifier is empty,
    /// references an undefined variable or escapes the project root.
    pub fn resolve_file(&self, id: &str) -> std::result::Result<Utf8PathBuf, ConfigError> {
        self.resolve(id).map_err(|reason| ConfigError::InvalidPath {
            id: id.to_owned(),
            reason,
        })
    }

    fn resolve(&self, id: &str) -> std::result::Result<Utf8PathBuf, String> {
        if id.trim().is_empty() {
            return Err("empty identifier".to_owned());
        }
        if id.contains('\0') {
            return Err("identifier contains a NUL byte".to_owned());
        }
        let expanded = self
            .variables
            .subst(id)
            .map_err(|name| format!("undefined variable ${name}"))?;

        let joined = match expanded.strip_prefix('#') {
            Some(top_relative) => Utf8PathBuf::from(top_relative.trim_start_matches(['/', '\\'])),
            None => self.cwd.join(&expanded),
        };
        let relative = if joined.is_absolute() {
            normalize(&joined)
                .strip_prefix(&self.root)
                .map(Utf8Path::to_owned)
                .map_err(|_| format!("{joined} is outside the project root {}", self.root))?
        } else {
            normalize(&joined)
        };
        if relative.starts_with("..") {
            return Err(format!("{expanded} escapes the project root"));
        }
        Ok(relative)
    }
}

impl DirectoryTree for ProjectTree {
    fn resolve_dir(&self, id: &str) -> std::result::Result<Utf8PathBuf, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidDirectory {
            id: id.to_owned(),
            reason,
        };
        let dir = self.resolve(id).map_err(invalid)?;
        let absolute = self.absolute(&dir);
        if absolute.exists() && !absolute.is_dir() {
            return Err(invalid(format!("{dir} is not a directory")));
        }
        Ok(dir)
    }

    fn mirror_of(&self, dir: &Utf8Path) -> Utf8PathBuf {
        let to_source = self
            .variants
            .iter()
            .find_map(|variant| relocate(dir, &variant.build_dir, &variant.src_dir));
        to_source
            .or_else(|| {
                self.variants
                    .iter()
                    .find_map(|variant| relocate(dir, &variant.src_dir, &variant.build_dir))
            })
            .unwrap_or_else(|| dir.to_owned())
    }
}

/// Move `dir` from below `from` to the same place below `to`.
fn relocate(dir: &Utf8Path, from: &Utf8Path, to: &Utf8Path) -> Option<Utf8PathBuf> {
    // Normalised relative paths only carry `.` when they are the root itself.
    let rest = if from.as_str() == "." {
        dir
    } else {
        dir.strip_prefix(from).ok()?
    };
    Some(normalize(&to.join(rest)))
}

/// Alias names and the targets they build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasRegistry {
    aliases: BTreeMap<String, Vec<Utf8PathBuf>>,
}

impl AliasRegistry {
    /// Register `targets` under `alias`. Empty aliases are ignored, and a
    /// target is recorded at most once per alias.
    pub fn register<I>(&mut self, alias: &str, targets: I)
    where
        I: IntoIterator<Item = Utf8PathBuf>,
    {
        if alias.is_empty() {
            return;
        }
        let entry = self.aliases.entry(alias.to_owned()).or_default();
        for target in targets {
            if !entry.contains(&target) {
                entry.push(target);
            }
        }
    }

    /// Return the targets registered under `alias`.
    #[must_use]
    pub fn targets(&self, alias: &str) -> Option<&[Utf8PathBuf]> {
        self.aliases.get(alias).map(Vec::as_slice)
    }

    /// Iterate over aliases in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Utf8PathBuf])> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// External TeX programs texpack drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tool {
    /// `latex`, producing DVI.
    Latex,
    /// `pdflatex`, producing PDF.
    PdfLatex,
    /// `dvipdfm`, converting DVI to PDF.
    DviPdfm,
    /// `kpsewhich`, searching the TeX Directory Structure.
    Kpsewhich,
}

impl Tool {
    /// Every tool, in probing order.
    pub const ALL: [Self; 4] = [Self::Latex, Self::PdfLatex, Self::DviPdfm, Self::Kpsewhich];

    /// Construction variable overriding the program name.
    #[must_use]
    pub const fn variable(self) -> &'static str {
        match self {
            Self::Latex => "LATEX",
            Self::PdfLatex => "PDFLATEX",
            Self::DviPdfm => "DVIPDFM",
            Self::Kpsewhich => "KPSEWHICH",
        }
    }

    /// Program run when the variable is unset.
    #[must_use]
    pub const fn default_program(self) -> &'static str {
        match self {
            Self::Latex => "latex",
            Self::PdfLatex => "pdflatex",
            Self::DviPdfm => "dvipdfm",
            Self::Kpsewhich => "kpsewhich",
        }
    }
}

/// Tools found to be runnable by the registration probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSet {
    available: BTreeSet<Tool>,
}

impl ToolSet {
    /// Create a tool set from known-available tools.
    #[must_use]
    pub fn new<I: IntoIterator<Item = Tool>>(tools: I) -> Self {
        Self {
            available: tools.into_iter().collect(),
        }
    }

    /// Returns `true` if `tool` answered the probe.
    #[must_use]
    pub fn contains(&self, tool: Tool) -> bool {
        self.available.contains(&tool)
    }
}

/// Everything a builder needs to know about the project.
#[derive(Debug)]
pub struct BuildEnv {
    tree: ProjectTree,
    aliases: AliasRegistry,
    tools: OnceCell<ToolSet>,
}

impl BuildEnv {
    /// Create an environment over `tree`.
    #[must_use]
    pub fn new(tree: ProjectTree) -> Self {
        Self {
            tree,
            aliases: AliasRegistry::default(),
            tools: OnceCell::new(),
        }
    }

    /// Create an environment for the project at `root` described by
    /// `manifest`.
    #[must_use]
    pub fn from_manifest(root: Utf8PathBuf, manifest: &Manifest) -> Self {
        let variants = manifest.variants.iter().map(Variant::from).collect();
        let variables = Variables::new(manifest.variables.clone());
        Self::new(ProjectTree::new(root, variables, variants))
    }

    /// The project tree.
    #[must_use]
    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    /// The current directory relative to the project root.
    #[must_use]
    pub fn cwd(&self) -> &Utf8Path {
        self.tree.cwd()
    }

    /// Turn a project-relative path into an absolute one.
    #[must_use]
    pub fn absolute(&self, path: &Utf8Path) -> Utf8PathBuf {
        self.tree.absolute(path)
    }

    /// Look up a construction variable; empty values count as unset.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.tree.variables.get(name)
    }

    /// Substitute construction variables in a free-form value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPath`] naming the undefined variable.
    pub fn subst(&self, text: &str) -> std::result::Result<String, ConfigError> {
        self.tree
            .variables
            .subst(text)
            .map_err(|name| ConfigError::InvalidPath {
                id: text.to_owned(),
                reason: format!("undefined variable ${name}"),
            })
    }

    /// The program name configured for `tool`.
    #[must_use]
    pub fn program(&self, tool: Tool) -> &str {
        self.variable(tool.variable())
            .unwrap_or_else(|| tool.default_program())
    }

    /// Register `targets` under `alias`.
    pub fn register_alias<I>(&mut self, alias: &str, targets: I)
    where
        I: IntoIterator<Item = Utf8PathBuf>,
    {
        self.aliases.register(alias, targets);
    }

    /// The alias registry.
    #[must_use]
    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    /// Probe the available tools once per environment.
    ///
    /// The first call runs `<program> --version` for every [`Tool`] through
    /// `executor`; later calls return the cached result.
    pub fn tools(&self, executor: &dyn CommandExecutor) -> &ToolSet {
        self.tools.get_or_init(|| {
            let root = self.tree.root();
            let available = Tool::ALL.into_iter().filter(|&tool| {
                let program = self.program(tool);
                let found = executor
                    .run(program, &["--version".to_owned()], root)
                    .is_ok_and(|output| output.status.success());
                debug!("probe {program}: {}", if found { "found" } else { "missing" });
                found
            });
            let tools = ToolSet::new(available);
            info!("registered TeX tools: {:?}", tools.available);
            tools
        })
    }

    /// Fail unless `tool` is available, returning its program name.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ToolUnavailable`] when the probe did not find
    /// the program.
    pub fn require(&self, executor: &dyn CommandExecutor, tool: Tool) -> Result<String> {
        let program = self.program(tool).to_owned();
        if self.tools(executor).contains(tool) {
            Ok(program)
        } else {
            Err(BuildError::ToolUnavailable {
                program,
                variable: tool.variable(),
            })
        }
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
