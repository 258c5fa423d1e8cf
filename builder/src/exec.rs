//! External program execution.
//!
//! TeX engines and `kpsewhich` are run through [`CommandExecutor`] so that
//! builders can be exercised without a TeX installation.

use crate::error::{BuildError, Result};
use camino::Utf8Path;
use log::debug;
use std::process::{Command, Output};

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs `program` with `args` inside `cwd` and returns the captured
    /// output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the
    /// command. A non-zero exit status is not an error at this level.
    fn run(&self, program: &str, args: &[String], cwd: &Utf8Path) -> Result<Output>;
}

/// Executes commands on the host system.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use texpack_builder::exec::{CommandExecutor, SystemCommandExecutor};
///
/// let executor = SystemCommandExecutor;
/// let output = executor.run("kpsewhich", &["--version".to_owned()], Utf8Path::new("."))?;
/// assert!(output.status.success());
/// # Ok::<(), texpack_builder::error::BuildError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &str, args: &[String], cwd: &Utf8Path) -> Result<Output> {
        debug!("running {program} {} in {cwd}", args.join(" "));
        Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(BuildError::from)
    }
}

/// Run a command and fail unless it exits successfully.
///
/// # Errors
///
/// Returns [`BuildError::CommandFailed`] with the exit status and the tail
/// of the program's output when it exits unsuccessfully, or the executor's
/// own error when it cannot be run.
pub fn run_checked(
    executor: &dyn CommandExecutor,
    program: &str,
    args: &[String],
    cwd: &Utf8Path,
) -> Result<Output> {
    let output = executor.run(program, args, cwd)?;
    if output.status.success() {
        return Ok(output);
    }
    Err(BuildError::CommandFailed {
        program: program.to_owned(),
        message: failure_message(&output),
    })
}

/// Number of trailing output lines quoted in failure messages.
const TAIL_LINES: usize = 5;

fn failure_message(output: &Output) -> String {
    // TeX engines report errors on stdout, so fall back to it.
    let stream = if output.stderr.is_empty() {
        &output.stdout
    } else {
        &output.stderr
    };
    let text = String::from_utf8_lossy(stream);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let tail = lines
        .get(lines.len().saturating_sub(TAIL_LINES)..)
        .unwrap_or_default()
        .join("\n");
    if tail.is_empty() {
        output.status.to_string()
    } else {
        format!("{}: {tail}", output.status)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use stub::{StubExecutor, StubInvocation, StubOutput};

#[cfg(any(test, feature = "test-support"))]
mod stub {
    use super::CommandExecutor;
    use crate::error::{BuildError, Result};
    use camino::{Utf8Path, Utf8PathBuf};
    use std::cell::RefCell;
    use std::process::{ExitStatus, Output};

    /// Canned output returned by [`StubExecutor`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StubOutput {
        /// Whether the command reports success.
        pub success: bool,
        /// Captured standard output.
        pub stdout: String,
    }

    impl StubOutput {
        /// A successful invocation printing `stdout`.
        #[must_use]
        pub fn ok(stdout: impl Into<String>) -> Self {
            Self {
                success: true,
                stdout: stdout.into(),
            }
        }

        /// A failed invocation.
        #[must_use]
        pub fn failed() -> Self {
            Self {
                success: false,
                stdout: String::new(),
            }
        }
    }

    /// A recorded invocation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StubInvocation {
        /// Program name.
        pub program: String,
        /// Arguments passed to the program.
        pub args: Vec<String>,
        /// Working directory.
        pub cwd: Utf8PathBuf,
    }

    #[derive(Debug)]
    struct Rule {
        program: String,
        fragment: String,
        output: StubOutput,
    }

    /// Executor answering invocations from a list of rules.
    ///
    /// A rule matches when the program name is equal and any argument
    /// contains its fragment (an empty fragment matches any arguments).
    /// Rules are tried in the order they were added.
    #[derive(Debug, Default)]
    pub struct StubExecutor {
        rules: Vec<Rule>,
        calls: RefCell<Vec<StubInvocation>>,
    }

    impl StubExecutor {
        /// Create a stub with no rules.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a rule answering `program` when an argument contains
        /// `fragment`.
        #[must_use]
        pub fn with_response(mut self, program: &str, fragment: &str, output: StubOutput) -> Self {
            self.rules.push(Rule {
                program: program.to_owned(),
                fragment: fragment.to_owned(),
                output,
            });
            self
        }

        /// Return every invocation received so far.
        #[must_use]
        pub fn calls(&self) -> Vec<StubInvocation> {
            self.calls.borrow().clone()
        }
    }

    impl CommandExecutor for StubExecutor {
        fn run(&self, program: &str, args: &[String], cwd: &Utf8Path) -> Result<Output> {
            self.calls.borrow_mut().push(StubInvocation {
                program: program.to_owned(),
                args: args.to_vec(),
                cwd: cwd.to_owned(),
            });
            let rule = self.rules.iter().find(|rule| {
                rule.program == program
                    && (rule.fragment.is_empty() || args.iter().any(|a| a.contains(&rule.fragment)))
            });
            let Some(rule) = rule else {
                return Err(BuildError::StubMismatch {
                    message: format!("no response for {program} {}", args.join(" ")),
                });
            };
            Ok(Output {
                status: exit_status(rule.output.success),
                stdout: rule.output.stdout.clone().into_bytes(),
                stderr: Vec::new(),
            })
        }
    }

    #[cfg(unix)]
    fn exit_status(success: bool) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;

        ExitStatus::from_raw(if success { 0 } else { 1 << 8 })
    }

    #[cfg(windows)]
    fn exit_status(success: bool) -> ExitStatus {
        use std::os::windows::process::ExitStatusExt;

        ExitStatus::from_raw(u32::from(!success))
    }
}
