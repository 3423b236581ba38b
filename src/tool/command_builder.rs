//! Builder for running the dependency-extraction tool as a subprocess.
//!
//! Mirrors the shape of a typical command wrapper: a fluent builder collects
//! the program, arguments and limits, and [`ToolCommand::execute`] runs it with
//! `tokio::process`, captures its output, and turns every failure mode into a
//! [`ModepError`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::{DEFAULT_TOOL_TIMEOUT, SLOW_TOOL_THRESHOLD};
use crate::core::{ModepError, Result};

/// Fluent builder for one tool invocation.
///
/// # Examples
///
/// ```rust,no_run
/// use modep_cli::tool::ToolCommand;
///
/// # async fn example() -> modep_cli::core::Result<()> {
/// let output = ToolCommand::new("ocamldep")
///     .args(["-modules", "-impl", "src/foo.ml"])
///     .with_context("src/foo.ml")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
///
/// New commands capture stdout and stderr, run in the current directory and
/// time out after [`DEFAULT_TOOL_TIMEOUT`].
#[derive(Debug, Clone)]
pub struct ToolCommand {
    /// Program name or path
    program: String,

    /// Arguments, in order
    args: Vec<String>,

    /// Working directory (defaults to the current directory)
    current_dir: Option<PathBuf>,

    /// Maximum duration to wait for completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// What the command is working on, used in logs and error messages
    context: Option<String>,
}

impl ToolCommand {
    /// Create a command for `program` with default settings.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout_duration: Some(DEFAULT_TOOL_TIMEOUT),
            context: None,
        }
    }

    /// Add one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command in `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set a custom timeout (None for no timeout).
    #[must_use]
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Label the command with what it works on (typically the source file).
    ///
    /// The label prefixes log lines and names the file in error messages.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn subject(&self) -> String {
        self.context.clone().unwrap_or_else(|| self.program.clone())
    }

    /// Locate the program, searching `PATH` for bare names.
    fn resolve_program(&self) -> Result<PathBuf> {
        if self.program.contains(std::path::MAIN_SEPARATOR) || self.program.contains('/') {
            return Ok(PathBuf::from(&self.program));
        }
        which::which(&self.program).map_err(|_| ModepError::ToolNotFound {
            program: self.program.clone(),
        })
    }

    /// Execute the command and return its captured output.
    ///
    /// # Errors
    ///
    /// - [`ModepError::ToolNotFound`] when the program cannot be located or spawned
    /// - [`ModepError::ToolTimeout`] when the timeout expires
    /// - [`ModepError::ToolFailed`] when the process exits unsuccessfully
    pub async fn execute(self) -> Result<ToolOutput> {
        let start = Instant::now();
        let program = self.resolve_program()?;
        let subject = self.subject();

        let mut cmd = Command::new(&program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(
            target: "tool",
            "({}) Executing command: {} {}",
            subject,
            program.display(),
            self.args.join(" ")
        );

        let spawn_error = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ModepError::ToolNotFound {
                    program: self.program.clone(),
                }
            } else {
                ModepError::ToolFailed {
                    file: subject.clone(),
                    code: None,
                    stderr: format!("failed to start {}: {e}", program.display()),
                }
            }
        };

        let output = if let Some(duration) = self.timeout_duration {
            match timeout(duration, cmd.output()).await {
                Ok(result) => result.map_err(spawn_error)?,
                Err(_) => {
                    tracing::warn!(
                        target: "tool",
                        "({}) Command timed out after {} seconds",
                        subject,
                        duration.as_secs()
                    );
                    return Err(ModepError::ToolTimeout {
                        file: subject,
                        seconds: duration.as_secs(),
                    });
                }
            }
        } else {
            cmd.output().await.map_err(spawn_error)?
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "tool",
                "({}) Command failed with exit code: {:?}",
                subject,
                output.status.code()
            );
            return Err(ModepError::ToolFailed {
                file: subject,
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        if !stderr.is_empty() {
            tracing::debug!(target: "tool", "({}) {}", subject, stderr.trim());
        }

        let elapsed = start.elapsed();
        if elapsed > SLOW_TOOL_THRESHOLD {
            tracing::info!(target: "tool::perf", "({}) took {:.2}s", subject, elapsed.as_secs_f64());
        } else {
            tracing::trace!(target: "tool::perf", "({}) took {}ms", subject, elapsed.as_millis());
        }

        Ok(ToolOutput {
            stdout,
            stderr,
        })
    }
}

/// Captured output of a successful tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Standard output, verbatim
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}
