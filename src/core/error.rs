//! Error handling for modep
//!
//! This module provides the error type shared by every layer of the dependency
//! analysis and the user-facing reporting used by the CLI. The design follows
//! two rules:
//! 1. **Strongly-typed errors** so callers can tell user mistakes from bugs
//! 2. **User-friendly messages** with details and suggestions for the terminal
//!
//! # Architecture
//!
//! - [`ModepError`] - one variant per failure mode of the analysis
//! - [`ErrorContext`] - wrapper that adds details and suggestions for display
//! - [`user_friendly_error`] - converts any [`anyhow::Error`] into an [`ErrorContext`]
//!
//! # Error Categories
//!
//! - **Tool output**: [`ModepError::MalformedOutput`], [`ModepError::UnresolvedDependency`]
//! - **Structure**: [`ModepError::InvertedLibraryDependency`], [`ModepError::CircularDependency`]
//! - **Internal consistency**: [`ModepError::UnitNotInScope`]
//! - **Tool execution**: [`ModepError::ToolNotFound`], [`ModepError::ToolFailed`],
//!   [`ModepError::ToolTimeout`]
//! - **File system and configuration**: [`ModepError::FileSystemError`],
//!   [`ModepError::ArtifactMissing`], [`ModepError::ConfigError`]
//!
//! [`ModepError`] is `Clone` because a single failure is observed by every task
//! that awaits the same shared dependency computation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use modep_cli::core::{ModepError, user_friendly_error};
//!
//! let error = ModepError::CircularDependency {
//!     dir: "src".to_string(),
//!     chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for modep operations.
///
/// None of these errors are recovered locally: each one terminates the
/// current analysis with a diagnostic. [`ModepError::is_internal`] tells the
/// caller whether the failure is a bug in the caller (an inconsistent scope)
/// rather than something the user can fix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModepError {
    /// The dependency-extraction tool produced output that does not have the
    /// expected `<basename>: <names>` single-line shape, or that names a
    /// different source file.
    #[error("dependency tool returned unexpected output for {file}:\n{}", quote_lines(.lines))]
    MalformedOutput {
        /// Source file the tool was run on
        file: String,
        /// Raw output lines, verbatim
        lines: Vec<String>,
    },

    /// A unit depends on the library-interface unit.
    ///
    /// The library-interface unit is the only unit exposed outside the unit
    /// set, so it must depend on the others and never the reverse.
    #[error(
        "Unit {unit} in directory {dir} depends on {library_interface}.\n\
         This doesn't make sense: {library_interface} is the library interface unit and \
         the only unit exposed outside of the unit set. It should be the one depending \
         on all the other units, not be depended upon."
    )]
    InvertedLibraryDependency {
        /// Unit whose dependency list contains the library-interface unit
        unit: String,
        /// Name of the library-interface unit
        library_interface: String,
        /// Directory of the scope
        dir: String,
    },

    /// The dependency relation contains a cycle.
    #[error("dependency cycle between units in {dir}:\n{}", arrow_chain(.chain))]
    CircularDependency {
        /// Directory of the scope
        dir: String,
        /// Unit names in traversal order; the first name closes the cycle at the end
        chain: Vec<String>,
    },

    /// A unit was looked up in a graph whose scope does not contain it.
    ///
    /// This signals a bug in the caller, not a user error.
    #[error(
        "internal error: unit {unit} is not part of the dependency graph for {dir} \
         (known units: {})",
        .known.join(", ")
    )]
    UnitNotInScope {
        /// Name that was looked up
        unit: String,
        /// Directory of the scope
        dir: String,
        /// Every unit name the graph knows about
        known: Vec<String>,
    },

    /// Strict mode found a dependency name that is not a unit of the scope.
    #[error("unit {unit} depends on {name}, which is not a unit of {dir}")]
    UnresolvedDependency {
        /// Unit being analyzed
        unit: String,
        /// Token that did not resolve
        name: String,
        /// Directory of the scope
        dir: String,
    },

    /// The dependency-extraction tool is not installed or not in PATH.
    #[error("dependency tool '{program}' not found in PATH")]
    ToolNotFound {
        /// Program that was looked up
        program: String,
    },

    /// The dependency-extraction tool exited with a failure status.
    #[error("dependency tool failed on {file}: {stderr}")]
    ToolFailed {
        /// Source file the tool was run on
        file: String,
        /// Exit code, when the process was not killed by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// The dependency-extraction tool did not finish in time.
    #[error("dependency tool timed out after {seconds}s on {file}")]
    ToolTimeout {
        /// Source file the tool was run on
        file: String,
        /// Configured timeout
        seconds: u64,
    },

    /// Reading or writing an artifact failed.
    #[error("File system error: {operation} {path}: {reason}")]
    FileSystemError {
        /// What was being done ("reading", "writing", ...)
        operation: String,
        /// Path involved
        path: String,
        /// Underlying I/O error message
        reason: String,
    },

    /// A file was required but neither exists nor has a registered producer.
    #[error("no rule to produce {path} and the file does not exist")]
    ArtifactMissing {
        /// Required path
        path: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Anything else
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl ModepError {
    /// Returns `true` for errors that indicate a bug in the caller rather
    /// than a problem the user can fix.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::UnitNotInScope { .. })
    }

    /// Builds a [`ModepError::FileSystemError`] from an I/O error.
    pub fn fs(operation: &str, path: &std::path::Path, source: &std::io::Error) -> Self {
        Self::FileSystemError {
            operation: operation.to_string(),
            path: path.display().to_string(),
            reason: source.to_string(),
        }
    }
}

fn quote_lines(lines: &[String]) -> String {
    lines.iter().map(|line| format!("> {line}")).collect::<Vec<_>>().join("\n")
}

fn arrow_chain(chain: &[String]) -> String {
    chain.iter().map(|name| format!("   -> {name}")).collect::<Vec<_>>().join("\n")
}

/// Error context wrapper that provides user-friendly error information.
///
/// Carries the underlying [`ModepError`] plus optional details (why it
/// happened) and a suggestion (what to do about it).
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ModepError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no details or suggestion.
    #[must_use]
    pub const fn new(error: ModepError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`].
///
/// Recognizes [`ModepError`] (anywhere in the `anyhow` chain) and
/// [`std::io::Error`]; everything else is wrapped as [`ModepError::Other`]
/// with the full context chain preserved in the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(modep_error) = error.chain().find_map(|e| e.downcast_ref::<ModepError>()) {
        return create_error_context(modep_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return ErrorContext::new(ModepError::Other {
            message: io_error.to_string(),
        })
        .with_suggestion("Check that the directory exists and is readable");
    }

    ErrorContext::new(ModepError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: ModepError) -> ErrorContext {
    match &error {
        ModepError::MalformedOutput { .. } => ErrorContext::new(error)
            .with_details("The tool must print exactly one line of the form '<file>: <names>' for the file it was given")
            .with_suggestion("Check the [tool] section of modep.toml; the configured program or flags may be wrong"),
        ModepError::InvertedLibraryDependency { library_interface, .. } => {
            let library_interface = library_interface.clone();
            ErrorContext::new(error).with_suggestion(format!(
                "Move the shared code out of {library_interface} into a separate unit and depend on that instead"
            ))
        }
        ModepError::CircularDependency { .. } => ErrorContext::new(error)
            .with_suggestion("Break the cycle by moving the shared definitions into a new unit"),
        ModepError::UnitNotInScope { .. } => ErrorContext::new(error)
            .with_details("This is a bug in modep or in the tool driving it, not in your sources"),
        ModepError::UnresolvedDependency { .. } => ErrorContext::new(error)
            .with_suggestion("Add the missing unit, or set 'strict = false' in modep.toml to ignore names from outside the directory"),
        ModepError::ToolNotFound { program } => {
            let program = program.clone();
            ErrorContext::new(error).with_suggestion(format!(
                "Install {program} or point [tool].program in modep.toml at the right executable"
            ))
        }
        ModepError::ToolTimeout { .. } => ErrorContext::new(error)
            .with_suggestion("Increase [tool].timeout_secs in modep.toml"),
        _ => ErrorContext::new(error),
    }
}
