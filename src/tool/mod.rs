//! The external dependency-extraction tool.
//!
//! [`DepTool`] is the seam between the resolver and whatever produces raw
//! dependency output. [`CommandDepTool`] runs a real program through
//! [`ToolCommand`]; tests substitute a scripted implementation.

pub mod command_builder;

pub use command_builder::{ToolCommand, ToolOutput};

use futures::future::BoxFuture;
use std::path::Path;

use crate::config::ToolConfig;
use crate::core::Result;
use crate::unit::Kind;

/// Produces the raw dependency output for one source file.
///
/// Implementations return the tool's standard output verbatim; validation is
/// the parser's job.
pub trait DepTool: Send + Sync {
    /// Analyze `source` as a unit part of the given kind.
    fn extract<'a>(&'a self, kind: Kind, source: &'a Path) -> BoxFuture<'a, Result<String>>;
}

/// Runs the configured program as `<program> <args...> <kind-flag> <source>`.
#[derive(Debug, Clone)]
pub struct CommandDepTool {
    config: ToolConfig,
}

impl CommandDepTool {
    /// Create a tool runner from configuration.
    #[must_use]
    pub const fn new(config: ToolConfig) -> Self {
        Self {
            config,
        }
    }

    /// The command that would analyze `source`.
    #[must_use]
    pub fn command(&self, kind: Kind, source: &Path) -> ToolCommand {
        ToolCommand::new(&self.config.program)
            .args(self.config.args.iter().cloned())
            .arg(self.config.kind_flag(kind))
            .arg(source.display().to_string())
            .with_timeout(self.config.timeout())
            .with_context(source.display().to_string())
    }
}

impl DepTool for CommandDepTool {
    fn extract<'a>(&'a self, kind: Kind, source: &'a Path) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let output = self.command(kind, source).execute().await?;
            Ok(output.stdout)
        })
    }
}
