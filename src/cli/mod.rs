//! Command-line interface for modep.
//!
//! # Commands
//!
//! - `order` - print a safe processing order for the units of a directory
//! - `deps` - print what one unit depends on
//! - `clean` - remove cached `.d` / `.all-deps` artifacts
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging
//! - `--quiet` / `-q` - errors only
//! - `--config` / `-c` - explicit `modep.toml` path
//!
//! Without `--verbose` or `--quiet`, `RUST_LOG` decides what is logged, and
//! warnings are shown when it is unset. Logs go to stderr so command output
//! stays machine-readable.
//!
//! # Examples
//!
//! ```bash
//! modep order src/
//! modep deps parser src/ --kind interface
//! modep --config build/modep.toml order src/ --format json
//! modep clean src/
//! ```

mod clean;
pub mod common;
mod deps;
mod order;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,

    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the global `tracing` subscriber.
    ///
    /// Safe to call more than once; only the first call installs anything.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    }
}

/// Compute inter-unit dependencies and build orders.
#[derive(Parser)]
#[command(
    name = "modep",
    about = "Module dependency analysis for incremental builds",
    version,
    author,
    long_about = "modep runs a dependency-extraction tool over the compilation units of a \
                  directory, caches what it finds next to the sources, and prints the order \
                  in which the units can be processed."
)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file (overrides MODEP_CONFIG and <dir>/modep.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a safe processing order for the units of a directory
    Order(order::OrderCommand),

    /// Print the units one unit depends on
    Deps(deps::DepsCommand),

    /// Remove cached dependency artifacts
    Clean(clean::CleanCommand),
}

impl Cli {
    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Returns whatever the command fails with; the binary turns it into a
    /// user-facing message.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Derive the runtime settings from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute the command with explicit settings, without touching logging.
    ///
    /// # Errors
    ///
    /// Returns whatever the command fails with.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Order(cmd) => cmd.execute(config.config_path).await,
            Commands::Deps(cmd) => cmd.execute(config.config_path).await,
            Commands::Clean(cmd) => cmd.execute().await,
        }
    }
}
