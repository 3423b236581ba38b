//! Configuration for modep.
//!
//! Configuration lives in a `modep.toml` file next to the sources being
//! analyzed. Every field has a default, so a missing file is the same as an
//! empty one.
//!
//! ```toml
//! strict = false
//!
//! [tool]
//! program = "ocamldep"
//! args = ["-modules"]
//! interface_flag = "-intf"
//! implementation_flag = "-impl"
//! timeout_secs = 60
//!
//! [units]
//! interface_extension = "mli"
//! implementation_extension = "ml"
//! alias = "mylib__"
//! library_interface = "mylib"
//! ```
//!
//! # Location
//!
//! 1. An explicit path (`--config` on the command line)
//! 2. The `MODEP_CONFIG` environment variable
//! 3. `<dir>/modep.toml`
//! 4. Defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::{CONFIG_ENV_VAR, CONFIG_FILE_NAME, DEFAULT_TOOL_TIMEOUT};
use crate::unit::Kind;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModepConfig {
    /// Dependency-extraction tool settings.
    pub tool: ToolConfig,

    /// How units are discovered and which ones play special roles.
    pub units: UnitsConfig,

    /// Treat dependency names that are not units of the directory as errors
    /// instead of silently dropping them.
    pub strict: bool,
}

/// How to run the dependency-extraction tool.
///
/// The tool is invoked as `<program> <args...> <kind-flag> <source>` and must
/// print `<source-basename>: <names>` on a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Program to run, looked up in `PATH` unless it contains a separator.
    pub program: String,

    /// Extra arguments placed before the kind flag. The default `-modules`
    /// makes `ocamldep` print the single `<file>: <Module> ...` line.
    pub args: Vec<String>,

    /// Flag selecting interface analysis.
    pub interface_flag: String,

    /// Flag selecting implementation analysis.
    pub implementation_flag: String,

    /// Seconds before a single tool run is abandoned. `0` disables the timeout.
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "ocamldep".to_string(),
            args: vec!["-modules".to_string()],
            interface_flag: "-intf".to_string(),
            implementation_flag: "-impl".to_string(),
            timeout_secs: DEFAULT_TOOL_TIMEOUT.as_secs(),
        }
    }
}

impl ToolConfig {
    /// Flag passed to the tool for the given kind.
    #[must_use]
    pub fn kind_flag(&self, kind: Kind) -> &str {
        match kind {
            Kind::Interface => &self.interface_flag,
            Kind::Implementation => &self.implementation_flag,
        }
    }

    /// Timeout for one run, `None` when disabled.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

/// Unit discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitsConfig {
    /// Extension of interface files, without the dot.
    pub interface_extension: String,

    /// Extension of implementation files, without the dot.
    pub implementation_extension: String,

    /// Name of the alias (re-export) unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Name of the library-interface unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_interface: Option<String>,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            interface_extension: "mli".to_string(),
            implementation_extension: "ml".to_string(),
            alias: None,
            library_interface: None,
        }
    }
}

impl ModepConfig {
    /// Load the configuration that applies to `dir`.
    ///
    /// `explicit` wins over `MODEP_CONFIG`, which wins over `<dir>/modep.toml`.
    /// An explicit or environment path must exist; the per-directory file is
    /// optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be read or
    /// parsed, or if an explicitly named file does not exist.
    pub async fn load_for(dir: &Path, explicit: Option<PathBuf>) -> Result<Self> {
        let named = explicit.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
        if let Some(path) = named {
            return Self::load_from(&path).await;
        }

        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this schema.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save the configuration as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
