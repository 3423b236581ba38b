//! Constants used across modep.
//!
//! Artifact naming and default tool settings live here so the resolver, the
//! build context and the `clean` command agree on them.

use std::time::Duration;

/// Suffix appended to a source path for the raw tool output artifact.
pub const RAW_DEPS_SUFFIX: &str = ".d";

/// Suffix appended to a source path for the resolved cache artifact.
pub const ALL_DEPS_SUFFIX: &str = ".all-deps";

/// Default name of the per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = "modep.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "MODEP_CONFIG";

/// Default timeout for one dependency tool run (60 seconds).
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Tool runs slower than this are logged at info level under `tool::perf`.
pub const SLOW_TOOL_THRESHOLD: Duration = Duration::from_secs(1);

/// Memo label for the implementation-only closure of a graph.
pub const IMPLEMENTATIONS_CLOSURE_LABEL: &str = "top_closed_implementations";
