//! Shared helpers for the integration tests.

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Shell script standing in for the dependency-extraction tool.
///
/// It prints `<basename>: <first line of the file>`, so each test source
/// declares its own dependencies on its first line.
#[cfg(unix)]
const TOOL_SCRIPT: &str = r#"#!/bin/sh
for src; do :; done
printf '%s: %s\n' "$(basename "$src")" "$(head -n 1 "$src")"
"#;

/// A directory of sources plus a `modep.toml` pointing at the script tool.
pub struct TestProject {
    _temp: TempDir,
    pub dir: PathBuf,
    pub tool: PathBuf,
}

impl TestProject {
    /// Create the project with the script tool and a default `modep.toml`.
    #[cfg(unix)]
    pub fn new() -> Result<Self> {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new()?;
        let dir = temp.path().join("src");
        fs::create_dir_all(&dir)?;

        let tool = temp.path().join("fakedep.sh");
        fs::write(&tool, TOOL_SCRIPT)?;
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755))?;

        let project = Self {
            _temp: temp,
            dir,
            tool,
        };
        project.write_config("")?;
        Ok(project)
    }

    /// Write `modep.toml` with the tool section plus `extra`.
    pub fn write_config(&self, extra: &str) -> Result<()> {
        let content = format!(
            "{extra}\n[tool]\nprogram = \"{}\"\ntimeout_secs = 10\n",
            self.tool.display()
        );
        let path = self.dir.join("modep.toml");
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Write a source file whose first line lists its dependencies.
    pub fn source(&self, file: &str, deps: &str) -> Result<&Self> {
        fs::write(self.dir.join(file), format!("{deps}\n"))?;
        Ok(self)
    }

    /// Path of `file` inside the source directory.
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// A `modep` command running in the project's parent directory.
    pub fn modep_command(&self) -> Command {
        let mut cmd = Command::cargo_bin("modep").expect("modep binary not built");
        cmd.current_dir(self.dir.parent().unwrap_or(Path::new("."))).env("NO_COLOR", "1");
        cmd.env_remove("MODEP_CONFIG").env_remove("RUST_LOG");
        cmd
    }
}
