//! Remove cached dependency artifacts.
//!
//! Deletes the `.d` and `.all-deps` files next to the sources of a directory
//! so the next `order` or `deps` run starts from scratch.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::target_dir;
use crate::build::BuildContext;

/// Arguments of `modep clean`.
#[derive(Debug, Args)]
pub struct CleanCommand {
    /// Directory to clean (defaults to the current directory)
    dir: Option<PathBuf>,
}

impl CleanCommand {
    /// Remove the artifacts and report how many were deleted.
    pub async fn execute(self) -> Result<()> {
        let dir = target_dir(self.dir);
        let removed = BuildContext::clean(&dir).await?;

        for path in &removed {
            tracing::debug!("Removed {}", path.display());
        }
        println!("{} Removed {} artifacts from {}", "✓".green(), removed.len(), dir.display());
        Ok(())
    }
}
