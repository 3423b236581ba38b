//! File system helpers for build artifacts.
//!
//! Artifacts are small text files written next to the sources they describe.
//! Writes go through [`atomic_write`] so a reader never sees a half-written
//! `.d` or `.all-deps` file, even when a build is interrupted.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use crate::constants::{ALL_DEPS_SUFFIX, RAW_DEPS_SUFFIX};
use crate::core::{ModepError, Result};

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// The content goes to `<path>.tmp` first, is synced to disk, and is then
/// renamed over the target. Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`ModepError::FileSystemError`] naming the step that failed.
pub async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ModepError::fs("creating directory", parent, &e))?;
    }

    // Appended rather than replacing the extension: `foo.ml.d` and
    // `foo.ml.all-deps` must not share a temp file.
    let mut temp: OsString = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp_path = PathBuf::from(temp);

    {
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| ModepError::fs("creating temp file", &temp_path, &e))?;
        file.write_all(content)
            .await
            .map_err(|e| ModepError::fs("writing", &temp_path, &e))?;
        file.sync_all().await.map_err(|e| ModepError::fs("syncing", &temp_path, &e))?;
    }

    fs::rename(&temp_path, path).await.map_err(|e| ModepError::fs("renaming", path, &e))?;
    Ok(())
}

/// Reads a text file and splits it into lines.
///
/// Line terminators are stripped; an empty file yields no lines.
///
/// # Errors
///
/// Returns [`ModepError::FileSystemError`] if the file cannot be read.
pub async fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).await.map_err(|e| ModepError::fs("reading", path, &e))?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Whether `path` names a dependency artifact.
#[must_use]
pub fn is_artifact(path: &Path) -> bool {
    path.file_name().and_then(|name| name.to_str()).is_some_and(|name| {
        name.ends_with(RAW_DEPS_SUFFIX) || name.ends_with(ALL_DEPS_SUFFIX)
    })
}

/// Removes every dependency artifact directly inside `dir`.
///
/// Subdirectories are left alone. Returns the removed paths in file-name
/// order.
///
/// # Errors
///
/// Returns [`ModepError::FileSystemError`] if the directory cannot be scanned
/// or an artifact cannot be removed.
pub async fn remove_artifacts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ModepError::FileSystemError {
            operation: "scanning".to_string(),
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() || !is_artifact(entry.path()) {
            continue;
        }
        fs::remove_file(entry.path())
            .await
            .map_err(|e| ModepError::fs("removing", entry.path(), &e))?;
        removed.push(entry.path().to_path_buf());
    }
    Ok(removed)
}
