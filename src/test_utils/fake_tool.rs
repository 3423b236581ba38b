use dashmap::DashMap;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::{ModepError, Result};
use crate::tool::DepTool;
use crate::unit::Kind;

/// A [`DepTool`] returning canned output.
///
/// Files without a script get `<basename>:`, i.e. no dependencies. Every
/// call is counted per source path so tests can check that the tool ran at
/// most once for each file.
#[derive(Debug, Default)]
pub struct FakeDepTool {
    outputs: HashMap<PathBuf, Result<String>>,
    calls: DashMap<PathBuf, usize>,
}

impl FakeDepTool {
    /// A tool with no scripted files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the output for `source`.
    #[must_use]
    pub fn output(mut self, source: impl Into<PathBuf>, output: impl Into<String>) -> Self {
        self.outputs.insert(source.into(), Ok(output.into()));
        self
    }

    /// Make the tool fail for `source`.
    #[must_use]
    pub fn failure(mut self, source: impl Into<PathBuf>, error: ModepError) -> Self {
        self.outputs.insert(source.into(), Err(error));
        self
    }

    /// How often the tool ran on `source`.
    #[must_use]
    pub fn calls(&self, source: &Path) -> usize {
        self.calls.get(source).map_or(0, |count| *count)
    }

    /// How often the tool ran in total.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }
}

impl DepTool for FakeDepTool {
    fn extract<'a>(&'a self, _kind: Kind, source: &'a Path) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            *self.calls.entry(source.to_path_buf()).or_insert(0) += 1;
            // Give concurrent requests a chance to pile up on the same build.
            tokio::task::yield_now().await;

            match self.outputs.get(source) {
                Some(scripted) => scripted.clone(),
                None => {
                    let name = source.file_name().map(|n| n.to_string_lossy().to_string());
                    Ok(format!("{}:", name.unwrap_or_default()))
                }
            }
        })
    }
}
