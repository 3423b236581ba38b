//! Setup shared by the analysis commands.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::build::BuildContext;
use crate::config::ModepConfig;
use crate::graph::GraphPair;
use crate::tool::CommandDepTool;
use crate::unit::{Kind, Scope, Unit};

/// `--kind` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Interface parts (`.mli`)
    Interface,
    /// Implementation parts (`.ml`)
    Implementation,
}

impl From<KindArg> for Kind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Interface => Self::Interface,
            KindArg::Implementation => Self::Implementation,
        }
    }
}

/// `--format` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One unit name per line
    #[default]
    Text,
    /// A JSON document
    Json,
}

/// A directory ready to be analyzed: its configuration, units and graphs.
#[derive(Debug)]
pub struct Analysis {
    /// Effective configuration
    pub config: ModepConfig,
    /// Units discovered in the directory
    pub scope: Arc<Scope>,
    /// Dependency graphs over all units
    pub pair: GraphPair,
}

impl Analysis {
    /// Load configuration for `dir`, discover its units and set up the graphs.
    ///
    /// No tool runs yet.
    pub async fn load(dir: &Path, config_path: Option<PathBuf>) -> Result<Self> {
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }

        let config = ModepConfig::load_for(dir, config_path).await?;
        let scope = Scope::discover(dir, &config.units, config.strict)
            .with_context(|| format!("Failed to discover units in {}", dir.display()))?;
        let scope = Arc::new(scope);

        tracing::debug!("Analyzing {} units in {}", scope.len(), dir.display());

        let tool = Arc::new(CommandDepTool::new(config.tool.clone()));
        let pair = GraphPair::new(BuildContext::new(), tool, Arc::clone(&scope), HashSet::new());

        Ok(Self {
            config,
            scope,
            pair,
        })
    }

    /// Every unit, in name order.
    #[must_use]
    pub fn units(&self) -> Vec<Arc<Unit>> {
        self.scope.units().cloned().collect()
    }
}

/// Resolve the directory argument, defaulting to the current directory.
#[must_use]
pub fn target_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| PathBuf::from("."))
}

/// The known name closest to `name`, if any is reasonably close. Case is
/// ignored, so a file stem finds its module name.
#[must_use]
pub fn closest_name<'a>(name: &str, known: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let name = name.to_lowercase();
    known
        .into_iter()
        .map(|candidate| (candidate, strsim::jaro_winkler(&name, &candidate.to_lowercase())))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_name() {
        let known = ["parser", "lexer", "typing"];
        assert_eq!(closest_name("parsr", known), Some("parser"));
        assert_eq!(closest_name("Lexer", known), Some("lexer"));
        assert_eq!(closest_name("zzz", known), None);
        assert_eq!(closest_name("parsr", ["Parser", "Lexer"]), Some("Parser"));
    }

    #[tokio::test]
    async fn test_load_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = Analysis::load(&dir.path().join("missing"), None).await.unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[tokio::test]
    async fn test_load_discovers_units() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ml"), "").unwrap();
        std::fs::write(dir.path().join("b.mli"), "").unwrap();

        let analysis = Analysis::load(dir.path(), None).await.unwrap();
        let names: Vec<_> = analysis.units().iter().map(|u| u.name().to_string()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(analysis.config.tool.program, "ocamldep");
    }
}
