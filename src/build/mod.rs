//! Memoizing, file-producing build context.
//!
//! The [`BuildContext`] is the "run this action to produce this file" layer
//! the resolver sits on. A rule is registered once per target path; the first
//! request for a target starts its rule and every later or concurrent request
//! shares the same [`Shared`] future, so each artifact is produced at most once
//! per build.
//!
//! A target with no rule is treated as an existing input file: building it
//! only checks that it is there.
//!
//! # Waiting on other artifacts
//!
//! Rules that need other artifacts go through [`BuildContext::depend_on`]
//! rather than awaiting [`BuildContext::build`] directly. The context records
//! who waits on whom and refuses a wait that would close a loop, reporting a
//! [`ModepError::CircularDependency`] built from the rule labels.
//!
//! ```rust,no_run
//! use modep_cli::build::BuildContext;
//! use std::path::PathBuf;
//!
//! # async fn example() -> modep_cli::core::Result<()> {
//! let ctx = BuildContext::new();
//! let target = PathBuf::from("lib/foo.ml.d");
//! ctx.register(target.clone(), "foo", |_ctx| {
//!     Box::pin(async move {
//!         modep_cli::utils::atomic_write(&PathBuf::from("lib/foo.ml.d"), b"foo.ml: bar\n").await
//!     })
//! });
//! let lines = ctx.lines_of(&target).await?;
//! # Ok(())
//! # }
//! ```

mod wait_graph;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared, try_join_all};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::{ModepError, Result};
use crate::utils::fs::{read_lines, remove_artifacts};
use wait_graph::WaitGraph;

/// A build in progress or finished, shareable between any number of waiters.
pub type BuildFuture = Shared<BoxFuture<'static, Result<()>>>;

/// The action that produces a target.
pub type Action = Arc<dyn Fn(Arc<BuildContext>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

struct Rule {
    /// Name shown in cycle reports (the unit the target belongs to)
    label: String,
    action: Action,
}

/// Registered rules plus the builds started from them.
pub struct BuildContext {
    rules: DashMap<PathBuf, Rule>,
    builds: DashMap<PathBuf, BuildFuture>,
    waits: Mutex<WaitGraph>,
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("rules", &self.rules.len())
            .field("builds", &self.builds.len())
            .finish()
    }
}

impl BuildContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rules: DashMap::new(),
            builds: DashMap::new(),
            waits: Mutex::new(WaitGraph::default()),
        })
    }

    /// Register the rule producing `target`.
    ///
    /// Only the first registration for a path is kept; returns `false` when a
    /// rule already existed.
    pub fn register<F>(&self, target: PathBuf, label: impl Into<String>, action: F) -> bool
    where
        F: Fn(Arc<Self>) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        match self.rules.entry(target) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                tracing::debug!(
                    target: "build",
                    "Rule for {} already registered, keeping the first one",
                    existing.key().display()
                );
                false
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                tracing::trace!(target: "build", "Registered rule for {}", slot.key().display());
                slot.insert(Rule {
                    label: label.into(),
                    action: Arc::new(action),
                });
                true
            }
        }
    }

    /// Whether a rule produces `target`.
    #[must_use]
    pub fn has_rule(&self, target: &Path) -> bool {
        self.rules.contains_key(target)
    }

    /// Number of builds started so far.
    #[must_use]
    pub fn started_builds(&self) -> usize {
        self.builds.len()
    }

    /// Build `target`, or join the build already started for it.
    pub fn build(self: &Arc<Self>, target: &Path) -> BuildFuture {
        self.builds
            .entry(target.to_path_buf())
            .or_insert_with(|| {
                let ctx = Arc::clone(self);
                let target = target.to_path_buf();
                async move { ctx.run(target).await }.boxed().shared()
            })
            .value()
            .clone()
    }

    async fn run(self: Arc<Self>, target: PathBuf) -> Result<()> {
        let action = self.rules.get(&target).map(|rule| Arc::clone(&rule.action));
        match action {
            Some(action) => {
                tracing::debug!(target: "build", "Building {}", target.display());
                action(Arc::clone(&self)).await
            }
            None => match tokio::fs::try_exists(&target).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(ModepError::ArtifactMissing {
                    path: target.display().to_string(),
                }),
                Err(e) => Err(ModepError::fs("checking", &target, &e)),
            },
        }
    }

    /// Build every path in `targets` on behalf of the rule producing `from`.
    ///
    /// # Errors
    ///
    /// Returns [`ModepError::CircularDependency`] if one of the targets is
    /// already waiting (directly or transitively) on `from`, otherwise the
    /// first error among the builds.
    pub async fn depend_on(self: &Arc<Self>, from: &Path, targets: &[PathBuf]) -> Result<()> {
        self.add_waits(from, targets)?;
        let result = try_join_all(targets.iter().map(|target| self.build(target))).await;
        self.remove_waits(from, targets);
        result.map(|_| ())
    }

    fn add_waits(&self, from: &Path, targets: &[PathBuf]) -> Result<()> {
        let mut waits = self.waits.lock().map_err(|_| ModepError::Other {
            message: "build wait graph lock poisoned".to_string(),
        })?;
        for (i, target) in targets.iter().enumerate() {
            if let Err(cycle) = waits.add(from, target) {
                for added in &targets[..i] {
                    waits.remove(from, added);
                }
                drop(waits);
                let chain = self.labels(&cycle);
                tracing::debug!(target: "build", "Refusing cyclic wait: {}", chain.join(" -> "));
                return Err(ModepError::CircularDependency {
                    dir: from.parent().map(|p| p.display().to_string()).unwrap_or_default(),
                    chain,
                });
            }
        }
        Ok(())
    }

    fn remove_waits(&self, from: &Path, targets: &[PathBuf]) {
        if let Ok(mut waits) = self.waits.lock() {
            for target in targets {
                waits.remove(from, target);
            }
        }
    }

    fn labels(&self, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|path| {
                self.rules
                    .get(path)
                    .map_or_else(|| path.display().to_string(), |rule| rule.label.clone())
            })
            .collect()
    }

    /// Build `target` and read it back as lines.
    ///
    /// # Errors
    ///
    /// Returns the build's error, or a file system error if the artifact
    /// cannot be read.
    pub async fn lines_of(self: &Arc<Self>, target: &Path) -> Result<Vec<String>> {
        self.build(target).await?;
        read_lines(target).await
    }

    /// Remove every `.d` and `.all-deps` artifact directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns a file system error if the directory cannot be scanned or a
    /// file cannot be removed.
    pub async fn clean(dir: &Path) -> Result<Vec<PathBuf>> {
        let removed = remove_artifacts(dir).await?;
        tracing::debug!(target: "build", "Removed {} artifacts from {}", removed.len(), dir.display());
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::atomic_write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_rule_runs_once_for_concurrent_requests() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("foo.ml.d");
        let runs = Arc::new(AtomicUsize::new(0));

        let ctx = BuildContext::new();
        let counter = Arc::clone(&runs);
        let path = target.clone();
        ctx.register(target.clone(), "foo", move |_| {
            let counter = Arc::clone(&counter);
            let path = path.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                atomic_write(&path, b"foo.ml: bar\n").await
            })
        });

        let (a, b, c) = tokio::join!(ctx.build(&target), ctx.build(&target), ctx.lines_of(&target));
        a.unwrap();
        b.unwrap();
        assert_eq!(c.unwrap(), vec!["foo.ml: bar"]);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_registration_wins() {
        let ctx = BuildContext::new();
        let target = PathBuf::from("x.d");
        assert!(ctx.register(target.clone(), "x", |_| Box::pin(async { Ok::<(), ModepError>(()) })));
        assert!(!ctx.register(target.clone(), "x", |_| Box::pin(async { Ok::<(), ModepError>(()) })));
        assert!(ctx.has_rule(&target));
    }

    #[tokio::test]
    async fn test_missing_input_without_rule() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildContext::new();

        let err = ctx.build(&dir.path().join("nope.ml.all-deps")).await.unwrap_err();
        assert!(matches!(err, ModepError::ArtifactMissing { .. }));

        let present = dir.path().join("here.ml");
        std::fs::write(&present, "").unwrap();
        ctx.build(&present).await.unwrap();
    }

    #[tokio::test]
    async fn test_cyclic_waits_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.ml.all-deps");
        let b = dir.path().join("b.ml.all-deps");

        let ctx = BuildContext::new();
        for (target, label, other) in [(&a, "a", &b), (&b, "b", &a)] {
            let me = target.clone();
            let other = other.clone();
            ctx.register(target.clone(), label, move |ctx| {
                let me = me.clone();
                let other = other.clone();
                Box::pin(async move {
                    ctx.depend_on(&me, std::slice::from_ref(&other)).await?;
                    atomic_write(&me, b"").await
                })
            });
        }

        let err = ctx.build(&a).await.unwrap_err();
        match err {
            ModepError::CircularDependency {
                chain, ..
            } => {
                assert_eq!(chain.first(), chain.last());
                assert!(chain.contains(&"a".to_string()));
                assert!(chain.contains(&"b".to_string()));
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clean_removes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ml"), "").unwrap();
        std::fs::write(dir.path().join("a.ml.d"), "").unwrap();

        let removed = BuildContext::clean(dir.path()).await.unwrap();
        assert_eq!(removed, vec![dir.path().join("a.ml.d")]);
        assert!(dir.path().join("a.ml").exists());
    }
}
