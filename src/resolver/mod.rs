//! Per-unit dependency resolution backed by on-disk artifacts.
//!
//! For every (unit, kind) with a source file the resolver registers two rules
//! with the [`BuildContext`]:
//!
//! 1. `<source>.d` - run the [`DepTool`] on the source and store its output
//!    verbatim.
//! 2. `<source>.all-deps` - parse `<source>.d`, then merge the `.all-deps`
//!    artifacts of every direct dependency. The direct names come first, in
//!    the order the tool printed them with the alias in front, followed by
//!    the names read from the dependencies' artifacts. Each name is kept at
//!    its first occurrence.
//!
//! [`DependencyResolver::deps_of`] returns a [`DepsFuture`] that builds and
//! reads `<source>.all-deps`. Reads are memoized by path, so every caller
//! asking for the same artifact shares one computation and the tool runs at
//! most once per source file.
//!
//! The alias unit, and any unit lacking the requested part, resolve to an
//! empty list without touching the tool.

pub mod parser;

pub use parser::parse_output;

use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::build::BuildContext;
use crate::core::Result;
use crate::tool::DepTool;
use crate::unit::{Kind, Scope, Unit};
use crate::utils::fs::{atomic_write, read_lines};

/// Deferred dependency list, shareable between any number of waiters.
pub type DepsFuture = Shared<BoxFuture<'static, Result<Vec<Arc<Unit>>>>>;

/// A [`DepsFuture`] that is already complete.
pub fn ready_deps(deps: Vec<Arc<Unit>>) -> DepsFuture {
    future::ready(Ok(deps)).boxed().shared()
}

/// Resolves the dependencies of units in one [`Scope`].
///
/// Rules for every unit of the scope are registered when the resolver is
/// created; nothing runs until a [`DepsFuture`] is awaited.
pub struct DependencyResolver {
    ctx: Arc<BuildContext>,
    tool: Arc<dyn DepTool>,
    scope: Arc<Scope>,
    /// Units whose `.all-deps` artifacts are supplied from outside the build
    already_resolved: Arc<HashSet<String>>,
    reads: DashMap<PathBuf, DepsFuture>,
}

impl std::fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("dir", &self.scope.dir())
            .field("already_resolved", &self.already_resolved)
            .field("reads", &self.reads.len())
            .finish_non_exhaustive()
    }
}

impl DependencyResolver {
    /// Create a resolver for `scope`, registering the artifact rules of all
    /// its units.
    pub fn new(
        ctx: Arc<BuildContext>,
        tool: Arc<dyn DepTool>,
        scope: Arc<Scope>,
        already_resolved: HashSet<String>,
    ) -> Self {
        let resolver = Self {
            ctx,
            tool,
            scope,
            already_resolved: Arc::new(already_resolved),
            reads: DashMap::new(),
        };
        for unit in resolver.scope.units() {
            for kind in Kind::ALL {
                resolver.register_rules(unit, kind);
            }
        }
        resolver
    }

    /// The scope names are resolved against.
    #[must_use]
    pub fn scope(&self) -> &Arc<Scope> {
        &self.scope
    }

    /// The build context artifacts are produced in.
    #[must_use]
    pub fn context(&self) -> &Arc<BuildContext> {
        &self.ctx
    }

    /// Deferred list of the units `unit` depends on for `kind`.
    ///
    /// `unit` does not have to be a member of the scope; its dependency names
    /// are still resolved against the scope's units.
    pub fn deps_of(&self, unit: &Arc<Unit>, kind: Kind) -> DepsFuture {
        if self.scope.is_alias(unit) {
            return ready_deps(Vec::new());
        }
        let Some(all_deps) = unit.all_deps_path(kind) else {
            return ready_deps(Vec::new());
        };
        self.register_rules(unit, kind);

        self.reads
            .entry(all_deps.clone())
            .or_insert_with(|| {
                let ctx = Arc::clone(&self.ctx);
                let scope = Arc::clone(&self.scope);
                let unit = Arc::clone(unit);
                async move {
                    let names = ctx.lines_of(&all_deps).await?;
                    Ok(units_named(&names, &unit, &scope))
                }
                .boxed()
                .shared()
            })
            .value()
            .clone()
    }

    /// Register the `.d` and `.all-deps` rules for (`unit`, `kind`).
    ///
    /// Does nothing for the alias unit, for a missing part, for units whose
    /// artifacts come from outside the build, or when the rules exist.
    fn register_rules(&self, unit: &Arc<Unit>, kind: Kind) {
        if self.scope.is_alias(unit) || self.already_resolved.contains(unit.name()) {
            return;
        }
        let (Some(source), Some(raw), Some(all_deps)) =
            (unit.source(kind), unit.raw_deps_path(kind), unit.all_deps_path(kind))
        else {
            return;
        };
        if self.ctx.has_rule(&all_deps) {
            return;
        }
        let source = source.to_path_buf();

        tracing::trace!(target: "resolver", "Registering {} rules for {}", kind, unit);

        let tool = Arc::clone(&self.tool);
        let (raw_target, raw_source) = (raw.clone(), source.clone());
        self.ctx.register(raw.clone(), unit.name(), move |_ctx| {
            let tool = Arc::clone(&tool);
            let raw = raw_target.clone();
            let source = raw_source.clone();
            Box::pin(async move {
                let output = tool.extract(kind, &source).await?;
                atomic_write(&raw, output.as_bytes()).await
            })
        });

        let scope = Arc::clone(&self.scope);
        let unit = Arc::clone(unit);
        let label = unit.name().to_string();
        let target = all_deps.clone();
        self.ctx.register(all_deps, label, move |ctx| {
            let scope = Arc::clone(&scope);
            let unit = Arc::clone(&unit);
            let target = target.clone();
            let raw = raw.clone();
            let source = source.clone();
            Box::pin(async move {
                merge_all_deps(ctx, &scope, &unit, &source, &raw, &target).await
            })
        });
    }
}

/// Produce `target` (`<source>.all-deps`) from `raw` (`<source>.d`).
async fn merge_all_deps(
    ctx: Arc<BuildContext>,
    scope: &Scope,
    unit: &Unit,
    source: &Path,
    raw: &Path,
    target: &Path,
) -> Result<()> {
    ctx.depend_on(target, &[raw.to_path_buf()]).await?;
    let lines = read_lines(raw).await?;
    let deps = parse_output(&lines, source, unit, scope)?;

    let inputs: Vec<PathBuf> = deps
        .iter()
        .filter(|dep| !scope.is_alias(dep))
        .filter_map(|dep| dep.all_deps_path(dep.exported_kind()))
        .collect();
    ctx.depend_on(target, &inputs).await?;

    let mut merged: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for dep in &deps {
        if seen.insert(dep.name().to_string()) {
            merged.push(dep.name().to_string());
        }
    }
    for input in &inputs {
        for line in read_lines(input).await? {
            if !line.is_empty() && seen.insert(line.clone()) {
                merged.push(line);
            }
        }
    }

    tracing::debug!(
        target: "resolver",
        "{}: {} direct, {} total dependencies",
        source.display(),
        deps.len(),
        merged.len()
    );

    let mut content = String::new();
    for name in &merged {
        content.push_str(name);
        content.push('\n');
    }
    atomic_write(target, content.as_bytes()).await
}

/// Map persisted names back to units, skipping `unit` itself and names that
/// are not in the scope.
fn units_named(names: &[String], unit: &Unit, scope: &Scope) -> Vec<Arc<Unit>> {
    names
        .iter()
        .filter(|name| !name.is_empty() && name.as_str() != unit.name())
        .filter_map(|name| {
            let found = scope.get(name).cloned();
            if found.is_none() {
                tracing::debug!(target: "resolver", "{}: dropping unknown name {}", unit, name);
            }
            found
        })
        .collect()
}
