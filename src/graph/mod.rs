//! Dependency graphs over a set of units.
//!
//! A [`DependencyGraph`] maps each unit of a set to its deferred dependency
//! list for one [`Kind`]. Building a graph only registers work; dependency
//! lists are computed the first time someone asks for an order or awaits a
//! unit's [`DepsFuture`].
//!
//! [`GraphPair`] bundles the interface and implementation graphs of one unit
//! set.

mod closure;
mod pair;

pub use pair::GraphPair;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared, try_join_all};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::IMPLEMENTATIONS_CLOSURE_LABEL;
use crate::core::{ModepError, Result};
use crate::resolver::{DependencyResolver, DepsFuture, ready_deps};
use crate::unit::{Kind, Unit};

/// A memoized ordering computation.
type OrderFuture = Shared<BoxFuture<'static, Result<Vec<Arc<Unit>>>>>;

/// Per-unit deferred dependency lists for one kind.
pub struct DependencyGraph {
    kind: Kind,
    dir: PathBuf,
    per_unit: HashMap<String, DepsFuture>,
    /// Unit names in insertion order, for diagnostics
    names: Vec<String>,
    /// Memoized implementation orders, keyed by the filtered input names
    implementation_orders: DashMap<Vec<String>, OrderFuture>,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("kind", &self.kind)
            .field("dir", &self.dir)
            .field("units", &self.names)
            .finish_non_exhaustive()
    }
}

impl DependencyGraph {
    /// Graph of `units` whose dependency lists come from `resolver`.
    pub fn new<'a>(
        kind: Kind,
        resolver: &DependencyResolver,
        units: impl IntoIterator<Item = &'a Arc<Unit>>,
    ) -> Self {
        let entries = units.into_iter().map(|unit| (Arc::clone(unit), resolver.deps_of(unit, kind)));
        Self::from_entries(kind, resolver.scope().dir(), entries)
    }

    /// Graph with one unit and no dependencies.
    pub fn dummy(kind: Kind, unit: &Arc<Unit>) -> Self {
        let dir = unit
            .source(unit.exported_kind())
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_entries(kind, &dir, [(Arc::clone(unit), ready_deps(Vec::new()))])
    }

    fn from_entries(
        kind: Kind,
        dir: &Path,
        entries: impl IntoIterator<Item = (Arc<Unit>, DepsFuture)>,
    ) -> Self {
        let mut per_unit = HashMap::new();
        let mut names = Vec::new();
        for (unit, deps) in entries {
            if per_unit.insert(unit.name().to_string(), deps).is_none() {
                names.push(unit.name().to_string());
            }
        }
        Self {
            kind,
            dir: dir.to_path_buf(),
            per_unit,
            names,
            implementation_orders: DashMap::new(),
        }
    }

    /// The kind this graph describes.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Directory of the unit set.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the units in the graph, in insertion order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Deferred dependency list of `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`ModepError::UnitNotInScope`] when `unit` is not part of the
    /// graph. That is a bug in the caller.
    pub fn deps_of(&self, unit: &Unit) -> Result<DepsFuture> {
        self.per_unit.get(unit.name()).cloned().ok_or_else(|| ModepError::UnitNotInScope {
            unit: unit.name().to_string(),
            dir: self.dir.display().to_string(),
            known: self.names.clone(),
        })
    }

    /// Order `units` so that every unit comes after the units of the subset it
    /// depends on.
    ///
    /// Dependencies outside `units` are ignored. Units without dependencies
    /// between them keep their input order.
    ///
    /// # Errors
    ///
    /// Returns [`ModepError::CircularDependency`] when the dependencies among
    /// `units` form a cycle, [`ModepError::UnitNotInScope`] for a unit that is
    /// not part of the graph, and any error from computing a dependency list.
    pub async fn top_closed(&self, units: &[Arc<Unit>]) -> Result<Vec<Arc<Unit>>> {
        self.order_future(units)?.await
    }

    /// [`top_closed`](Self::top_closed) restricted to the units that have an
    /// implementation part.
    ///
    /// The result is memoized: later calls with the same units share the first
    /// computation.
    ///
    /// # Errors
    ///
    /// Same as [`top_closed`](Self::top_closed).
    pub async fn top_closed_implementations(&self, units: &[Arc<Unit>]) -> Result<Vec<Arc<Unit>>> {
        let implementations: Vec<Arc<Unit>> =
            units.iter().filter(|unit| unit.has(Kind::Implementation)).cloned().collect();
        let key: Vec<String> = implementations.iter().map(|unit| unit.name().to_string()).collect();

        let cached = self.implementation_orders.get(&key).map(|memo| memo.value().clone());
        let order = match cached {
            Some(order) => {
                tracing::trace!(
                    target: "graph",
                    "{} in {}: reusing result",
                    IMPLEMENTATIONS_CLOSURE_LABEL,
                    self.dir.display()
                );
                order
            }
            None => {
                let order = self.order_future(&implementations)?;
                self.implementation_orders.entry(key).or_insert(order).value().clone()
            }
        };
        order.await
    }

    fn order_future(&self, units: &[Arc<Unit>]) -> Result<OrderFuture> {
        let pending = units
            .iter()
            .map(|unit| self.deps_of(unit))
            .collect::<Result<Vec<_>>>()?;
        let units = units.to_vec();
        let dir = self.dir.display().to_string();
        let kind = self.kind;

        Ok(async move {
            let deps = try_join_all(pending).await?;
            let order = closure::top_closed(&units, &deps).map_err(|chain| {
                ModepError::CircularDependency {
                    dir: dir.clone(),
                    chain,
                }
            })?;
            tracing::debug!(
                target: "graph",
                "{} order of {} units in {}: {}",
                kind,
                order.len(),
                dir,
                order.iter().map(|unit| unit.name()).collect::<Vec<_>>().join(" ")
            );
            Ok(order)
        }
        .boxed()
        .shared())
    }
}
