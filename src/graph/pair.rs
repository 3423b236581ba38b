//! The interface and implementation graphs of one unit set.
//!
//! Both graphs share one [`DependencyResolver`] and therefore one
//! [`BuildContext`], so a source analyzed for one graph is never analyzed
//! again for the other.

use std::collections::HashSet;
use std::sync::Arc;

use crate::build::BuildContext;
use crate::graph::DependencyGraph;
use crate::resolver::DependencyResolver;
use crate::tool::DepTool;
use crate::unit::{Kind, Scope, Unit};

/// The interface and implementation graphs of one unit set.
///
/// The two graphs are independent: a unit's interface may depend on units
/// its implementation does not, and the other way round.
#[derive(Debug)]
pub struct GraphPair {
    /// Dependencies of interface parts
    pub interface: DependencyGraph,
    /// Dependencies of implementation parts
    pub implementation: DependencyGraph,
    resolver: Option<Arc<DependencyResolver>>,
}

impl GraphPair {
    /// Graphs over every unit of `scope`.
    ///
    /// Units named in `already_resolved` get no rules; their `.all-deps`
    /// artifacts must already exist when they are read.
    pub fn new(
        ctx: Arc<BuildContext>,
        tool: Arc<dyn DepTool>,
        scope: Arc<Scope>,
        already_resolved: HashSet<String>,
    ) -> Self {
        let resolver = Arc::new(DependencyResolver::new(ctx, tool, scope, already_resolved));
        let scope = Arc::clone(resolver.scope());
        tracing::debug!(
            target: "graph",
            "Creating dependency graphs for {} units in {}",
            scope.len(),
            scope.dir().display()
        );
        Self {
            interface: DependencyGraph::new(Kind::Interface, &resolver, scope.units()),
            implementation: DependencyGraph::new(Kind::Implementation, &resolver, scope.units()),
            resolver: Some(resolver),
        }
    }

    /// Graphs holding a single unit with no dependencies.
    pub fn dummy(unit: &Arc<Unit>) -> Self {
        Self {
            interface: DependencyGraph::dummy(Kind::Interface, unit),
            implementation: DependencyGraph::dummy(Kind::Implementation, unit),
            resolver: None,
        }
    }

    /// Graphs holding only `unit`, which is analyzed against `resolver`'s
    /// scope without being one of its units.
    ///
    /// Used for units such as executables' entry points that reference the
    /// units of a directory but are never referenced by them.
    pub fn for_auxiliary(resolver: &Arc<DependencyResolver>, unit: &Arc<Unit>) -> Self {
        tracing::debug!(
            target: "graph",
            "Creating dependency graphs for auxiliary unit {} against {}",
            unit,
            resolver.scope().dir().display()
        );
        Self {
            interface: DependencyGraph::new(Kind::Interface, resolver, [unit]),
            implementation: DependencyGraph::new(Kind::Implementation, resolver, [unit]),
            resolver: Some(Arc::clone(resolver)),
        }
    }

    /// The graph for `kind`.
    #[must_use]
    pub const fn get(&self, kind: Kind) -> &DependencyGraph {
        match kind {
            Kind::Interface => &self.interface,
            Kind::Implementation => &self.implementation,
        }
    }

    /// The resolver behind the graphs, absent for [`GraphPair::dummy`].
    #[must_use]
    pub const fn resolver(&self) -> Option<&Arc<DependencyResolver>> {
        self.resolver.as_ref()
    }
}
