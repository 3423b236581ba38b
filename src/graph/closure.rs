//! Topological closure over a subset of units.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::sync::Arc;

use crate::unit::Unit;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is on the current DFS path.
    Gray,
    /// Node and everything it depends on has been emitted.
    Black,
}

/// Order `units` so that each unit comes after its dependencies.
///
/// `deps[i]` lists the dependencies of `units[i]`; entries outside `units` are
/// ignored. Traversal follows input order, then dependency-list order, so
/// the result is deterministic and unrelated units keep their relative order.
///
/// On a cycle, returns the names along it with the first name repeated at
/// the end.
pub(crate) fn top_closed(
    units: &[Arc<Unit>],
    deps: &[Vec<Arc<Unit>>],
) -> Result<Vec<Arc<Unit>>, Vec<String>> {
    let mut graph: DiGraph<Arc<Unit>, ()> = DiGraph::with_capacity(units.len(), 0);
    let mut index: HashMap<&str, NodeIndex> = HashMap::with_capacity(units.len());
    for unit in units {
        index.entry(unit.name()).or_insert_with(|| graph.add_node(Arc::clone(unit)));
    }

    for (unit, unit_deps) in units.iter().zip(deps) {
        let from = index[unit.name()];
        for dep in unit_deps {
            if let Some(&to) = index.get(dep.name()) {
                graph.add_edge(from, to, ());
            }
        }
    }

    let mut search = Search {
        graph: &graph,
        color: vec![Color::White; graph.node_count()],
        path: Vec::new(),
        order: Vec::with_capacity(graph.node_count()),
    };
    for node in graph.node_indices() {
        if search.color[node.index()] == Color::White {
            search.visit(node)?;
        }
    }
    Ok(search.order.into_iter().map(|node| Arc::clone(&graph[node])).collect())
}

struct Search<'g> {
    graph: &'g DiGraph<Arc<Unit>, ()>,
    color: Vec<Color>,
    path: Vec<NodeIndex>,
    order: Vec<NodeIndex>,
}

impl Search<'_> {
    fn visit(&mut self, node: NodeIndex) -> Result<(), Vec<String>> {
        self.color[node.index()] = Color::Gray;
        self.path.push(node);

        // petgraph yields the most recently added edge first.
        let mut next: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        next.reverse();

        for dep in next {
            match self.color[dep.index()] {
                Color::White => self.visit(dep)?,
                Color::Gray => return Err(self.cycle_through(dep)),
                Color::Black => {}
            }
        }

        self.path.pop();
        self.color[node.index()] = Color::Black;
        self.order.push(node);
        Ok(())
    }

    fn cycle_through(&self, start: NodeIndex) -> Vec<String> {
        let from = self.path.iter().position(|&n| n == start).unwrap_or(0);
        self.path[from..]
            .iter()
            .chain(std::iter::once(&start))
            .map(|&n| self.graph[n].name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str) -> Arc<Unit> {
        Arc::new(Unit::implementation_only(name, format!("{name}.ml")))
    }

    fn names(units: &[Arc<Unit>]) -> Vec<&str> {
        units.iter().map(|u| u.name()).collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let (a, b, c) = (unit("a"), unit("b"), unit("c"));
        let units = vec![Arc::clone(&a), Arc::clone(&b), Arc::clone(&c)];
        let deps = vec![vec![Arc::clone(&b), Arc::clone(&c)], vec![Arc::clone(&c)], vec![]];

        let order = top_closed(&units, &deps).unwrap();
        assert_eq!(names(&order), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_ties_follow_input_order() {
        let (x, y, z) = (unit("x"), unit("y"), unit("z"));
        let units = vec![Arc::clone(&z), Arc::clone(&x), Arc::clone(&y)];
        let order = top_closed(&units, &[vec![], vec![], vec![]]).unwrap();
        assert_eq!(names(&order), vec!["z", "x", "y"]);

        // Dependency-list order decides among a unit's dependencies.
        let units = vec![Arc::clone(&x), Arc::clone(&y), Arc::clone(&z)];
        let deps = vec![vec![Arc::clone(&z), Arc::clone(&y)], vec![], vec![]];
        let order = top_closed(&units, &deps).unwrap();
        assert_eq!(names(&order), vec!["z", "y", "x"]);
    }

    #[test]
    fn test_outside_dependencies_are_ignored() {
        let (a, b, outside) = (unit("a"), unit("b"), unit("outside"));
        let units = vec![Arc::clone(&a), Arc::clone(&b)];
        let deps = vec![vec![Arc::clone(&outside), Arc::clone(&b)], vec![outside]];

        let order = top_closed(&units, &deps).unwrap();
        assert_eq!(names(&order), vec!["b", "a"]);
    }

    #[test]
    fn test_cycle_chain_is_closed() {
        let (a, b, c) = (unit("a"), unit("b"), unit("c"));
        let units = vec![Arc::clone(&a), Arc::clone(&b), Arc::clone(&c)];
        let deps = vec![vec![Arc::clone(&b)], vec![Arc::clone(&c)], vec![Arc::clone(&b)]];

        let chain = top_closed(&units, &deps).unwrap_err();
        assert_eq!(chain, vec!["b", "c", "b"]);
    }

    #[test]
    fn test_duplicate_inputs_appear_once() {
        let a = unit("a");
        let units = vec![Arc::clone(&a), Arc::clone(&a)];
        let order = top_closed(&units, &[vec![], vec![]]).unwrap();
        assert_eq!(names(&order), vec!["a"]);
    }
}
