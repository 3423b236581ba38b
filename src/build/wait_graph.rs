//! Wait-for graph between artifacts under construction.
//!
//! Each edge `from -> to` means the rule producing `from` is blocked on the
//! build of `to`. An edge that would close a loop is refused and the loop is
//! returned instead, so a cyclic dependency surfaces as an error rather than
//! a set of futures waiting on each other forever.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub(crate) struct WaitGraph {
    edges: HashMap<PathBuf, Vec<PathBuf>>,
}

impl WaitGraph {
    /// Record that `from` waits on `to`.
    ///
    /// On success the edge is stored. If `to` already (transitively) waits on
    /// `from`, nothing is stored and the loop is returned as
    /// `[from, to, ..., from]`.
    pub(crate) fn add(&mut self, from: &Path, to: &Path) -> Result<(), Vec<PathBuf>> {
        if let Some(mut path) = self.path_between(to, from) {
            path.insert(0, from.to_path_buf());
            return Err(path);
        }
        self.edges.entry(from.to_path_buf()).or_default().push(to.to_path_buf());
        Ok(())
    }

    /// Drop one `from -> to` edge.
    pub(crate) fn remove(&mut self, from: &Path, to: &Path) {
        if let Some(targets) = self.edges.get_mut(from) {
            if let Some(pos) = targets.iter().position(|t| t == to) {
                targets.swap_remove(pos);
            }
            if targets.is_empty() {
                self.edges.remove(from);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Depth-first search for a path `start -> ... -> goal`, inclusive.
    fn path_between(&self, start: &Path, goal: &Path) -> Option<Vec<PathBuf>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        if self.search(start, goal, &mut visited, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn search<'a>(
        &'a self,
        node: &'a Path,
        goal: &Path,
        visited: &mut HashSet<&'a Path>,
        path: &mut Vec<PathBuf>,
    ) -> bool {
        path.push(node.to_path_buf());
        if node == goal {
            return true;
        }
        if visited.insert(node) {
            for next in self.edges.get(node).into_iter().flatten() {
                if self.search(next, goal, visited, path) {
                    return true;
                }
            }
        }
        path.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_refuses_closing_edge() {
        let mut graph = WaitGraph::default();
        graph.add(&p("a"), &p("b")).unwrap();
        graph.add(&p("b"), &p("c")).unwrap();

        let cycle = graph.add(&p("c"), &p("a")).unwrap_err();
        assert_eq!(cycle, vec![p("c"), p("a"), p("b"), p("c")]);
    }

    #[test]
    fn test_self_wait_is_a_cycle() {
        let mut graph = WaitGraph::default();
        assert_eq!(graph.add(&p("a"), &p("a")).unwrap_err(), vec![p("a"), p("a")]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let mut graph = WaitGraph::default();
        graph.add(&p("a"), &p("b")).unwrap();
        graph.add(&p("a"), &p("c")).unwrap();
        graph.add(&p("b"), &p("d")).unwrap();
        graph.add(&p("c"), &p("d")).unwrap();

        for (from, to) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")] {
            graph.remove(&p(from), &p(to));
        }
        assert!(graph.is_empty());
    }
}
