use std::collections::{HashMap, HashSet};

use crate::dag::{union_into, Dag, Direction, Node, Path, Traversal, Visitor};

/// Computes the reflexive transitive closure of every visited node
///
/// A forward traversal yields, for every node, the node itself and all of
/// its descendants. A reverse traversal yields the node and its ancestors.
///
/// An optional selector restricts which nodes are collected. Unselected
/// nodes still connect their neighbours, so the closure of a node
/// contains all selected nodes reachable through any path.
///
/// # Examples
///
/// ```
/// use ontoenrich::dag::{Closure, Dag, Traversal};
///
/// let mut dag: Dag<u32> = Dag::new();
/// dag.add_edge(1, 2, ()).unwrap();
/// dag.add_edge(2, 3, ()).unwrap();
///
/// let descendants = Closure::new().go(&dag, &Traversal::forward());
/// assert_eq!(descendants[&1].len(), 3);
///
/// let odd = Closure::with_selector(|n: &u32| n % 2 == 1).go(&dag, &Traversal::forward());
/// assert!(odd[&1].contains(&3));
/// assert!(odd[&2].contains(&3));
/// assert!(!odd[&2].contains(&2));
/// ```
pub struct Closure<N, F = fn(&N) -> bool> {
    selector: F,
    reversed: bool,
    closure: HashMap<N, HashSet<N>>,
}

fn select_all<N>(_: &N) -> bool {
    true
}

impl<N: Node> Closure<N> {
    /// A closure over all nodes
    pub fn new() -> Self {
        Self::with_selector(select_all::<N>)
    }
}

impl<N: Node> Default for Closure<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node, F: Fn(&N) -> bool> Closure<N, F> {
    /// A closure that only contains nodes for which `selector` returns `true`
    pub fn with_selector(selector: F) -> Self {
        Self {
            selector,
            reversed: false,
            closure: HashMap::new(),
        }
    }

    /// Runs the traversal and returns the closure of every visited node
    ///
    /// Nodes that are not reached by the traversal have no entry.
    pub fn go<L>(mut self, dag: &Dag<N, L>, traversal: &Traversal<N>) -> HashMap<N, HashSet<N>> {
        dag.traverse(traversal, &mut self);
        self.closure
    }
}

impl<N: Node, L, F: Fn(&N) -> bool> Visitor<N, L> for Closure<N, F> {
    fn before_traverse(&mut self, _: &Dag<N, L>, _: &[N], direction: Direction) -> bool {
        self.reversed = direction == Direction::Reverse;
        true
    }

    fn before_node(&mut self, _: &Dag<N, L>, node: &N, _: &Path<'_, N, L>) -> bool {
        let mut own = HashSet::new();
        if (self.selector)(node) {
            own.insert(node.clone());
        }
        self.closure.insert(node.clone(), own);
        true
    }

    fn after_edge(&mut self, _: &Dag<N, L>, parent: &N, child: &N, _: &L, _: &Path<'_, N, L>) {
        if self.reversed {
            union_into(&mut self.closure, child, parent);
        } else {
            union_into(&mut self.closure, parent, child);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    //     a
    //    / \
    //   b   c
    //  / \ / \
    // x   d   y
    fn diamond() -> Dag<&'static str> {
        let mut dag = Dag::new();
        dag.add_edge("a", "b", ()).unwrap();
        dag.add_edge("a", "c", ()).unwrap();
        dag.add_edge("b", "d", ()).unwrap();
        dag.add_edge("c", "d", ()).unwrap();
        dag.add_edge("b", "x", ()).unwrap();
        dag.add_edge("c", "y", ()).unwrap();
        dag
    }

    fn sorted(set: &HashSet<&'static str>) -> Vec<&'static str> {
        let mut v: Vec<_> = set.iter().copied().collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn descendants() {
        let closure = Closure::new().go(&diamond(), &Traversal::forward());
        assert_eq!(sorted(&closure["a"]), vec!["a", "b", "c", "d", "x", "y"]);
        assert_eq!(sorted(&closure["b"]), vec!["b", "d", "x"]);
        assert_eq!(sorted(&closure["c"]), vec!["c", "d", "y"]);
        assert_eq!(sorted(&closure["d"]), vec!["d"]);
    }

    #[test]
    fn ancestors() {
        let closure = Closure::new().go(&diamond(), &Traversal::reverse());
        assert_eq!(sorted(&closure["d"]), vec!["a", "b", "c", "d"]);
        assert_eq!(sorted(&closure["y"]), vec!["a", "c", "y"]);
        assert_eq!(sorted(&closure["a"]), vec!["a"]);
    }

    #[test]
    fn every_ancestor_contains_the_closure_of_its_descendants() {
        let dag = diamond();
        let closure = Closure::new().go(&dag, &Traversal::forward());
        for (parent, child, _) in dag.edges() {
            assert!(closure[parent].is_superset(&closure[child]));
        }
    }

    #[test]
    fn all_paths_gives_same_result() {
        let dag = diamond();
        let once = Closure::new().go(&dag, &Traversal::forward());
        let all = Closure::new().go(&dag, &Traversal::forward().all_paths(true));
        assert_eq!(once, all);
    }

    #[test]
    fn partial_traversal() {
        let closure = Closure::new().go(&diamond(), &Traversal::forward().from_nodes(["c"]));
        assert_eq!(closure.len(), 3);
        assert!(!closure.contains_key("a"));
        assert_eq!(sorted(&closure["c"]), vec!["c", "d", "y"]);
    }

    #[test]
    fn selector_skips_nodes_but_not_paths() {
        let closure =
            Closure::with_selector(|n: &&str| *n != "b").go(&diamond(), &Traversal::forward());
        assert_eq!(sorted(&closure["a"]), vec!["a", "c", "d", "x", "y"]);
        assert_eq!(sorted(&closure["b"]), vec!["d", "x"]);
    }
}
