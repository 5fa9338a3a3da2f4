use std::collections::HashSet;

use crate::dag::{Dag, Direction, Node, Path, Traversal, Visitor};

/// Finds edges that are implied by a longer path
///
/// An edge `a -> c` is redundant if `c` can also be reached from `a`
/// through at least one intermediate node, e.g. `a -> b -> c`.
///
/// The finder needs to see every path to a node. [`RedundantEdgeFinder::go`]
/// therefore always traverses with [`Traversal::all_paths`] enabled, which
/// can be slow on large, densely connected graphs.
///
/// # Examples
///
/// ```
/// use ontoenrich::dag::{Dag, RedundantEdgeFinder};
///
/// let mut dag: Dag<char> = Dag::new();
/// dag.add_edge('a', 'b', ()).unwrap();
/// dag.add_edge('b', 'c', ()).unwrap();
/// dag.add_edge('a', 'c', ()).unwrap();
///
/// let redundant = RedundantEdgeFinder::find(&dag);
/// assert_eq!(redundant, vec![('a', 'c', ())]);
/// ```
pub struct RedundantEdgeFinder<N, L> {
    reversed: bool,
    seen: HashSet<(N, N)>,
    edges: Vec<(N, N, L)>,
}

impl<N: Node, L: Clone> Default for RedundantEdgeFinder<N, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Node, L: Clone> RedundantEdgeFinder<N, L> {
    pub fn new() -> Self {
        Self {
            reversed: false,
            seen: HashSet::new(),
            edges: Vec::new(),
        }
    }

    /// Returns all redundant edges of the whole graph as `(parent, child, label)`
    pub fn find(dag: &Dag<N, L>) -> Vec<(N, N, L)> {
        Self::new().go(dag, &Traversal::forward())
    }

    /// Runs the traversal and returns the redundant edges in the order they were found
    ///
    /// Each edge is reported once, even if several paths imply it.
    pub fn go(mut self, dag: &Dag<N, L>, traversal: &Traversal<N>) -> Vec<(N, N, L)> {
        let traversal = traversal.clone().all_paths(true);
        dag.traverse(&traversal, &mut self);
        self.edges
    }

    fn record(&mut self, dag: &Dag<N, L>, parent: &N, child: &N) {
        if let Some(data) = dag.edge(parent, child) {
            if self.seen.insert((parent.clone(), child.clone())) {
                self.edges
                    .push((parent.clone(), child.clone(), data.clone()));
            }
        }
    }
}

impl<N: Node, L: Clone> Visitor<N, L> for RedundantEdgeFinder<N, L> {
    fn before_traverse(&mut self, _: &Dag<N, L>, _: &[N], direction: Direction) -> bool {
        self.reversed = direction == Direction::Reverse;
        true
    }

    fn before_node(&mut self, dag: &Dag<N, L>, node: &N, path: &Path<'_, N, L>) -> bool {
        // the last node of the path is connected to `node` by the edge
        // that was just crossed
        let earlier = path.node_count().saturating_sub(1);
        for other in path.nodes().take(earlier) {
            if self.reversed {
                self.record(dag, node, other);
            } else {
                self.record(dag, other, node);
            }
        }
        true
    }
}
