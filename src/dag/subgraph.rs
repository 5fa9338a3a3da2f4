use crate::dag::{Dag, Direction, Node, Path, Traversal, Visitor};

/// Builds a new graph of everything a traversal reaches
///
/// In `inclusive` mode, every crossed edge is copied. Otherwise only the
/// start nodes and edges between already collected nodes are kept. This is
/// useful together with a visitor that rejects some edges, or to extract the
/// induced subgraph of a known set of nodes.
///
/// The extracted graph contains no edge that was not part of the source,
/// so no cycle check is performed while building it.
///
/// # Examples
///
/// ```
/// use ontoenrich::dag::{Dag, SubgraphExtractor, Traversal};
///
/// let mut dag: Dag<char> = Dag::new();
/// dag.add_edge('a', 'b', ()).unwrap();
/// dag.add_edge('b', 'c', ()).unwrap();
/// dag.add_edge('x', 'c', ()).unwrap();
///
/// let ancestors = SubgraphExtractor::new(true).go(&dag, &Traversal::reverse().from_nodes(['b']));
/// assert_eq!(ancestors.len(), 2);
/// assert!(ancestors.has_edge(&'a', &'b'));
/// ```
pub struct SubgraphExtractor<N, L> {
    inclusive: bool,
    graph: Dag<N, L>,
}

impl<N: Node, L: Clone> SubgraphExtractor<N, L> {
    pub fn new(inclusive: bool) -> Self {
        Self {
            inclusive,
            graph: Dag::new(),
        }
    }

    /// Runs the traversal and returns the extracted graph
    pub fn go(mut self, dag: &Dag<N, L>, traversal: &Traversal<N>) -> Dag<N, L> {
        dag.traverse(traversal, &mut self);
        self.graph
    }
}

impl<N: Node, L: Clone> Visitor<N, L> for SubgraphExtractor<N, L> {
    fn before_traverse(&mut self, dag: &Dag<N, L>, start: &[N], _: Direction) -> bool {
        for node in start {
            if dag.has_node(node) {
                self.graph.add_node(node.clone());
            }
        }
        true
    }

    fn before_node(&mut self, _: &Dag<N, L>, node: &N, _: &Path<'_, N, L>) -> bool {
        if self.inclusive {
            self.graph.add_node(node.clone());
        }
        true
    }

    fn before_edge(
        &mut self,
        _: &Dag<N, L>,
        parent: &N,
        child: &N,
        data: &L,
        _: &Path<'_, N, L>,
    ) -> bool {
        if self.inclusive || (self.graph.has_node(parent) && self.graph.has_node(child)) {
            self.graph
                .add_edge_unchecked(parent.clone(), child.clone(), data.clone());
        }
        true
    }
}
