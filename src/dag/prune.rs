use indexmap::{IndexMap, IndexSet};

use crate::dag::{Dag, Node, Path, Traversal, Visitor};

type NodeFilter<'f, N> = Box<dyn Fn(&N) -> bool + 'f>;
type EdgeFilter<'f, N, L> = Box<dyn Fn(&N, &N, &L) -> bool + 'f>;

/// Removes the nodes and edges that match a filter
///
/// The graph is only modified after the traversal has finished, so the
/// traversal itself always sees the complete graph.
///
/// # Examples
///
/// ```
/// use ontoenrich::dag::{Dag, SimplePruner, Traversal};
///
/// let mut dag: Dag<u32, &str> = Dag::new();
/// dag.add_edge(1, 2, "is_a").unwrap();
/// dag.add_edge(1, 3, "part_of").unwrap();
/// dag.add_edge(3, 4, "is_a").unwrap();
///
/// let pruned = SimplePruner::new()
///     .edge_filter(|_, _, rel: &&str| *rel == "part_of")
///     .node_filter(|n: &u32| *n == 4)
///     .prune(&mut dag, &Traversal::forward());
///
/// assert_eq!(pruned.edges.len(), 1);
/// assert_eq!(pruned.nodes, vec![4]);
/// assert_eq!(dag.len(), 3);
/// assert!(dag.is_root(&3));
/// ```
pub struct SimplePruner<'f, N, L> {
    node_filter: Option<NodeFilter<'f, N>>,
    edge_filter: Option<EdgeFilter<'f, N, L>>,
    nodes: IndexSet<N>,
    edges: IndexMap<(N, N), L>,
}

/// The nodes and edges that were removed by a [`SimplePruner`]
#[derive(Debug, Clone)]
pub struct Pruned<N, L> {
    pub nodes: Vec<N>,
    /// Removed edges as `(parent, child, label)`
    ///
    /// Edges that disappeared because one of their nodes was removed
    /// are not listed.
    pub edges: Vec<(N, N, L)>,
}

impl<'f, N: Node, L: Clone> Default for SimplePruner<'f, N, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f, N: Node, L: Clone> SimplePruner<'f, N, L> {
    /// A pruner without filters, it does not remove anything
    pub fn new() -> Self {
        Self {
            node_filter: None,
            edge_filter: None,
            nodes: IndexSet::new(),
            edges: IndexMap::new(),
        }
    }

    /// Removes every visited node for which `filter` returns `true`
    #[must_use]
    pub fn node_filter<F: Fn(&N) -> bool + 'f>(mut self, filter: F) -> Self {
        self.node_filter = Some(Box::new(filter));
        self
    }

    /// Removes every visited edge for which `filter` returns `true`
    ///
    /// The filter receives `parent`, `child` and the edge label.
    #[must_use]
    pub fn edge_filter<F: Fn(&N, &N, &L) -> bool + 'f>(mut self, filter: F) -> Self {
        self.edge_filter = Some(Box::new(filter));
        self
    }

    /// Traverses the graph and removes everything that matched a filter
    pub fn prune(mut self, dag: &mut Dag<N, L>, traversal: &Traversal<N>) -> Pruned<N, L> {
        dag.traverse(traversal, &mut self);

        let mut pruned = Pruned {
            nodes: Vec::with_capacity(self.nodes.len()),
            edges: Vec::with_capacity(self.edges.len()),
        };
        for ((parent, child), data) in self.edges {
            if dag.remove_edge(&parent, &child).is_ok() {
                pruned.edges.push((parent, child, data));
            }
        }
        for node in self.nodes {
            if dag.remove_node(&node).is_ok() {
                pruned.nodes.push(node);
            }
        }
        pruned
    }
}

impl<'f, N: Node, L: Clone> Visitor<N, L> for SimplePruner<'f, N, L> {
    fn before_node(&mut self, _: &Dag<N, L>, node: &N, _: &Path<'_, N, L>) -> bool {
        if self.node_filter.as_ref().map_or(false, |filter| filter(node)) {
            self.nodes.insert(node.clone());
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
        if self
            .edge_filter
            .as_ref()
            .map_or(false, |filter| filter(parent, child, data))
        {
            self.edges
                .insert((parent.clone(), child.clone()), data.clone());
        }
        true
    }
}
