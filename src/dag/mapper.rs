use std::collections::HashMap;

use crate::dag::{Dag, Node, Path, Traversal, Visitor};
use crate::{EnrichError, EnrichResult};

type NodeFilter<'f, N> = Box<dyn Fn(&N) -> bool + 'f>;
type NodeMap<'f, N, M> = Box<dyn Fn(&N) -> M + 'f>;
type EdgeFilter<'f, N, L> = Box<dyn Fn(&N, &N, &L) -> bool + 'f>;
type EdgeMap<'f, N, M, L, K> = Box<dyn Fn(&N, &N, &M, &M, &L) -> K + 'f>;

/// Builds a new graph by filtering and mapping the nodes and edges of a source graph
///
/// - nodes for which the node filter returns `false` are not traversed
/// - every other node is converted by the node map. The mapping of each
///   source node is computed once and reused
/// - edges for which the edge filter returns `false` are not crossed
/// - the label of every other edge is converted by the edge map, which
///   receives the source and the mapped end points
///
/// If the node map merges several source nodes into one, the result may
/// contain a cycle. Such edges are rejected and [`DagMapper::go`] fails.
///
/// # Examples
///
/// ```
/// use ontoenrich::dag::{Dag, DagMapper, Traversal};
///
/// let mut dag: Dag<u32, &str> = Dag::new();
/// dag.add_edge(1, 2, "is_a").unwrap();
/// dag.add_edge(2, 3, "part_of").unwrap();
/// dag.add_edge(2, 4, "is_a").unwrap();
///
/// let mapped = DagMapper::new(|n: &u32| format!("N{n}"), |_, _, _, _, rel: &&str| rel.len())
///     .edge_filter(|_, _, rel| *rel == "is_a")
///     .go(&dag, &Traversal::forward())
///     .unwrap();
///
/// assert_eq!(mapped.len(), 3);
/// assert_eq!(mapped.edge(&"N2".to_string(), &"N4".to_string()), Some(&4));
/// assert!(!mapped.has_node(&"N3".to_string()));
/// ```
pub struct DagMapper<'f, N, L, M, K> {
    node_filter: NodeFilter<'f, N>,
    node_map: NodeMap<'f, N, M>,
    edge_filter: EdgeFilter<'f, N, L>,
    edge_map: EdgeMap<'f, N, M, L, K>,
    mapped_nodes: HashMap<N, M>,
    mapped_edges: HashMap<(M, M), K>,
    result: Dag<M, K>,
    error: Option<EnrichError>,
}

impl<'f, N: Node + 'f, L: Clone + 'f> DagMapper<'f, N, L, N, L> {
    /// A mapper that copies the graph unchanged
    pub fn identity() -> Self {
        Self::new(N::clone, |_, _, _, _, data: &L| data.clone())
    }
}

impl<'f, N: Node, L, M: Node, K: Clone> DagMapper<'f, N, L, M, K> {
    /// Constructs a mapper with a node map and an edge map
    ///
    /// Without further configuration, all nodes and edges are mapped.
    pub fn new<NM, EM>(node_map: NM, edge_map: EM) -> Self
    where
        NM: Fn(&N) -> M + 'f,
        EM: Fn(&N, &N, &M, &M, &L) -> K + 'f,
    {
        Self {
            node_filter: Box::new(|_| true),
            node_map: Box::new(node_map),
            edge_filter: Box::new(|_, _, _| true),
            edge_map: Box::new(edge_map),
            mapped_nodes: HashMap::new(),
            mapped_edges: HashMap::new(),
            result: Dag::new(),
            error: None,
        }
    }

    /// Only maps nodes for which `filter` returns `true`
    #[must_use]
    pub fn node_filter<F: Fn(&N) -> bool + 'f>(mut self, filter: F) -> Self {
        self.node_filter = Box::new(filter);
        self
    }

    /// Only maps edges for which `filter` returns `true`
    #[must_use]
    pub fn edge_filter<F: Fn(&N, &N, &L) -> bool + 'f>(mut self, filter: F) -> Self {
        self.edge_filter = Box::new(filter);
        self
    }

    /// Runs the traversal and returns the mapped graph
    ///
    /// # Errors
    ///
    /// [`EnrichError::Cycle`] if a mapped edge would close a cycle
    pub fn go(mut self, dag: &Dag<N, L>, traversal: &Traversal<N>) -> EnrichResult<Dag<M, K>> {
        dag.traverse(traversal, &mut self);
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }

    fn mapped_node(&mut self, node: &N) -> M {
        if let Some(mapped) = self.mapped_nodes.get(node) {
            return mapped.clone();
        }
        let mapped = (self.node_map)(node);
        self.mapped_nodes.insert(node.clone(), mapped.clone());
        mapped
    }

    fn mapped_edge(&mut self, parent: &N, child: &N, data: &L) -> (M, M, K) {
        let parent2 = self.mapped_node(parent);
        let child2 = self.mapped_node(child);
        let key = (parent2, child2);
        if let Some(mapped) = self.mapped_edges.get(&key) {
            let data2 = mapped.clone();
            return (key.0, key.1, data2);
        }
        let data2 = (self.edge_map)(parent, child, &key.0, &key.1, data);
        self.mapped_edges.insert(key.clone(), data2.clone());
        (key.0, key.1, data2)
    }
}

impl<'f, N: Node, L, M: Node, K: Clone> Visitor<N, L> for DagMapper<'f, N, L, M, K> {
    fn before_node(&mut self, _: &Dag<N, L>, node: &N, _: &Path<'_, N, L>) -> bool {
        if self.error.is_some() || !(self.node_filter)(node) {
            return false;
        }
        let mapped = self.mapped_node(node);
        self.result.add_node(mapped);
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
        if self.error.is_some()
            || !(self.node_filter)(parent)
            || !(self.node_filter)(child)
            || !(self.edge_filter)(parent, child, data)
        {
            return false;
        }
        let (parent2, child2, data2) = self.mapped_edge(parent, child, data);
        if let Err(err) = self.result.add_edge(parent2, child2, data2) {
            self.error = Some(err);
            return false;
        }
        true
    }
}
