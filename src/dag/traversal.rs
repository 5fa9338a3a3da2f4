use std::collections::HashSet;

use smallvec::SmallVec;

use crate::dag::{Dag, Node};

/// The direction in which a traversal crosses edges
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From parents to children
    #[default]
    Forward,
    /// From children to parents
    Reverse,
}

/// Settings of a depth-first traversal
///
/// # Examples
///
/// ```
/// use ontoenrich::dag::{Direction, Traversal};
///
/// // start at the roots, visit every node once
/// let forward: Traversal<u32> = Traversal::forward();
/// assert_eq!(forward.direction(), Direction::Forward);
///
/// // start at node 7, walk up to the roots along every possible path
/// let traversal = Traversal::reverse().from_nodes(vec![7u32]).all_paths(true);
/// assert!(traversal.is_all_paths());
/// ```
#[derive(Debug, Clone)]
pub struct Traversal<N> {
    start: Option<Vec<N>>,
    direction: Direction,
    all_paths: bool,
}

impl<N> Default for Traversal<N> {
    fn default() -> Self {
        Self {
            start: None,
            direction: Direction::Forward,
            all_paths: false,
        }
    }
}

impl<N: Node> Traversal<N> {
    /// A traversal from the roots towards the leaves
    pub fn forward() -> Self {
        Self::default()
    }

    /// A traversal from the leaves towards the roots
    pub fn reverse() -> Self {
        Self {
            direction: Direction::Reverse,
            ..Self::default()
        }
    }

    /// Starts the traversal at the given nodes instead of the roots (or leaves)
    ///
    /// Start nodes that are not part of the graph are ignored.
    #[must_use]
    pub fn from_nodes<I: IntoIterator<Item = N>>(mut self, start: I) -> Self {
        self.start = Some(start.into_iter().collect());
        self
    }

    /// Visits a node once for every distinct path that reaches it
    ///
    /// By default, every node is visited only once.
    #[must_use]
    pub fn all_paths(mut self, all_paths: bool) -> Self {
        self.all_paths = all_paths;
        self
    }

    /// The direction of the traversal
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns `true` if nodes are visited once per path
    pub fn is_all_paths(&self) -> bool {
        self.all_paths
    }

    /// Returns the start nodes of the traversal
    ///
    /// Defaults to the roots for forward and to the leaves for reverse traversals.
    pub fn start_nodes<L>(&self, dag: &Dag<N, L>) -> Vec<N> {
        match (&self.start, self.direction) {
            (Some(start), _) => start.clone(),
            (None, Direction::Forward) => dag.roots().cloned().collect(),
            (None, Direction::Reverse) => dag.leaves().cloned().collect(),
        }
    }
}

/// One element of a [`Path`]
#[derive(Debug)]
pub enum Step<'a, N, L> {
    Node(&'a N),
    /// An edge, oriented in the direction of the traversal
    Edge { from: &'a N, to: &'a N, data: &'a L },
}

/// The trail by which a traversal reached its current position
///
/// A path alternates between nodes and edges. It starts with one of the
/// start nodes and ends just before the current node or edge:
///
/// - node callbacks see a path whose last step is the edge that was crossed
///   to reach the node (the path is empty for start nodes)
/// - edge callbacks see a path whose last step is the node from which the
///   edge is crossed
#[derive(Debug)]
pub struct Path<'a, N, L> {
    steps: SmallVec<[Step<'a, N, L>; 32]>,
}

impl<'a, N, L> Path<'a, N, L> {
    fn new() -> Self {
        Self {
            steps: SmallVec::new(),
        }
    }

    fn push(&mut self, step: Step<'a, N, L>) {
        self.steps.push(step);
    }

    fn pop(&mut self) {
        self.steps.pop();
    }

    /// Returns the number of steps (nodes and edges)
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the path has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All steps of the path
    pub fn steps(&self) -> &[Step<'a, N, L>] {
        &self.steps
    }

    /// Iterates the nodes of the path, beginning with the start node
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &'a N> + '_ {
        self.steps.iter().filter_map(|step| match step {
            Step::Node(node) => Some(*node),
            Step::Edge { .. } => None,
        })
    }

    /// Returns the number of nodes in the path
    pub fn node_count(&self) -> usize {
        (self.steps.len() + 1) / 2
    }
}

/// Callbacks of a [`Dag::traverse`]
///
/// All methods have a default implementation that does nothing, so
/// visitors only implement the hooks they need. Implementors keep their
/// own state and never mutate the graph during the traversal.
///
/// The `before_*` hooks return whether the traversal should continue:
/// `false` from [`Visitor::before_node`] skips the node and everything
/// below it, `false` from [`Visitor::before_edge`] skips crossing the edge
/// and `false` from [`Visitor::before_traverse`] aborts the traversal.
///
/// Edge hooks always receive `parent` and `child` in graph orientation,
/// independent of the traversal direction.
pub trait Visitor<N, L> {
    /// Invoked once before the first node is visited
    fn before_traverse(&mut self, _dag: &Dag<N, L>, _start: &[N], _direction: Direction) -> bool {
        true
    }

    /// Invoked once after the traversal ended
    fn after_traverse(&mut self, _dag: &Dag<N, L>) {}

    /// Invoked when a node is reached, before any of its edges are crossed
    fn before_node(&mut self, _dag: &Dag<N, L>, _node: &N, _path: &Path<'_, N, L>) -> bool {
        true
    }

    /// Invoked after all edges of the node were crossed
    fn after_node(&mut self, _dag: &Dag<N, L>, _node: &N, _path: &Path<'_, N, L>) {}

    /// Invoked before an edge is crossed
    fn before_edge(
        &mut self,
        _dag: &Dag<N, L>,
        _parent: &N,
        _child: &N,
        _data: &L,
        _path: &Path<'_, N, L>,
    ) -> bool {
        true
    }

    /// Invoked after an edge was crossed
    ///
    /// This hook also fires if the node behind the edge was already visited
    /// earlier in the traversal, its state is complete at that point.
    fn after_edge(
        &mut self,
        _dag: &Dag<N, L>,
        _parent: &N,
        _child: &N,
        _data: &L,
        _path: &Path<'_, N, L>,
    ) {
    }
}

struct Walker<'a, N, L> {
    dag: &'a Dag<N, L>,
    direction: Direction,
    all_paths: bool,
    visited: HashSet<&'a N>,
    path: Path<'a, N, L>,
}

impl<'a, N: Node, L> Walker<'a, N, L> {
    fn reach<V: Visitor<N, L> + ?Sized>(&mut self, node: &'a N, visitor: &mut V) {
        let dag = self.dag;
        let Some((node, edges)) = dag.neighbours(node, self.direction) else {
            return;
        };
        if !visitor.before_node(dag, node, &self.path) {
            return;
        }
        self.path.push(Step::Node(node));
        self.visited.insert(node);

        for (other, data) in edges {
            let (parent, child) = match self.direction {
                Direction::Forward => (node, other),
                Direction::Reverse => (other, node),
            };
            if !visitor.before_edge(dag, parent, child, data, &self.path) {
                continue;
            }
            if self.all_paths || !self.visited.contains(other) {
                self.path.push(Step::Edge {
                    from: node,
                    to: other,
                    data,
                });
                self.reach(other, visitor);
                self.path.pop();
            }
            visitor.after_edge(dag, parent, child, data, &self.path);
        }

        self.path.pop();
        visitor.after_node(dag, node, &self.path);
    }
}

impl<N: Node, L> Dag<N, L> {
    /// Visits the graph depth-first and calls the hooks of `visitor`
    ///
    /// The traversal starts at every start node of `traversal` that was
    /// not yet visited. Siblings are visited in the insertion order of
    /// their edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use ontoenrich::dag::{Dag, Path, Traversal, Visitor};
    ///
    /// struct Depth(Vec<(u8, usize)>);
    ///
    /// impl Visitor<u8, ()> for Depth {
    ///     fn before_node(&mut self, _: &Dag<u8, ()>, node: &u8, path: &Path<'_, u8, ()>) -> bool {
    ///         self.0.push((*node, path.node_count()));
    ///         true
    ///     }
    /// }
    ///
    /// let mut dag = Dag::new();
    /// dag.add_edge(1u8, 2u8, ()).unwrap();
    /// dag.add_edge(2u8, 3u8, ()).unwrap();
    ///
    /// let mut depth = Depth(Vec::new());
    /// dag.traverse(&Traversal::forward(), &mut depth);
    /// assert_eq!(depth.0, vec![(1, 0), (2, 1), (3, 2)]);
    /// ```
    pub fn traverse<V: Visitor<N, L> + ?Sized>(&self, traversal: &Traversal<N>, visitor: &mut V) {
        let start = traversal.start_nodes(self);
        if !visitor.before_traverse(self, &start, traversal.direction()) {
            return;
        }
        let mut walker = Walker {
            dag: self,
            direction: traversal.direction(),
            all_paths: traversal.is_all_paths(),
            visited: HashSet::new(),
            path: Path::new(),
        };
        for node in &start {
            if let Some((node, _)) = self.nodes.get_key_value(node) {
                if !walker.visited.contains(node) {
                    walker.reach(node, visitor);
                }
            }
        }
        visitor.after_traverse(self);
    }
}
