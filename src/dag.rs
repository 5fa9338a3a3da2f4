//! Directed acyclic graphs and visitor driven traversals
//!
//! A [`Dag`] stores nodes of any hashable type and directed edges between
//! them. Each edge carries an arbitrary label, e.g. the relationship type
//! of an ontology (`is_a`, `part_of`, ...).
//!
//! All higher level graph operations are implemented as a [`Visitor`] of
//! one generic depth-first traversal ([`Dag::traverse`]):
//!
//! - [`Closure`]: all descendants (or ancestors) of every node
//! - [`SubgraphExtractor`]: a new graph of everything reachable from some nodes
//! - [`RedundantEdgeFinder`]: edges that are implied by a longer path
//! - [`SimplePruner`]: removes nodes and edges that match a filter
//! - [`DagMapper`]: an isomorphic, filtered or relabeled copy of a graph
//!
//! # Examples
//!
//! ```
//! use ontoenrich::dag::{Closure, Dag, Traversal};
//!
//! //     a
//! //    / \
//! //   b   c
//! //  / \ / \
//! // x   d   y
//! let mut dag: Dag<&str> = Dag::new();
//! dag.add_edge("a", "b", ()).unwrap();
//! dag.add_edge("a", "c", ()).unwrap();
//! dag.add_edge("b", "d", ()).unwrap();
//! dag.add_edge("c", "d", ()).unwrap();
//! dag.add_edge("b", "x", ()).unwrap();
//! dag.add_edge("c", "y", ()).unwrap();
//!
//! assert!(dag.is_root(&"a"));
//! assert_eq!(dag.leaves().count(), 3);
//!
//! // edges that would close a cycle are rejected
//! assert!(dag.add_edge("d", "a", ()).is_err());
//!
//! let ancestors = Closure::new().go(&dag, &Traversal::reverse());
//! assert_eq!(ancestors[&"d"].len(), 4);
//! ```
use core::fmt::Debug;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use indexmap::map::Iter as EdgeIter;
use indexmap::IndexMap;

use crate::{EnrichError, EnrichResult};

mod closure;
mod mapper;
mod prune;
mod redundant;
mod subgraph;
mod traversal;

pub use closure::Closure;
pub use mapper::DagMapper;
pub use prune::{Pruned, SimplePruner};
pub use redundant::RedundantEdgeFinder;
pub use subgraph::SubgraphExtractor;
pub use traversal::{Direction, Path, Step, Traversal, Visitor};

/// Types that can be used as nodes of a [`Dag`]
///
/// Nodes are compared by value, so every node must have a stable identity
/// for the lifetime of the graph.
pub trait Node: Clone + Debug + Eq + Hash {}

impl<T: Clone + Debug + Eq + Hash> Node for T {}

#[derive(Debug, Clone)]
struct Links<N, L> {
    parents: IndexMap<N, L>,
    children: IndexMap<N, L>,
}

impl<N, L> Default for Links<N, L> {
    fn default() -> Self {
        Self {
            parents: IndexMap::new(),
            children: IndexMap::new(),
        }
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// A directed acyclic graph
///
/// Every edge is stored twice, in the `children` of the parent and in the
/// `parents` of the child. Nodes and edges iterate in insertion order.
///
/// ```mermaid
/// graph TD
/// a --> b
/// a --> c
/// b --> d
/// c --> d
/// b -- 99 --> x
/// c --> y
/// ```
///
/// The graph is guaranteed to be acyclic as long as edges are only added
/// through [`Dag::add_edge`]. [`Dag::add_edge_unchecked`] skips the check
/// and is meant for bulk loading of data that is known to be acyclic.
#[derive(Debug, Clone)]
pub struct Dag<N, L = ()> {
    nodes: IndexMap<N, Links<N, L>>,
}

impl<N, L> Default for Dag<N, L> {
    fn default() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }
}

/// Structuring methods
impl<N: Node, L> Dag<N, L> {
    /// Constructs a new, empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node to the graph
    ///
    /// Returns whether the node was newly inserted
    pub fn add_node(&mut self, node: N) -> bool {
        if self.nodes.contains_key(&node) {
            return false;
        }
        self.nodes.insert(node, Links::default());
        true
    }

    /// Removes the node and all edges from and to it
    ///
    /// # Errors
    ///
    /// [`EnrichError::DoesNotExist`] if the node is not part of the graph
    pub fn remove_node(&mut self, node: &N) -> EnrichResult<()> {
        let links = self
            .nodes
            .shift_remove(node)
            .ok_or_else(|| EnrichError::DoesNotExist(format!("{node:?}")))?;
        for parent in links.parents.keys() {
            if let Some(parent_links) = self.nodes.get_mut(parent) {
                parent_links.children.shift_remove(node);
            }
        }
        for child in links.children.keys() {
            if let Some(child_links) = self.nodes.get_mut(child) {
                child_links.parents.shift_remove(node);
            }
        }
        Ok(())
    }

    /// Removes the edge from `parent` to `child` and returns its label
    ///
    /// # Errors
    ///
    /// [`EnrichError::DoesNotExist`] if there is no such edge
    pub fn remove_edge(&mut self, parent: &N, child: &N) -> EnrichResult<L> {
        let missing = || EnrichError::DoesNotExist(format!("edge {parent:?} -> {child:?}"));
        let data = self
            .nodes
            .get_mut(parent)
            .and_then(|links| links.children.shift_remove(child))
            .ok_or_else(missing)?;
        if let Some(links) = self.nodes.get_mut(child) {
            links.parents.shift_remove(parent);
        }
        Ok(data)
    }

    /// Removes all nodes and edges
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl<N: Node, L: Clone> Dag<N, L> {
    /// Adds an edge from `parent` to `child`
    ///
    /// Missing nodes are added to the graph. If the edge already exists,
    /// its label is replaced.
    ///
    /// # Errors
    ///
    /// [`EnrichError::Cycle`] if `child` is `parent` itself or one of its
    /// ancestors. The graph is not modified in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use ontoenrich::Dag;
    ///
    /// let mut dag: Dag<u32, &str> = Dag::new();
    /// dag.add_edge(1, 2, "is_a").unwrap();
    /// dag.add_edge(2, 3, "part_of").unwrap();
    ///
    /// assert!(dag.add_edge(3, 1, "is_a").is_err());
    /// assert!(dag.add_edge(3, 3, "is_a").is_err());
    /// assert!(!dag.has_edge(&3, &1));
    /// assert_eq!(dag.edge(&2, &3), Some(&"part_of"));
    /// ```
    pub fn add_edge(&mut self, parent: N, child: N, data: L) -> EnrichResult<()> {
        if parent == child || self.is_ancestor(&child, &parent) {
            return Err(EnrichError::Cycle {
                parent: format!("{parent:?}"),
                child: format!("{child:?}"),
            });
        }
        self.add_edge_unchecked(parent, child, data);
        Ok(())
    }

    /// Adds an edge without checking for cycles
    ///
    /// Callers must guarantee that the edge does not close a cycle,
    /// traversals of a cyclic graph do not terminate.
    pub fn add_edge_unchecked(&mut self, parent: N, child: N, data: L) {
        self.add_node(parent.clone());
        self.add_node(child.clone());
        if let Some(links) = self.nodes.get_mut(&parent) {
            links.children.insert(child.clone(), data.clone());
        }
        if let Some(links) = self.nodes.get_mut(&child) {
            links.parents.insert(parent, data);
        }
    }
}

/// Inquiry and iteration methods
impl<N: Node, L> Dag<N, L> {
    /// Returns the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `node` is in the graph
    pub fn has_node(&self, node: &N) -> bool {
        self.nodes.contains_key(node)
    }

    /// Returns `true` if there is an edge from `parent` to `child`
    pub fn has_edge(&self, parent: &N, child: &N) -> bool {
        self.edge(parent, child).is_some()
    }

    /// Returns the label of the edge from `parent` to `child`
    pub fn edge(&self, parent: &N, child: &N) -> Option<&L> {
        self.nodes
            .get(parent)
            .and_then(|links| links.children.get(child))
    }

    /// Returns `true` if `node` is in the graph and has no parents
    pub fn is_root(&self, node: &N) -> bool {
        self.nodes
            .get(node)
            .map_or(false, |links| links.parents.is_empty())
    }

    /// Returns `true` if `node` is in the graph and has no children
    pub fn is_leaf(&self, node: &N) -> bool {
        self.nodes
            .get(node)
            .map_or(false, |links| links.children.is_empty())
    }

    /// Returns `true` if `node` is in the graph and has both parents and children
    pub fn is_interior(&self, node: &N) -> bool {
        self.has_node(node) && !(self.is_root(node) || self.is_leaf(node))
    }

    /// Returns `true` if `node` is a direct child of `other`
    pub fn is_child(&self, node: &N, other: &N) -> bool {
        self.has_edge(other, node)
    }

    /// Returns `true` if `node` is a direct parent of `other`
    pub fn is_parent(&self, node: &N, other: &N) -> bool {
        self.has_edge(node, other)
    }

    /// Returns `true` if `node` is a direct or indirect parent of `other`
    ///
    /// # Examples
    ///
    /// ```
    /// use ontoenrich::Dag;
    ///
    /// let mut dag: Dag<char> = Dag::new();
    /// dag.add_edge('a', 'b', ()).unwrap();
    /// dag.add_edge('b', 'c', ()).unwrap();
    ///
    /// assert!(dag.is_ancestor(&'a', &'c'));
    /// assert!(dag.is_descendant(&'c', &'a'));
    /// assert!(!dag.is_ancestor(&'c', &'a'));
    /// assert!(!dag.is_ancestor(&'a', &'a'));
    /// ```
    pub fn is_ancestor(&self, node: &N, other: &N) -> bool {
        let mut seen: HashSet<&N> = HashSet::new();
        let mut stack: Vec<&N> = self.parents(other).collect();
        while let Some(current) = stack.pop() {
            if current == node {
                return true;
            }
            if seen.insert(current) {
                stack.extend(self.parents(current));
            }
        }
        false
    }

    /// Returns `true` if `node` is a direct or indirect child of `other`
    pub fn is_descendant(&self, node: &N, other: &N) -> bool {
        self.is_ancestor(other, node)
    }

    /// Iterates all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.keys()
    }

    /// Iterates all nodes without parents
    pub fn roots(&self) -> impl Iterator<Item = &N> {
        self.nodes
            .iter()
            .filter(|(_, links)| links.parents.is_empty())
            .map(|(node, _)| node)
    }

    /// Iterates all nodes without children
    pub fn leaves(&self) -> impl Iterator<Item = &N> {
        self.nodes
            .iter()
            .filter(|(_, links)| links.children.is_empty())
            .map(|(node, _)| node)
    }

    /// Iterates the direct parents of `node`
    ///
    /// The iterator is empty if the node is not in the graph
    pub fn parents(&self, node: &N) -> impl Iterator<Item = &N> {
        self.in_edges(node).map(|(parent, _)| parent)
    }

    /// Iterates the direct children of `node`
    ///
    /// The iterator is empty if the node is not in the graph
    pub fn children(&self, node: &N) -> impl Iterator<Item = &N> {
        self.out_edges(node).map(|(child, _)| child)
    }

    /// Iterates the parents of `node` together with the edge label
    pub fn in_edges(&self, node: &N) -> impl Iterator<Item = (&N, &L)> {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|links| links.parents.iter())
    }

    /// Iterates the children of `node` together with the edge label
    pub fn out_edges(&self, node: &N) -> impl Iterator<Item = (&N, &L)> {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|links| links.children.iter())
    }

    /// Iterates all edges as `(parent, child, label)`
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N, &L)> {
        self.nodes.iter().flat_map(|(parent, links)| {
            links
                .children
                .iter()
                .map(move |(child, data)| (parent, child, data))
        })
    }

    /// Returns the stored key of `node` and the edges in traversal direction
    fn neighbours(&self, node: &N, direction: Direction) -> Option<(&N, EdgeIter<'_, N, L>)> {
        self.nodes.get_key_value(node).map(|(key, links)| {
            let edges = match direction {
                Direction::Forward => links.children.iter(),
                Direction::Reverse => links.parents.iter(),
            };
            (key, edges)
        })
    }
}

/// Adds all members of the set at `source` to the set at `target`
///
/// Used by closure visitors to accumulate a child's set into its parent.
pub(crate) fn union_into<K, T>(sets: &mut HashMap<K, HashSet<T>>, target: &K, source: &K)
where
    K: Eq + Hash,
    T: Clone + Eq + Hash,
{
    if target == source {
        return;
    }
    // the source set is taken out temporarily, two entries of one map
    // cannot be borrowed at the same time
    let Some((key, from)) = sets.remove_entry(source) else {
        return;
    };
    if let Some(into) = sets.get_mut(target) {
        into.extend(from.iter().cloned());
    }
    sets.insert(key, from);
}
