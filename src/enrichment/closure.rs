use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::annotations::{Annotation, AnnotationSet, ObjectId};
use crate::dag::{union_into, Dag, Path, Traversal, Visitor};
use crate::ontology::{Ontology, Relation, TermId};
use crate::EnrichResult;

/// Maps every term to the objects annotated to the term or a descendant
pub type TermClosure = HashMap<TermId, HashSet<ObjectId>>;

/// Collects the annotated objects of every term of a namespace
///
/// Every term starts with the objects of its own annotations that pass
/// the annotation filter. After crossing an edge, the child's objects are
/// added to the parent. Only edges that propagate annotations (`is_a` and
/// `part_of`) are crossed, so annotations never travel across `regulates`
/// relations.
///
/// # Examples
///
/// ```
/// use ontoenrich::enrichment::AnnotationClosure;
/// use ontoenrich::{Annotation, AnnotationSet, Ontology, Relation};
///
/// let mut ontology = Ontology::default();
/// for (id, name) in [("T:1", "root"), ("T:2", "child"), ("T:3", "regulated")] {
///     ontology.add_term(id, name);
///     ontology.set_namespace(id, "process").unwrap();
/// }
/// ontology.add_relationship("T:2", Relation::IsA, "T:1").unwrap();
/// ontology.add_relationship("T:3", Relation::Regulates, "T:2").unwrap();
/// ontology.finalize().unwrap();
///
/// let mut annotations = AnnotationSet::default();
/// annotations.push(Annotation::new("DB", "o1", "A", "T:2", "IDA"));
/// annotations.push(Annotation::new("DB", "o2", "B", "T:3", "IDA"));
/// annotations.push(Annotation::new("DB", "o3", "C", "T:2", "IEA"));
///
/// let closure = AnnotationClosure::new(&annotations, |a: &Annotation| a.evidence_code() != "IEA")
///     .go(&ontology, "process")
///     .unwrap();
///
/// assert_eq!(closure["T:1"].len(), 1);
/// assert!(closure["T:1"].contains("o1"));
/// // T:3 is only linked by a regulates relation
/// assert!(!closure.contains_key("T:3"));
/// ```
pub struct AnnotationClosure<'a, F> {
    annotations: &'a AnnotationSet,
    filter: F,
    closure: TermClosure,
}

impl<'a, F: Fn(&Annotation) -> bool> AnnotationClosure<'a, F> {
    /// Constructs a closure that only includes annotations passing `filter`
    pub fn new(annotations: &'a AnnotationSet, filter: F) -> Self {
        Self {
            annotations,
            filter,
            closure: HashMap::new(),
        }
    }

    /// Traverses the namespace from its roots and returns the closure
    ///
    /// # Errors
    ///
    /// [`EnrichError::MissingRoot`](crate::EnrichError::MissingRoot) if the namespace has no root
    pub fn go(mut self, ontology: &Ontology, namespace: &str) -> EnrichResult<TermClosure> {
        let roots = ontology.roots(namespace)?;
        let traversal = Traversal::forward().from_nodes(roots.iter().cloned());
        ontology.dag().traverse(&traversal, &mut self);
        debug!(
            "Annotation closure of {} contains {} terms",
            namespace,
            self.closure.len()
        );
        Ok(self.closure)
    }
}

impl<F: Fn(&Annotation) -> bool> Visitor<TermId, Relation> for AnnotationClosure<'_, F> {
    fn before_node(
        &mut self,
        _: &Dag<TermId, Relation>,
        term: &TermId,
        _: &Path<'_, TermId, Relation>,
    ) -> bool {
        let objects = self
            .annotations
            .annotations_for_term(term.as_str())
            .iter()
            .filter(|annotation| (self.filter)(*annotation))
            .map(|annotation| annotation.object_id().clone())
            .collect();
        self.closure.insert(term.clone(), objects);
        true
    }

    fn before_edge(
        &mut self,
        _: &Dag<TermId, Relation>,
        _: &TermId,
        _: &TermId,
        relation: &Relation,
        _: &Path<'_, TermId, Relation>,
    ) -> bool {
        relation.propagates_annotations()
    }

    fn after_edge(
        &mut self,
        _: &Dag<TermId, Relation>,
        parent: &TermId,
        child: &TermId,
        _: &Relation,
        _: &Path<'_, TermId, Relation>,
    ) {
        union_into(&mut self.closure, parent, child);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    //        R
    //      /   \
    //     A     B
    //      \   / \ (part_of)
    //        C    D
    //        :
    //        E (regulates C)
    fn ontology() -> Ontology {
        let mut ontology = Ontology::default();
        for id in ["R", "A", "B", "C", "D", "E"] {
            ontology.add_term(id, &format!("term {id}"));
            ontology.set_namespace(id, "ns").unwrap();
        }
        ontology.add_relationship("A", Relation::IsA, "R").unwrap();
        ontology.add_relationship("B", Relation::IsA, "R").unwrap();
        ontology.add_relationship("C", Relation::IsA, "A").unwrap();
        ontology.add_relationship("C", Relation::IsA, "B").unwrap();
        ontology.add_relationship("D", Relation::PartOf, "B").unwrap();
        ontology.add_relationship("E", Relation::Regulates, "C").unwrap();
        ontology.finalize().unwrap();
        ontology
    }

    fn annotations() -> AnnotationSet {
        let mut annotations = AnnotationSet::default();
        annotations.push(Annotation::new("DB", "c1", "c1", "C", "IDA"));
        annotations.push(Annotation::new("DB", "d1", "d1", "D", "IDA"));
        annotations.push(Annotation::new("DB", "e1", "e1", "E", "IDA"));
        annotations.push(Annotation::new("DB", "a1", "a1", "A", "IDA").with_qualifier("NOT"));
        annotations.push(Annotation::new("DB", "r1", "r1", "R", "IEA"));
        annotations
    }

    fn ids(set: &HashSet<ObjectId>) -> Vec<&str> {
        let mut ids: Vec<&str> = set.iter().map(ObjectId::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn everything(_: &Annotation) -> bool {
        true
    }

    #[test]
    fn collects_descendant_objects() {
        let annotations = annotations();
        let closure = AnnotationClosure::new(&annotations, everything)
            .go(&ontology(), "ns")
            .unwrap();
        assert_eq!(ids(&closure["C"]), vec!["c1"]);
        assert_eq!(ids(&closure["A"]), vec!["a1", "c1"]);
        assert_eq!(ids(&closure["B"]), vec!["c1", "d1"]);
        assert_eq!(ids(&closure["R"]), vec!["a1", "c1", "d1", "r1"]);
    }

    #[test]
    fn regulates_edges_are_not_crossed() {
        let annotations = annotations();
        let closure = AnnotationClosure::new(&annotations, everything)
            .go(&ontology(), "ns")
            .unwrap();
        // E is only connected through a regulates edge
        assert!(!closure.contains_key("E"));
        assert!(!closure["C"].contains("e1"));
        assert!(!closure["R"].contains("e1"));
    }

    #[test]
    fn filtered_annotations() {
        let annotations = annotations();
        let filter = |a: &Annotation| !a.is_negated() && a.evidence_code() != "IEA";
        let closure = AnnotationClosure::new(&annotations, filter)
            .go(&ontology(), "ns")
            .unwrap();
        assert_eq!(ids(&closure["A"]), vec!["c1"]);
        assert_eq!(ids(&closure["R"]), vec!["c1", "d1"]);
    }

    #[test]
    fn parents_contain_their_children() {
        let annotations = annotations();
        let ontology = ontology();
        let closure = AnnotationClosure::new(&annotations, everything)
            .go(&ontology, "ns")
            .unwrap();
        for (parent, child, relation) in ontology.dag().edges() {
            if !relation.propagates_annotations() {
                continue;
            }
            assert!(closure[parent].is_superset(&closure[child]));
        }
    }

    #[test]
    fn unknown_namespace() {
        let annotations = annotations();
        assert!(AnnotationClosure::new(&annotations, everything)
            .go(&ontology(), "nope")
            .is_err());
    }
}
