//! The in-memory ontology
//!
//! An [`Ontology`] is a [`Dag`] of [`TermId`]s with [`Relation`] labeled
//! edges, plus the [`Term`] data of each node. Every term belongs to a
//! [`Namespace`] (e.g. `biological_process` in the Gene Ontology) and each
//! namespace has its own root term(s).
use core::fmt::Debug;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::dag::{Dag, SimplePruner, Traversal};
use crate::parser;
use crate::{next_generation, EnrichError, EnrichResult};

mod config;
mod term;

pub use config::OntologyConfig;
pub use term::{Relation, Term};

shared_str_id!(
    /// Identifier of a [`Term`], e.g. `GO:0008150`
    TermId
);

shared_str_id!(
    /// The namespace of a [`Term`], e.g. `biological_process`
    Namespace
);

/// Header values of an OBO file
///
/// Tags without a dedicated field are kept in [`OboHeader::other`] in
/// file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OboHeader {
    pub format_version: Option<String>,
    pub data_version: Option<String>,
    pub date: Option<String>,
    pub saved_by: Option<String>,
    pub default_namespace: Option<String>,
    pub ontology: Option<String>,
    pub other: Vec<(String, String)>,
}

impl OboHeader {
    /// Stores a header tag
    ///
    /// Repeated single-value tags keep the last value.
    pub fn set(&mut self, tag: &str, value: &str) {
        let value = value.to_string();
        match tag {
            "format-version" => self.format_version = Some(value),
            "data-version" => self.data_version = Some(value),
            "date" => self.date = Some(value),
            "saved-by" => self.saved_by = Some(value),
            "default-namespace" => self.default_namespace = Some(value),
            "ontology" => self.ontology = Some(value),
            _ => self.other.push((tag.to_string(), value)),
        }
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// An ontology of [`Term`]s, split into namespaces
///
/// ```mermaid
/// graph TD
/// GO:0008150["GO:0008150<br>biological_process"]
/// GO:0009987["GO:0009987<br>cellular process"]
/// GO:0003674["GO:0003674<br>molecular_function"]
/// GO:0005488["GO:0005488<br>binding"]
/// GO:0008150 -- is_a --> GO:0009987
/// GO:0003674 -- is_a --> GO:0005488
/// ```
///
/// Ontologies are usually loaded from an OBO file with
/// [`Ontology::from_obo`], but can also be built term by term.
///
/// # Examples
///
/// ```
/// use ontoenrich::{Ontology, Relation};
///
/// let mut ontology = Ontology::default();
/// ontology.add_term("X:1", "root");
/// ontology.add_term("X:2", "child");
/// ontology.set_namespace("X:1", "process").unwrap();
/// ontology.set_namespace("X:2", "process").unwrap();
/// ontology.add_relationship("X:2", Relation::IsA, "X:1").unwrap();
/// ontology.finalize().unwrap();
///
/// assert_eq!(ontology.len(), 2);
/// assert_eq!(ontology.roots("process").unwrap()[0].as_str(), "X:1");
/// assert!(ontology.dag().is_ancestor(&"X:1".into(), &"X:2".into()));
/// ```
pub struct Ontology {
    config: OntologyConfig,
    header: OboHeader,
    dag: Dag<TermId, Relation>,
    terms: HashMap<TermId, Term>,
    namespaces: IndexSet<Namespace>,
    roots: OnceLock<HashMap<Namespace, Vec<TermId>>>,
    generation: u64,
}

impl Default for Ontology {
    fn default() -> Self {
        Self::new(OntologyConfig::default())
    }
}

impl Debug for Ontology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ontology {} with {} terms in {} namespaces",
            self.config.name(),
            self.terms.len(),
            self.namespaces.len()
        )
    }
}

/// Loading and inquiry
impl Ontology {
    /// Constructs a new, empty ontology
    pub fn new(config: OntologyConfig) -> Self {
        Self {
            config,
            header: OboHeader::default(),
            dag: Dag::new(),
            terms: HashMap::new(),
            namespaces: IndexSet::new(),
            roots: OnceLock::new(),
            generation: next_generation(),
        }
    }

    /// Loads an ontology from an OBO file
    ///
    /// Edges between terms of different namespaces are removed after loading.
    ///
    /// # Errors
    ///
    /// - [`EnrichError::CannotOpenFile`] if the file cannot be read
    /// - [`EnrichError::InvalidInput`] if a term stanza has no `id`
    /// - [`EnrichError::MissingRoot`] if a namespace has no root term
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ontoenrich::Ontology;
    /// use ontoenrich::ontology::OntologyConfig;
    ///
    /// let config = OntologyConfig::new("GO").cull_obsolete(true);
    /// let ontology = Ontology::from_obo("go-basic.obo", config).unwrap();
    /// assert!(ontology.namespaces().count() == 3);
    /// ```
    pub fn from_obo<P: AsRef<Path>>(path: P, config: OntologyConfig) -> EnrichResult<Self> {
        parser::obo::load_file(path.as_ref(), config)
    }

    /// Loads an ontology from OBO formatted data
    ///
    /// # Errors
    ///
    /// Same as [`Ontology::from_obo`]
    pub fn from_obo_reader<R: BufRead>(reader: R, config: OntologyConfig) -> EnrichResult<Self> {
        parser::obo::load(reader, config)
    }

    pub fn config(&self) -> &OntologyConfig {
        &self.config
    }

    pub fn header(&self) -> &OboHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut OboHeader {
        &mut self.header
    }

    /// Returns the number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if the ontology has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The term structure of the ontology
    pub fn dag(&self) -> &Dag<TermId, Relation> {
        &self.dag
    }

    pub fn term(&self, id: &str) -> Option<&Term> {
        self.terms.get(id)
    }

    pub fn has_term(&self, id: &str) -> bool {
        self.terms.contains_key(id)
    }

    /// Iterates all terms in arbitrary order
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.values()
    }

    /// Iterates all namespaces in the order they were first used
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.iter()
    }

    /// Returns the link to a term, as configured in [`OntologyConfig::with_link_url`]
    pub fn term_url(&self, id: &str) -> Option<String> {
        self.config.url_for(id)
    }

    /// A number that changes whenever the ontology is modified
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the root terms of a namespace
    ///
    /// Roots are terms without parents. Obsolete roots are ignored.
    /// The roots of all namespaces are cached on first access.
    ///
    /// # Errors
    ///
    /// [`EnrichError::MissingRoot`] if the namespace has no root
    pub fn roots(&self, namespace: &str) -> EnrichResult<&[TermId]> {
        self.roots
            .get_or_init(|| self.collect_roots())
            .get(namespace)
            .map(Vec::as_slice)
            .ok_or_else(|| EnrichError::MissingRoot(namespace.to_string()))
    }

    fn collect_roots(&self) -> HashMap<Namespace, Vec<TermId>> {
        let mut roots: HashMap<Namespace, Vec<TermId>> = HashMap::new();
        for id in self.dag.roots() {
            let Some(term) = self.terms.get(id) else {
                continue;
            };
            if term.is_obsolete() {
                continue;
            }
            match term.namespace() {
                Some(namespace) => roots.entry(namespace.clone()).or_default().push(id.clone()),
                None => warn!("Root term {} has no namespace", id),
            }
        }
        roots
    }
}

/// Building methods
///
/// Every modification resets the cached roots and gives the ontology
/// a new [`Ontology::generation`].
impl Ontology {
    fn touch(&mut self) {
        self.roots.take();
        self.generation = next_generation();
    }

    fn term_mut(&mut self, id: &str) -> EnrichResult<&mut Term> {
        self.terms
            .get_mut(id)
            .ok_or_else(|| EnrichError::DoesNotExist(format!("term {id}")))
    }

    /// Adds a term to the ontology
    ///
    /// If the term exists already, it is not changed.
    pub fn add_term(&mut self, id: &str, name: &str) -> TermId {
        if let Some((id, _)) = self.terms.get_key_value(id) {
            return id.clone();
        }
        let id = TermId::new(id);
        self.terms.insert(id.clone(), Term::new(id.clone(), name));
        self.dag.add_node(id.clone());
        self.touch();
        id
    }

    /// Renames a term
    ///
    /// # Errors
    ///
    /// [`EnrichError::DoesNotExist`] if the term is not present
    pub fn set_name(&mut self, id: &str, name: &str) -> EnrichResult<()> {
        self.term_mut(id)?.set_name(name);
        self.touch();
        Ok(())
    }

    /// Moves a term into a namespace, the namespace is created on first use
    ///
    /// # Errors
    ///
    /// [`EnrichError::DoesNotExist`] if the term is not present
    pub fn set_namespace(&mut self, id: &str, namespace: &str) -> EnrichResult<()> {
        let namespace = match self.namespaces.get(namespace) {
            Some(existing) => existing.clone(),
            None => {
                let created = Namespace::new(namespace);
                self.namespaces.insert(created.clone());
                created
            }
        };
        self.term_mut(id)?.set_namespace(namespace);
        self.touch();
        Ok(())
    }

    /// # Errors
    ///
    /// [`EnrichError::DoesNotExist`] if the term is not present
    pub fn set_obsolete(&mut self, id: &str, obsolete: bool) -> EnrichResult<()> {
        self.term_mut(id)?.set_obsolete(obsolete);
        self.touch();
        Ok(())
    }

    /// # Errors
    ///
    /// [`EnrichError::DoesNotExist`] if the term is not present
    pub fn set_definition(&mut self, id: &str, definition: String) -> EnrichResult<()> {
        self.term_mut(id)?.set_definition(definition);
        self.touch();
        Ok(())
    }

    /// Links `child` to `parent`
    ///
    /// The edge is not checked for cycles, which keeps bulk loading fast.
    /// Use [`Ontology::add_relationship_checked`] for untrusted input.
    ///
    /// # Errors
    ///
    /// [`EnrichError::DoesNotExist`] if one of the terms is not present
    pub fn add_relationship(
        &mut self,
        child: &str,
        relation: Relation,
        parent: &str,
    ) -> EnrichResult<()> {
        let (child, parent) = self.term_pair(child, parent)?;
        self.dag.add_edge_unchecked(parent, child, relation);
        self.touch();
        Ok(())
    }

    /// Links `child` to `parent` unless that would create a cycle
    ///
    /// # Errors
    ///
    /// - [`EnrichError::DoesNotExist`] if one of the terms is not present
    /// - [`EnrichError::Cycle`] if `child` is an ancestor of `parent`
    pub fn add_relationship_checked(
        &mut self,
        child: &str,
        relation: Relation,
        parent: &str,
    ) -> EnrichResult<()> {
        let (child, parent) = self.term_pair(child, parent)?;
        self.dag.add_edge(parent, child, relation)?;
        self.touch();
        Ok(())
    }

    fn term_pair(&self, child: &str, parent: &str) -> EnrichResult<(TermId, TermId)> {
        let lookup = |id: &str| {
            self.terms
                .get_key_value(id)
                .map(|(id, _)| id.clone())
                .ok_or_else(|| EnrichError::DoesNotExist(format!("term {id}")))
        };
        Ok((lookup(child)?, lookup(parent)?))
    }

    /// Removes all edges that connect terms of different namespaces
    ///
    /// Returns the number of removed edges
    pub fn prune_cross_namespace_edges(&mut self) -> usize {
        let terms = &self.terms;
        let namespace = |id: &TermId| terms.get(id).and_then(Term::namespace);
        let pruned = SimplePruner::new()
            .edge_filter(|parent: &TermId, child: &TermId, _: &Relation| {
                namespace(parent) != namespace(child)
            })
            .prune(&mut self.dag, &Traversal::forward());
        let count = pruned.edges.len();
        if count > 0 {
            warn!("Removed {} edges between namespaces", count);
            self.touch();
        }
        count
    }

    /// Prepares a fully loaded ontology for analysis
    ///
    /// Removes edges between namespaces and checks that every namespace
    /// has at least one root term.
    ///
    /// # Errors
    ///
    /// [`EnrichError::MissingRoot`] if a namespace has no root
    pub fn finalize(&mut self) -> EnrichResult<()> {
        self.prune_cross_namespace_edges();
        for namespace in &self.namespaces {
            let roots = self.roots(namespace.as_str())?;
            debug!("Namespace {} has {} root(s)", namespace, roots.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ontology() -> Ontology {
        let mut ont = Ontology::new(OntologyConfig::new("test").with_link_url("http://x/%s"));
        for (id, name, ns) in [
            ("P:1", "process", "process"),
            ("P:2", "metabolism", "process"),
            ("P:3", "regulation of metabolism", "process"),
            ("F:1", "function", "function"),
            ("F:2", "binding", "function"),
        ] {
            ont.add_term(id, name);
            ont.set_namespace(id, ns).unwrap();
        }
        ont.add_relationship("P:2", Relation::IsA, "P:1").unwrap();
        ont.add_relationship("P:3", Relation::Regulates, "P:2").unwrap();
        ont.add_relationship("F:2", Relation::IsA, "F:1").unwrap();
        // crosses namespaces
        ont.add_relationship("F:2", Relation::PartOf, "P:2").unwrap();
        ont
    }

    #[test]
    fn finalize_prunes_cross_namespace_edges() {
        let mut ont = ontology();
        assert_eq!(ont.dag().edges().count(), 4);
        ont.finalize().unwrap();
        assert_eq!(ont.dag().edges().count(), 3);
        assert!(!ont.dag().has_edge(&"P:2".into(), &"F:2".into()));
        assert_eq!(ont.roots("process").unwrap(), &[TermId::new("P:1")]);
        assert_eq!(ont.roots("function").unwrap(), &[TermId::new("F:1")]);
    }

    #[test]
    fn namespaces_in_order_of_use() {
        let ont = ontology();
        let ns: Vec<&str> = ont.namespaces().map(Namespace::as_str).collect();
        assert_eq!(ns, vec!["process", "function"]);
    }

    #[test]
    fn obsolete_roots_are_ignored() {
        let mut ont = ontology();
        ont.finalize().unwrap();
        ont.add_term("P:9", "obsolete thing");
        ont.set_namespace("P:9", "process").unwrap();
        ont.set_obsolete("P:9", true).unwrap();
        assert_eq!(ont.roots("process").unwrap().len(), 1);

        ont.set_obsolete("P:1", true).unwrap();
        assert!(matches!(ont.roots("process"), Err(EnrichError::MissingRoot(_))));
        assert!(ont.finalize().is_err());
    }

    #[test]
    fn missing_namespace() {
        let ont = ontology();
        assert!(matches!(ont.roots("component"), Err(EnrichError::MissingRoot(_))));
    }

    #[test]
    fn add_term_is_idempotent() {
        let mut ont = ontology();
        let generation = ont.generation();
        ont.add_term("P:1", "other name");
        assert_eq!(ont.term("P:1").unwrap().name(), "process");
        assert_eq!(ont.generation(), generation);
        ont.set_name("P:1", "other name").unwrap();
        assert_eq!(ont.term("P:1").unwrap().name(), "other name");
        assert_ne!(ont.generation(), generation);
    }

    #[test]
    fn relationships_need_existing_terms() {
        let mut ont = ontology();
        assert!(matches!(
            ont.add_relationship("P:1", Relation::IsA, "P:404"),
            Err(EnrichError::DoesNotExist(_))
        ));
        assert!(ont.set_namespace("P:404", "process").is_err());
    }

    #[test]
    fn checked_relationship_rejects_cycles() {
        let mut ont = ontology();
        assert!(matches!(
            ont.add_relationship_checked("P:1", Relation::IsA, "P:3"),
            Err(EnrichError::Cycle { .. })
        ));
        ont.add_relationship_checked("P:3", Relation::IsA, "P:1").unwrap();
        assert_eq!(ont.dag().edge(&"P:1".into(), &"P:3".into()), Some(&Relation::IsA));
    }

    #[test]
    fn term_urls() {
        let ont = ontology();
        assert_eq!(ont.term_url("P:1").unwrap(), "http://x/P:1");
        assert!(Ontology::default().term_url("P:1").is_none());
    }

    #[test]
    fn header_tags() {
        let mut header = OboHeader::default();
        header.set("format-version", "1.2");
        header.set("remark", "a");
        header.set("remark", "b");
        assert_eq!(header.format_version.as_deref(), Some("1.2"));
        assert_eq!(header.other.len(), 2);
    }
}
