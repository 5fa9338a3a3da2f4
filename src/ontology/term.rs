use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

use crate::ontology::{Namespace, TermId};
use crate::PROPAGATING_RELATIONS;

/// A single term of an [`Ontology`](crate::Ontology)
///
/// Terms do not know their parents or children, the structure is
/// kept in the ontology's [`Dag`](crate::Dag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    id: TermId,
    name: String,
    namespace: Option<Namespace>,
    obsolete: bool,
    definition: Option<String>,
}

impl Term {
    pub(crate) fn new(id: TermId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            namespace: None,
            obsolete: false,
            definition: None,
        }
    }

    pub fn id(&self) -> &TermId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace of the term
    ///
    /// Terms that are only referenced by other terms, but have no stanza
    /// of their own, do not have a namespace.
    pub fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn set_namespace(&mut self, namespace: Namespace) {
        self.namespace = Some(namespace);
    }

    pub(crate) fn set_obsolete(&mut self, obsolete: bool) {
        self.obsolete = obsolete;
    }

    pub(crate) fn set_definition(&mut self, definition: String) {
        self.definition = Some(definition);
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

/// The type of an edge between two terms
///
/// # Examples
///
/// ```
/// use ontoenrich::Relation;
///
/// let rel: Relation = "part_of".parse().unwrap();
/// assert_eq!(rel, Relation::PartOf);
/// assert!(rel.propagates_annotations());
///
/// let rel = Relation::from("negatively_regulates");
/// assert!(!rel.propagates_annotations());
///
/// let rel = Relation::from("has_part");
/// assert_eq!(rel, Relation::Other("has_part".to_string()));
/// assert_eq!(rel.to_string(), "has_part");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Relation {
    IsA,
    PartOf,
    Regulates,
    PositivelyRegulates,
    NegativelyRegulates,
    Other(String),
}

impl Relation {
    pub fn as_str(&self) -> &str {
        match self {
            Relation::IsA => "is_a",
            Relation::PartOf => "part_of",
            Relation::Regulates => "regulates",
            Relation::PositivelyRegulates => "positively_regulates",
            Relation::NegativelyRegulates => "negatively_regulates",
            Relation::Other(name) => name,
        }
    }

    /// Returns `true` if annotations of the child term also count for the parent
    ///
    /// Only `is_a` and `part_of` edges propagate annotations, regulatory
    /// edges never do.
    pub fn propagates_annotations(&self) -> bool {
        PROPAGATING_RELATIONS.contains(self)
    }

    /// Returns `true` for any kind of `regulates` relation
    pub fn is_regulatory(&self) -> bool {
        match self {
            Relation::Regulates
            | Relation::PositivelyRegulates
            | Relation::NegativelyRegulates => true,
            Relation::Other(name) => name.contains("regulates"),
            Relation::IsA | Relation::PartOf => false,
        }
    }
}

impl From<&str> for Relation {
    fn from(s: &str) -> Self {
        match s {
            "is_a" => Relation::IsA,
            "part_of" => Relation::PartOf,
            "regulates" => Relation::Regulates,
            "positively_regulates" => Relation::PositivelyRegulates,
            "negatively_regulates" => Relation::NegativelyRegulates,
            other => Relation::Other(other.to_string()),
        }
    }
}

impl FromStr for Relation {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Relation::from(s))
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
