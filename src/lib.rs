//! `ontoenrich` tests sets of annotated objects (genes, alleles, proteins, ...)
//! for over- or under-representation at every term of an ontology.
//!
//! The crate consists of four layers:
//!
//! - [`dag`]: a directed acyclic graph container and a generic, visitor driven
//!   depth-first traversal. Closures, subgraph extraction, redundant edge
//!   detection, pruning and mapping are all implemented as traversal visitors.
//! - [`ontology`] and [`annotations`]: the in-memory ontology (a DAG of
//!   [`Term`]s) and the annotation corpus that links objects to terms.
//!   [`parser`] loads both from OBO and GAF files.
//! - [`stats`]: log-space hypergeometric tail sums with memoized log tables
//!   and Q-value (false discovery rate) calculation.
//! - [`enrichment`]: the annotation closure and the [`EnrichmentAnalyzer`]
//!   that runs one or more query sets against every namespace of an ontology.
//!
//! # Examples
//!
//! ```
//! use ontoenrich::{AnalysisMode, AnnotationSet, EnrichmentAnalyzer, Ontology};
//!
//! let obo = "\
//! format-version: 1.2
//! default-namespace: process
//!
//! [Term]
//! id: X:1
//! name: root
//!
//! [Term]
//! id: X:2
//! name: middle
//! is_a: X:1 ! root
//!
//! [Term]
//! id: X:3
//! name: leaf
//! is_a: X:2 ! middle
//! ";
//! let gaf = "\
//! DB\tobj1\tGENE1\t\tX:3\tREF:1\tIDA
//! DB\tobj2\tGENE2\t\tX:2\tREF:1\tIDA
//! DB\tobj3\tGENE3\t\tX:1\tREF:1\tIDA
//! ";
//!
//! let ontology = Ontology::from_obo_reader(obo.as_bytes(), Default::default()).unwrap();
//! let annotations = AnnotationSet::from_gaf_reader(gaf.as_bytes(), Default::default()).unwrap();
//!
//! let (query, unresolved) = annotations.query_set("my genes", ["GENE1"]);
//! assert!(unresolved.is_empty());
//!
//! let mut analyzer = EnrichmentAnalyzer::new();
//! let analysis = analyzer
//!     .analyze(&[query], None, &ontology, &annotations, &[], AnalysisMode::Enrichment)
//!     .unwrap();
//!
//! let results = analysis.results("process").unwrap();
//! assert_eq!(results.len(), 3);
//! // the leaf term is the most significant one
//! assert_eq!(results[0].term().as_str(), "X:3");
//! assert!((results[0].pvalue() - 1.0 / 3.0).abs() < 1e-12);
//! ```
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Defines a cheaply clonable, string based identifier
///
/// The identifier hashes and compares exactly like the wrapped `str`,
/// so maps keyed by it can be queried with plain `&str`.
macro_rules! shared_str_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            inner: std::sync::Arc<str>,
        }

        impl $name {
            /// Constructs a new identifier
            pub fn new(id: &str) -> Self {
                Self {
                    inner: std::sync::Arc::from(id),
                }
            }

            /// Returns the identifier as `&str`
            pub fn as_str(&self) -> &str {
                &self.inner
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self {
                    inner: std::sync::Arc::from(id),
                }
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.inner
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.inner
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                &*self.inner == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                &*self.inner == *other
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.inner)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.inner)
            }
        }
    };
}

pub mod annotations;
pub mod dag;
pub mod enrichment;
pub mod ontology;
pub mod parser;
pub mod stats;

pub use annotations::{Annotation, AnnotationSet, DbObject, ObjectId, QuerySet};
pub use dag::{Dag, Direction, Traversal, Visitor};
pub use enrichment::{Analysis, AnalysisMode, EnrichmentAnalyzer, TermResult};
pub use ontology::{Namespace, Ontology, Relation, Term, TermId};
pub use stats::hypergeom::Hypergeom;

/// Number of `ln(i)` values that are pre-computed when a log table is created
const INITIAL_LOG_TABLE_SIZE: usize = 5000;
/// Number of extra `ln(i)` values computed whenever the log table must grow
const LOG_TABLE_GROWTH: usize = 1000;
/// Relations that propagate annotations from a child term to its parent
const PROPAGATING_RELATIONS: [Relation; 2] = [Relation::IsA, Relation::PartOf];
/// The qualifier token that negates an annotation
const NEGATION_QUALIFIER: &str = "NOT";
/// Initial capacity of the per-term annotation lists
const DEFAULT_NUM_ANNOTATIONS: usize = 8;

static GENERATION: AtomicU64 = AtomicU64::new(1);

/// Returns a process-wide unique number
///
/// Ontologies and annotation sets take a new generation on every
/// mutation. Cached closures are keyed by it.
pub(crate) fn next_generation() -> u64 {
    GENERATION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Error, Debug)]
pub enum EnrichError {
    /// Adding the edge would introduce a cycle into the graph
    #[error("edge would create cycle. parent({parent}) child({child})")]
    Cycle { parent: String, child: String },
    /// The namespace has no (non-obsolete) root term
    #[error("no root node found for namespace {0}")]
    MissingRoot(String),
    #[error("{0} does not exist")]
    DoesNotExist(String),
    #[error("unable to open file {0}")]
    CannotOpenFile(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Shortcut for `Result<T, EnrichError>`
pub type EnrichResult<T> = Result<T, EnrichError>;
