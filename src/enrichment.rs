//! Enrichment and depletion analyses of query sets
//!
//! An analysis tests, for every term of every namespace of an
//! [`Ontology`](crate::Ontology), whether the objects of a [`QuerySet`](crate::QuerySet)
//! are over- or under-represented among the objects annotated to the
//! term or any of its descendants.
//!
//! The [`EnrichmentAnalyzer`] owns all caches of an analysis, the
//! annotation closures as well as the log tables of its [`Hypergeom`](crate::Hypergeom)
//! engine. Independent analyzers share nothing and can run on separate
//! threads.
use core::fmt::Display;
use std::str::FromStr;

use crate::EnrichError;

mod analyzer;
mod closure;
mod result;

pub use analyzer::EnrichmentAnalyzer;
pub use closure::{AnnotationClosure, TermClosure};
pub use result::{Analysis, TermResult};

/// The statistic calculated for every term
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnalysisMode {
    /// Probability of `k` or more query objects at a term
    #[default]
    Enrichment,
    /// Probability of `k` or fewer query objects at a term
    Depletion,
    /// The fraction of the query set at a term, without any test
    Percentage,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Enrichment => "enrichment",
            AnalysisMode::Depletion => "depletion",
            AnalysisMode::Percentage => "percentage",
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = EnrichError;

    /// Parses a mode from its name or any non-empty prefix of it
    ///
    /// ```
    /// use ontoenrich::AnalysisMode;
    ///
    /// assert_eq!("dep".parse::<AnalysisMode>().unwrap(), AnalysisMode::Depletion);
    /// assert_eq!("Enrichment".parse::<AnalysisMode>().unwrap(), AnalysisMode::Enrichment);
    /// assert!("".parse::<AnalysisMode>().is_err());
    /// assert!("pvalue".parse::<AnalysisMode>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if !s.is_empty() {
            for mode in [
                AnalysisMode::Enrichment,
                AnalysisMode::Depletion,
                AnalysisMode::Percentage,
            ] {
                if mode.as_str().starts_with(&s) {
                    return Ok(mode);
                }
            }
        }
        Err(EnrichError::InvalidInput(format!("unknown analysis mode '{s}'")))
    }
}

impl Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
