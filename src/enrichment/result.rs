use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::annotations::{DbObject, ObjectId};
use crate::enrichment::AnalysisMode;
use crate::ontology::{Namespace, TermId};

/// The result of one query set at one term
///
/// - `k`: the number of query objects annotated to the term ([`TermResult::count`])
/// - `n`: the number of query objects in the universe ([`TermResult::query_size`])
/// - `K`: the number of objects annotated to the term ([`TermResult::term_size`])
/// - `N`: the number of objects in the universe ([`TermResult::universe_size`])
///
/// The minimum and maximum p-values are taken over all query sets of
/// the analysis that have a result for the term.
#[derive(Debug, Clone, PartialEq)]
pub struct TermResult {
    query_set: String,
    term: TermId,
    term_name: String,
    objects: Vec<DbObject>,
    query_size: usize,
    term_size: usize,
    universe_size: usize,
    pvalue: f64,
    qvalue: Option<f64>,
    min_pvalue: f64,
    max_pvalue: f64,
}

impl TermResult {
    pub(crate) fn new(
        query_set: &str,
        term: TermId,
        term_name: &str,
        objects: Vec<DbObject>,
        (query_size, term_size, universe_size): (usize, usize, usize),
        pvalue: f64,
    ) -> Self {
        Self {
            query_set: query_set.to_string(),
            term,
            term_name: term_name.to_string(),
            objects,
            query_size,
            term_size,
            universe_size,
            pvalue,
            qvalue: None,
            min_pvalue: pvalue,
            max_pvalue: pvalue,
        }
    }

    pub(crate) fn set_qvalue(&mut self, qvalue: f64) {
        self.qvalue = Some(qvalue);
    }

    pub(crate) fn set_min_max(&mut self, (min, max): (f64, f64)) {
        self.min_pvalue = min;
        self.max_pvalue = max;
    }

    /// The name of the query set
    pub fn query_set(&self) -> &str {
        &self.query_set
    }

    pub fn term(&self) -> &TermId {
        &self.term
    }

    pub fn term_name(&self) -> &str {
        &self.term_name
    }

    /// The query objects annotated to the term, sorted by symbol
    pub fn objects(&self) -> &[DbObject] {
        &self.objects
    }

    /// `k`
    pub fn count(&self) -> usize {
        self.objects.len()
    }

    /// `n`
    pub fn query_size(&self) -> usize {
        self.query_size
    }

    /// `K`
    pub fn term_size(&self) -> usize {
        self.term_size
    }

    /// `N`
    pub fn universe_size(&self) -> usize {
        self.universe_size
    }

    /// The p-value, or the fraction of the query set in a percentage analysis
    ///
    /// Results without any query object have a p-value of `1.0`.
    pub fn pvalue(&self) -> f64 {
        self.pvalue
    }

    /// The Q-value (false discovery rate)
    ///
    /// `None` in percentage analyses.
    pub fn qvalue(&self) -> Option<f64> {
        self.qvalue
    }

    /// `-log10(p)`
    pub fn significance(&self) -> f64 {
        if self.pvalue > 0.0 {
            -self.pvalue.log10()
        } else {
            0.0
        }
    }

    /// The smallest p-value of the term across all query sets
    pub fn min_pvalue(&self) -> f64 {
        self.min_pvalue
    }

    /// The largest p-value of the term across all query sets
    pub fn max_pvalue(&self) -> f64 {
        self.max_pvalue
    }

    /// `min_pvalue / max_pvalue`
    pub fn pvalue_ratio(&self) -> f64 {
        if self.max_pvalue > 0.0 {
            self.min_pvalue / self.max_pvalue
        } else {
            1.0
        }
    }

    /// Returns `true` if no query object is annotated to the term
    pub fn is_zero(&self) -> bool {
        self.objects.is_empty()
    }
}

/// The results of one namespace
#[derive(Debug, Default, Clone)]
pub(crate) struct NamespaceResults {
    pub(crate) not_found: Vec<HashSet<ObjectId>>,
    pub(crate) results: Vec<TermResult>,
    pub(crate) by_term: HashMap<TermId, Vec<usize>>,
}

impl NamespaceResults {
    /// Rebuilds the term index after the results were sorted
    pub(crate) fn index_terms(&mut self) {
        self.by_term.clear();
        for (idx, result) in self.results.iter().enumerate() {
            self.by_term
                .entry(result.term.clone())
                .or_default()
                .push(idx);
        }
    }
}

/// The outcome of [`EnrichmentAnalyzer::analyze`](crate::EnrichmentAnalyzer::analyze)
///
/// Results are grouped by namespace. Within a namespace they are sorted
/// by the smallest p-value of their term, then by term name and query set
/// name. Percentage analyses are sorted in reverse order, the largest
/// fraction first.
#[derive(Debug, Clone)]
pub struct Analysis {
    mode: AnalysisMode,
    namespaces: IndexMap<Namespace, NamespaceResults>,
}

impl Analysis {
    pub(crate) fn new(mode: AnalysisMode) -> Self {
        Self {
            mode,
            namespaces: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, namespace: Namespace, results: NamespaceResults) {
        self.namespaces.insert(namespace, results);
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// The analysed namespaces, in the order of the ontology
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.keys()
    }

    /// Returns the sorted results of a namespace
    pub fn results(&self, namespace: &str) -> Option<&[TermResult]> {
        self.namespaces
            .get(namespace)
            .map(|ns| ns.results.as_slice())
    }

    /// Returns the query objects that are not part of the namespace's universe
    ///
    /// There is one set per query set, in the order of the query sets.
    pub fn not_found(&self, namespace: &str) -> Option<&[HashSet<ObjectId>]> {
        self.namespaces
            .get(namespace)
            .map(|ns| ns.not_found.as_slice())
    }

    /// Returns all results of a term, one per query set
    ///
    /// Returns an empty `Vec` if the term has no results.
    pub fn term_results(&self, namespace: &str, term: &str) -> Vec<&TermResult> {
        let Some(ns) = self.namespaces.get(namespace) else {
            return Vec::new();
        };
        ns.by_term
            .get(term)
            .map(|indices| indices.iter().map(|idx| &ns.results[*idx]).collect())
            .unwrap_or_default()
    }

    /// Iterates all namespaces with their results
    pub fn iter(&self) -> impl Iterator<Item = (&Namespace, &[TermResult])> {
        self.namespaces
            .iter()
            .map(|(namespace, ns)| (namespace, ns.results.as_slice()))
    }

    /// The total number of results of all namespaces
    pub fn len(&self) -> usize {
        self.namespaces.values().map(|ns| ns.results.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn result(pvalue: f64) -> TermResult {
        TermResult::new("qs", TermId::new("T:1"), "term", Vec::new(), (3, 2, 10), pvalue)
    }

    #[test]
    fn significance() {
        assert!((result(0.01).significance() - 2.0).abs() < 1e-12);
        assert_eq!(result(1.0).significance(), 0.0);
    }

    #[test]
    fn min_max_ratio() {
        let mut res = result(0.2);
        assert_eq!(res.pvalue_ratio(), 1.0);
        res.set_min_max((0.2, 0.8));
        assert!((res.pvalue_ratio() - 0.25).abs() < 1e-12);
        assert_eq!(res.pvalue(), 0.2);
    }

    #[test]
    fn counts() {
        let res = result(1.0);
        assert!(res.is_zero());
        assert_eq!(res.count(), 0);
        assert_eq!(res.query_size(), 3);
        assert_eq!(res.term_size(), 2);
        assert_eq!(res.universe_size(), 10);
        assert_eq!(res.qvalue(), None);
    }

    #[test]
    fn term_index() {
        let mut ns = NamespaceResults::default();
        ns.results.push(result(0.1));
        ns.results.push(result(0.2));
        ns.index_terms();
        let mut analysis = Analysis::new(AnalysisMode::Enrichment);
        analysis.insert(Namespace::new("process"), ns);

        assert_eq!(analysis.term_results("process", "T:1").len(), 2);
        assert!(analysis.term_results("process", "T:2").is_empty());
        assert!(analysis.term_results("function", "T:1").is_empty());
        assert_eq!(analysis.len(), 2);
        assert_eq!(analysis.not_found("process").map(<[_]>::len), Some(0));
    }
}
