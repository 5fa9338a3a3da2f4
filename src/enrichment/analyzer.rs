use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::annotations::{Annotation, AnnotationSet, ObjectId, QuerySet};
use crate::enrichment::result::NamespaceResults;
use crate::enrichment::{Analysis, AnalysisMode, AnnotationClosure, TermClosure, TermResult};
use crate::ontology::{Namespace, Ontology, TermId};
use crate::stats::fdr::qvalues;
use crate::stats::hypergeom::{EvictionPolicy, Hypergeom, NeverEvict};
use crate::stats::{clamp_underflow, f64_from_usize};
use crate::EnrichResult;

/// Identifies a cached annotation closure
///
/// Ontologies and annotation sets are identified by their generation,
/// which changes on every modification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClosureKey {
    ontology: u64,
    namespace: Namespace,
    annotations: u64,
    excluded: BTreeSet<String>,
    universe: Option<BTreeSet<ObjectId>>,
}

/// The smallest and largest p-value of every term
type MinMax = HashMap<TermId, (f64, f64)>;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Runs enrichment analyses and caches their intermediate results
///
/// ```mermaid
/// flowchart LR
///     O[Ontology] --> C[AnnotationClosure]
///     A[AnnotationSet] --> C
///     C -->|term -> objects| S[Hypergeom]
///     Q[QuerySet] --> S
///     S -->|p-values| R[zero-fill, min/max, Q-values]
///     R --> X[Analysis]
/// ```
///
/// The analyzer keeps every annotation closure it computes, keyed by the
/// ontology, namespace, annotation set, excluded evidence codes and
/// universe. Use [`EnrichmentAnalyzer::clear_cache`] to release them.
///
/// # Examples
///
/// ```
/// use ontoenrich::{Annotation, AnnotationSet, AnalysisMode, EnrichmentAnalyzer};
/// use ontoenrich::{ObjectId, Ontology, QuerySet, Relation};
///
/// let mut ontology = Ontology::default();
/// for id in ["A", "B", "C"] {
///     ontology.add_term(id, &format!("term {id}"));
///     ontology.set_namespace(id, "process").unwrap();
/// }
/// ontology.add_relationship("B", Relation::IsA, "A").unwrap();
/// ontology.add_relationship("C", Relation::IsA, "B").unwrap();
/// ontology.finalize().unwrap();
///
/// let mut annotations = AnnotationSet::default();
/// annotations.push(Annotation::new("DB", "obj1", "one", "C", "IDA"));
/// annotations.push(Annotation::new("DB", "obj2", "two", "B", "IDA"));
/// annotations.push(Annotation::new("DB", "obj3", "three", "A", "IDA"));
///
/// let query = QuerySet::new("query", ["obj1"].map(ObjectId::from));
///
/// let mut analyzer = EnrichmentAnalyzer::new();
/// let analysis = analyzer
///     .analyze(&[query], None, &ontology, &annotations, &[], AnalysisMode::Enrichment)
///     .unwrap();
///
/// for result in analysis.results("process").unwrap() {
///     println!("{}\t{}\t{:.3}", result.term(), result.count(), result.pvalue());
/// }
/// assert_eq!(analyzer.cached_closures(), 1);
/// ```
#[derive(Debug)]
pub struct EnrichmentAnalyzer<E = NeverEvict> {
    hypergeom: Hypergeom<E>,
    closures: HashMap<ClosureKey, Arc<TermClosure>>,
}

impl Default for EnrichmentAnalyzer<NeverEvict> {
    fn default() -> Self {
        Self::new()
    }
}

impl EnrichmentAnalyzer<NeverEvict> {
    pub fn new() -> Self {
        Self::with_hypergeom(Hypergeom::new())
    }
}

impl<E: EvictionPolicy> EnrichmentAnalyzer<E> {
    /// Constructs an analyzer that uses the given hypergeometric engine
    pub fn with_hypergeom(hypergeom: Hypergeom<E>) -> Self {
        Self {
            hypergeom,
            closures: HashMap::new(),
        }
    }

    /// Returns the hypergeometric engine
    pub fn hypergeom(&mut self) -> &mut Hypergeom<E> {
        &mut self.hypergeom
    }

    /// Returns the number of cached annotation closures
    pub fn cached_closures(&self) -> usize {
        self.closures.len()
    }

    /// Drops all cached annotation closures
    pub fn clear_cache(&mut self) {
        debug!("Dropping {} cached closures", self.closures.len());
        self.closures.clear();
    }

    /// Returns the annotation closure of a namespace
    ///
    /// Negated annotations are never included. Annotations with an
    /// evidence code in `excluded_codes` (case insensitive) are skipped.
    /// If `universe` is given and not empty, only annotations of
    /// objects in the universe are included.
    ///
    /// Closures are cached. A closure is only reused as long as neither
    /// the ontology nor the annotation set are modified.
    ///
    /// # Errors
    ///
    /// [`EnrichError::MissingRoot`](crate::EnrichError::MissingRoot) if the namespace has no root
    pub fn compute_annotation_closure(
        &mut self,
        ontology: &Ontology,
        namespace: &str,
        annotations: &AnnotationSet,
        excluded_codes: &[&str],
        universe: Option<&HashSet<ObjectId>>,
    ) -> EnrichResult<Arc<TermClosure>> {
        let universe = universe.filter(|u| !u.is_empty());
        let excluded: BTreeSet<String> = excluded_codes
            .iter()
            .map(|code| code.trim().to_uppercase())
            .collect();
        let key = ClosureKey {
            ontology: ontology.generation(),
            namespace: Namespace::new(namespace),
            annotations: annotations.generation(),
            excluded,
            universe: universe.map(|u| u.iter().cloned().collect()),
        };
        if let Some(closure) = self.closures.get(&key) {
            debug!("Using cached closure of {}", namespace);
            return Ok(Arc::clone(closure));
        }

        debug!("Computing closure of {}", namespace);
        let filter = |annotation: &Annotation| {
            !annotation.is_negated()
                && !key.excluded.contains(annotation.evidence_code())
                && universe.map_or(true, |u| u.contains(annotation.object_id()))
        };
        let closure = AnnotationClosure::new(annotations, filter).go(ontology, namespace)?;
        let closure = Arc::new(closure);
        self.closures.insert(key, Arc::clone(&closure));
        Ok(closure)
    }

    /// Tests every query set against every namespace of the ontology
    ///
    /// For every term with annotated objects, a [`TermResult`] is
    /// created for each query set that has at least one object at the
    /// term. If any query set has objects at a term, all other query sets
    /// receive a result with a count of `0` and a p-value of `1.0` for
    /// that term as well.
    ///
    /// Q-values are calculated per namespace and query set, except in
    /// [`AnalysisMode::Percentage`].
    ///
    /// The universe of a namespace are all objects annotated to one of
    /// its roots. Query objects outside of the universe are reported by
    /// [`Analysis::not_found`] and are not counted in the query set size.
    ///
    /// # Errors
    ///
    /// [`EnrichError::MissingRoot`](crate::EnrichError::MissingRoot) if a namespace has no root
    pub fn analyze(
        &mut self,
        query_sets: &[QuerySet],
        universe: Option<&HashSet<ObjectId>>,
        ontology: &Ontology,
        annotations: &AnnotationSet,
        excluded_codes: &[&str],
        mode: AnalysisMode,
    ) -> EnrichResult<Analysis> {
        let mut analysis = Analysis::new(mode);
        let mut min_max = MinMax::new();

        for namespace in ontology.namespaces() {
            let closure = self.compute_annotation_closure(
                ontology,
                namespace.as_str(),
                annotations,
                excluded_codes,
                universe,
            )?;
            let roots = ontology.roots(namespace.as_str())?;

            let mut ns = NamespaceResults::default();
            let mut zero_results: HashMap<TermId, Vec<TermResult>> = HashMap::new();

            for query_set in query_sets {
                let (not_found, results) = self.analyze_query_set(
                    query_set,
                    ontology,
                    annotations,
                    &closure,
                    roots,
                    mode,
                    &mut min_max,
                    &mut zero_results,
                );
                ns.not_found.push(not_found);
                ns.results.extend(results);
            }

            fill_zero_results(&mut ns.results, zero_results, mode);
            for result in &mut ns.results {
                if let Some(range) = min_max.get(result.term()) {
                    result.set_min_max(*range);
                }
            }
            sort_results(&mut ns.results, mode);
            ns.index_terms();

            info!(
                "Analysed {} query sets in {}: {} results",
                query_sets.len(),
                namespace,
                ns.results.len()
            );
            analysis.insert(namespace.clone(), ns);
        }
        Ok(analysis)
    }

    /// Tests one query set against the closure of one namespace
    ///
    /// Results without any query object are moved to `zero_results`. A query
    /// set without any object in the universe only has such zero results.
    #[allow(clippy::too_many_arguments)]
    fn analyze_query_set(
        &mut self,
        query_set: &QuerySet,
        ontology: &Ontology,
        annotations: &AnnotationSet,
        closure: &TermClosure,
        roots: &[TermId],
        mode: AnalysisMode,
        min_max: &mut MinMax,
        zero_results: &mut HashMap<TermId, Vec<TermResult>>,
    ) -> (HashSet<ObjectId>, Vec<TermResult>) {
        let mut universe: HashSet<&ObjectId> = HashSet::new();
        for root in roots {
            if let Some(objects) = closure.get(root) {
                universe.extend(objects);
            }
        }
        let not_found: HashSet<ObjectId> = query_set
            .ids()
            .iter()
            .filter(|id| !universe.contains(id))
            .cloned()
            .collect();
        let query_size = query_set.len() - not_found.len();
        let universe_size = universe.len();

        if query_size == 0 {
            debug!("No object of {} is annotated", query_set.name());
        }
        let mut results = Vec::new();
        for (term, objects) in closure {
            if objects.is_empty() {
                continue;
            }
            let term_size = objects.len();
            let term_name = ontology.term(term.as_str()).map_or("", |t| t.name());
            let sizes = (query_size, term_size, universe_size);

            let hits = if query_set.len() < objects.len() {
                query_set
                    .ids()
                    .iter()
                    .filter(|id| objects.contains(*id))
                    .collect::<Vec<&ObjectId>>()
            } else {
                objects
                    .iter()
                    .filter(|id| query_set.ids().contains(*id))
                    .collect::<Vec<&ObjectId>>()
            };

            let pvalue = if hits.is_empty() {
                let zero = TermResult::new(
                    query_set.name(),
                    term.clone(),
                    term_name,
                    Vec::new(),
                    sizes,
                    1.0,
                );
                zero_results.entry(term.clone()).or_default().push(zero);
                1.0
            } else {
                let mut hit_objects: Vec<_> = annotations
                    .db_objects(hits.iter().copied())
                    .into_iter()
                    .cloned()
                    .collect();
                hit_objects.sort_by(|a, b| {
                    a.symbol()
                        .cmp(b.symbol())
                        .then_with(|| a.id().cmp(b.id()))
                });
                let pvalue = clamp_underflow(self.pvalue(hit_objects.len(), sizes, mode));
                debug!(
                    "{} {}: k={} n={} K={} N={} p={}",
                    query_set.name(),
                    term,
                    hit_objects.len(),
                    query_size,
                    term_size,
                    universe_size,
                    pvalue
                );
                results.push(TermResult::new(
                    query_set.name(),
                    term.clone(),
                    term_name,
                    hit_objects,
                    sizes,
                    pvalue,
                ));
                pvalue
            };

            let range = min_max.entry(term.clone()).or_insert((1.0, 0.0));
            range.0 = range.0.min(pvalue);
            range.1 = range.1.max(pvalue);
        }

        if mode != AnalysisMode::Percentage {
            results.sort_by(|a, b| {
                a.pvalue()
                    .total_cmp(&b.pvalue())
                    .then_with(|| a.term().cmp(b.term()))
            });
            let pvalues: Vec<f64> = results.iter().map(TermResult::pvalue).collect();
            for (result, qvalue) in results.iter_mut().zip(qvalues(&pvalues)) {
                result.set_qvalue(qvalue);
            }
        }
        (not_found, results)
    }

    fn pvalue(
        &mut self,
        k: usize,
        (n, big_k, big_n): (usize, usize, usize),
        mode: AnalysisMode,
    ) -> f64 {
        match mode {
            AnalysisMode::Enrichment => {
                self.hypergeom
                    .sum_hyperg(count(k), count(n), count(big_k), count(big_n))
            }
            AnalysisMode::Depletion => {
                self.hypergeom
                    .sum_hyperg2(count(k), count(n), count(big_k), count(big_n))
            }
            AnalysisMode::Percentage => f64_from_usize(k) / f64_from_usize(n),
        }
    }
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Adds the zero results of every term that has a result for any query set
///
/// Zero results get a Q-value of `1.0` unless the analysis has no Q-values.
fn fill_zero_results(
    results: &mut Vec<TermResult>,
    mut zero_results: HashMap<TermId, Vec<TermResult>>,
    mode: AnalysisMode,
) {
    let with_qvalues = mode != AnalysisMode::Percentage;
    let terms: HashSet<TermId> = results.iter().map(|result| result.term().clone()).collect();
    for term in terms {
        let Some(zeros) = zero_results.remove(&term) else {
            continue;
        };
        for mut zero in zeros {
            if with_qvalues {
                zero.set_qvalue(1.0);
            }
            results.push(zero);
        }
    }
    debug!("Dropped zero results of {} terms", zero_results.len());
}

fn compare_results(a: &TermResult, b: &TermResult) -> Ordering {
    a.min_pvalue()
        .total_cmp(&b.min_pvalue())
        .then_with(|| a.term_name().cmp(b.term_name()))
        .then_with(|| a.query_set().cmp(b.query_set()))
        .then_with(|| a.term().cmp(b.term()))
}

fn sort_results(results: &mut [TermResult], mode: AnalysisMode) {
    if mode == AnalysisMode::Percentage {
        results.sort_by(|a, b| compare_results(b, a));
    } else {
        results.sort_by(compare_results);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Relation;

    // A -> B -> C
    fn chain() -> (Ontology, AnnotationSet) {
        let mut ontology = Ontology::default();
        for (id, name) in [("A", "alpha"), ("B", "beta"), ("C", "gamma")] {
            ontology.add_term(id, name);
            ontology.set_namespace(id, "process").unwrap();
        }
        ontology.add_relationship("B", Relation::IsA, "A").unwrap();
        ontology.add_relationship("C", Relation::IsA, "B").unwrap();
        ontology.finalize().unwrap();

        let mut annotations = AnnotationSet::default();
        annotations.push(Annotation::new("DB", "obj1", "one", "C", "IDA"));
        annotations.push(Annotation::new("DB", "obj2", "two", "B", "IDA"));
        annotations.push(Annotation::new("DB", "obj3", "three", "A", "IDA"));
        (ontology, annotations)
    }

    fn query(name: &str, ids: &[&str]) -> QuerySet {
        QuerySet::new(name, ids.iter().map(|id| ObjectId::from(*id)))
    }

    fn pvalue_of(analysis: &Analysis, term: &str, query_set: &str) -> f64 {
        analysis
            .term_results("process", term)
            .into_iter()
            .find(|r| r.query_set() == query_set)
            .map(TermResult::pvalue)
            .unwrap()
    }

    #[test]
    fn chain_closure() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let closure = analyzer
            .compute_annotation_closure(&ontology, "process", &annotations, &[], None)
            .unwrap();
        assert_eq!(closure["A"].len(), 3);
        assert_eq!(closure["B"].len(), 2);
        assert_eq!(closure["C"].len(), 1);
        assert!(closure["C"].contains("obj1"));
    }

    #[test]
    fn chain_enrichment() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let analysis = analyzer
            .analyze(
                &[query("q", &["obj1"])],
                None,
                &ontology,
                &annotations,
                &[],
                AnalysisMode::Enrichment,
            )
            .unwrap();

        let results = analysis.results("process").unwrap();
        assert_eq!(results.len(), 3);
        for result in results {
            assert_eq!(result.count(), 1);
            assert_eq!(result.query_size(), 1);
            assert_eq!(result.universe_size(), 3);
        }
        assert!((pvalue_of(&analysis, "C", "q") - 1.0 / 3.0).abs() < 1e-12);
        assert!((pvalue_of(&analysis, "B", "q") - 2.0 / 3.0).abs() < 1e-12);
        assert!((pvalue_of(&analysis, "A", "q") - 1.0).abs() < 1e-12);
        assert_eq!(results[0].term(), "C");
        assert_eq!(results[2].term(), "A");
    }

    #[test]
    fn chain_depletion() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let analysis = analyzer
            .analyze(
                &[query("q", &["obj1"])],
                None,
                &ontology,
                &annotations,
                &[],
                AnalysisMode::Depletion,
            )
            .unwrap();
        // P(X <= 1) with n = 1 is always 1
        for result in analysis.results("process").unwrap() {
            assert!((result.pvalue() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_count_terms_have_pvalue_one() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let analysis = analyzer
            .analyze(
                &[query("hit", &["obj1"]), query("miss", &["obj3"])],
                None,
                &ontology,
                &annotations,
                &[],
                AnalysisMode::Enrichment,
            )
            .unwrap();

        let zeros: Vec<_> = analysis
            .results("process")
            .unwrap()
            .iter()
            .filter(|r| r.is_zero())
            .collect();
        // "miss" has no objects at B or C
        assert_eq!(zeros.len(), 2);
        for zero in zeros {
            assert_eq!(zero.query_set(), "miss");
            assert_eq!(zero.pvalue(), 1.0);
            assert_eq!(zero.qvalue(), Some(1.0));
        }
    }

    #[test]
    fn zero_fill_covers_every_query_set() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let query_sets = [query("a", &["obj1"]), query("b", &["obj2"]), query("c", &["obj3"])];
        let analysis = analyzer
            .analyze(&query_sets, None, &ontology, &annotations, &[], AnalysisMode::Enrichment)
            .unwrap();

        let results = analysis.results("process").unwrap();
        assert_eq!(results.len(), 9);
        for term in ["A", "B", "C"] {
            let term_results = analysis.term_results("process", term);
            assert_eq!(term_results.len(), 3);
            let names: HashSet<&str> = term_results.iter().map(|r| r.query_set()).collect();
            assert_eq!(names.len(), 3);
        }
    }

    #[test]
    fn terms_without_hits_are_not_filled() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let query_sets = [query("a", &["obj3"]), query("b", &["obj3"])];
        let analysis = analyzer
            .analyze(&query_sets, None, &ontology, &annotations, &[], AnalysisMode::Enrichment)
            .unwrap();
        assert!(analysis.term_results("process", "C").is_empty());
        assert_eq!(analysis.term_results("process", "A").len(), 2);
    }

    #[test]
    fn min_max_pvalues() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let query_sets = [query("a", &["obj1"]), query("b", &["obj2"])];
        let analysis = analyzer
            .analyze(&query_sets, None, &ontology, &annotations, &[], AnalysisMode::Enrichment)
            .unwrap();

        for result in analysis.term_results("process", "C") {
            assert!((result.min_pvalue() - 1.0 / 3.0).abs() < 1e-12);
            assert_eq!(result.max_pvalue(), 1.0);
            assert!((result.pvalue_ratio() - 1.0 / 3.0).abs() < 1e-12);
        }
        let first = &analysis.results("process").unwrap()[0];
        assert_eq!(first.term(), "C");
    }

    #[test]
    fn qvalues_are_monotonic() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let analysis = analyzer
            .analyze(
                &[query("q", &["obj1"])],
                None,
                &ontology,
                &annotations,
                &[],
                AnalysisMode::Enrichment,
            )
            .unwrap();

        let mut results: Vec<_> = analysis.results("process").unwrap().iter().collect();
        results.sort_by(|a, b| b.pvalue().total_cmp(&a.pvalue()));
        let q: Vec<f64> = results.iter().map(|r| r.qvalue().unwrap()).collect();
        for pair in q.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        // 3 tests: C has p = 1/3 at rank 1
        assert!((q[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn percentage_mode() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let analysis = analyzer
            .analyze(
                &[query("q", &["obj1", "obj2"])],
                None,
                &ontology,
                &annotations,
                &[],
                AnalysisMode::Percentage,
            )
            .unwrap();

        let results = analysis.results("process").unwrap();
        let fractions: Vec<f64> = results.iter().map(TermResult::pvalue).collect();
        assert_eq!(fractions, vec![1.0, 1.0, 0.5]);
        assert_eq!(results[2].term(), "C");
        assert!(results.iter().all(|r| r.qvalue().is_none()));
    }

    #[test]
    fn unresolved_objects() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let analysis = analyzer
            .analyze(
                &[query("q", &["obj1", "unknown"]), query("empty", &["nothing"])],
                None,
                &ontology,
                &annotations,
                &[],
                AnalysisMode::Enrichment,
            )
            .unwrap();

        let not_found = analysis.not_found("process").unwrap();
        assert_eq!(not_found.len(), 2);
        assert!(not_found[0].contains("unknown"));
        assert!(not_found[1].contains("nothing"));
        // the unknown object does not count towards n
        assert!(analysis
            .results("process")
            .unwrap()
            .iter()
            .filter(|r| r.query_set() == "q")
            .all(|r| r.query_size() == 1));
        // a query set without any known object still gets one zero row per term
        let empty: Vec<_> = analysis
            .results("process")
            .unwrap()
            .iter()
            .filter(|r| r.query_set() == "empty")
            .collect();
        assert_eq!(empty.len(), 3);
        for result in empty {
            assert!(result.is_zero());
            assert_eq!(result.query_size(), 0);
            assert_eq!(result.pvalue(), 1.0);
            assert_eq!(result.qvalue(), Some(1.0));
        }
        for term in ["A", "B", "C"] {
            assert_eq!(analysis.term_results("process", term).len(), 2);
        }
    }

    #[test]
    fn only_unresolved_query_sets() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let analysis = analyzer
            .analyze(
                &[query("a", &["nothing"]), query("b", &[])],
                None,
                &ontology,
                &annotations,
                &[],
                AnalysisMode::Enrichment,
            )
            .unwrap();
        assert!(analysis.is_empty());
        assert_eq!(analysis.not_found("process").unwrap().len(), 2);
    }

    #[test]
    fn qvalues_per_query_set() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let query_sets = [query("one", &["obj1"]), query("two", &["obj1", "obj2"])];
        let analysis = analyzer
            .analyze(&query_sets, None, &ontology, &annotations, &[], AnalysisMode::Enrichment)
            .unwrap();

        for name in ["one", "two"] {
            let mut results: Vec<&TermResult> = analysis
                .results("process")
                .unwrap()
                .iter()
                .filter(|r| r.query_set() == name && !r.is_zero())
                .collect();
            results.sort_by(|a, b| a.pvalue().total_cmp(&b.pvalue()));
            let pvalues: Vec<f64> = results.iter().map(|r| r.pvalue()).collect();
            let expected = qvalues(&pvalues);
            for (result, q) in results.iter().zip(expected) {
                assert!((result.qvalue().unwrap() - q).abs() < 1e-12);
                assert!(result.qvalue().unwrap() >= result.pvalue());
            }
            for pair in results.windows(2) {
                assert!(pair[0].qvalue().unwrap() <= pair[1].qvalue().unwrap());
            }
        }

        // "two" at C: k = 1, n = 2, K = 1, N = 3 gives p = 2/3 at rank 2 of 3, q = 1
        let two_at_c = analysis
            .term_results("process", "C")
            .into_iter()
            .find(|r| r.query_set() == "two")
            .unwrap();
        assert!((two_at_c.pvalue() - 2.0 / 3.0).abs() < 1e-12);
        assert!((two_at_c.qvalue().unwrap() - 1.0).abs() < 1e-12);
        // "one" at C is not affected by the p-values of "two"
        assert!((pvalue_of(&analysis, "C", "one") - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn underflowing_pvalues_are_clamped() {
        // R <- C, 20000 objects in total, 200 of them annotated to C
        let mut ontology = Ontology::default();
        for id in ["R", "C"] {
            ontology.add_term(id, id);
            ontology.set_namespace(id, "process").unwrap();
        }
        ontology.add_relationship("C", Relation::IsA, "R").unwrap();
        ontology.finalize().unwrap();

        let mut annotations = AnnotationSet::default();
        let mut selected = Vec::new();
        for idx in 0..20_000 {
            let id = format!("obj{idx}");
            let term = if idx < 200 { "C" } else { "R" };
            annotations.push(Annotation::new("DB", &id, &id, term, "IDA"));
            if idx < 200 {
                selected.push(ObjectId::from(id));
            }
        }

        let mut analyzer = EnrichmentAnalyzer::new();
        let analysis = analyzer
            .analyze(
                &[QuerySet::new("extreme", selected)],
                None,
                &ontology,
                &annotations,
                &[],
                AnalysisMode::Enrichment,
            )
            .unwrap();

        // p = 1 / C(20000, 200), far below the smallest f64
        let extreme = &analysis.term_results("process", "C")[0];
        assert_eq!(extreme.count(), 200);
        assert_eq!(extreme.universe_size(), 20_000);
        assert_eq!(extreme.pvalue(), f64::MIN_POSITIVE);
        assert!(extreme.significance().is_finite());
        assert!(extreme.significance() > 300.0);
        assert!(extreme.qvalue().unwrap() > 0.0);
        assert!((analysis.term_results("process", "R")[0].pvalue() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn excluded_codes_and_universe() {
        let (ontology, mut annotations) = chain();
        annotations.push(Annotation::new("DB", "obj4", "four", "C", "IEA"));
        let mut analyzer = EnrichmentAnalyzer::new();

        let closure = analyzer
            .compute_annotation_closure(&ontology, "process", &annotations, &["iea"], None)
            .unwrap();
        assert_eq!(closure["A"].len(), 3);

        let universe: HashSet<ObjectId> =
            ["obj1", "obj4"].into_iter().map(ObjectId::from).collect();
        let closure = analyzer
            .compute_annotation_closure(&ontology, "process", &annotations, &[], Some(&universe))
            .unwrap();
        assert_eq!(closure["A"].len(), 2);
        assert!(closure["B"].is_superset(&closure["C"]));
    }

    #[test]
    fn closures_are_cached() {
        let (ontology, mut annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        let first = analyzer
            .compute_annotation_closure(&ontology, "process", &annotations, &["IEA"], None)
            .unwrap();
        let second = analyzer
            .compute_annotation_closure(&ontology, "process", &annotations, &["iea"], None)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(analyzer.cached_closures(), 1);

        // a modified annotation set never hits a stale closure
        annotations.push(Annotation::new("DB", "obj4", "four", "C", "IDA"));
        let third = analyzer
            .compute_annotation_closure(&ontology, "process", &annotations, &["IEA"], None)
            .unwrap();
        assert_eq!(third["A"].len(), 4);
        assert_eq!(analyzer.cached_closures(), 2);

        analyzer.clear_cache();
        assert_eq!(analyzer.cached_closures(), 0);
    }

    #[test]
    fn separate_sets_never_share_a_closure() {
        let (ontology, _) = chain();
        let first = AnnotationSet::default();
        let second = AnnotationSet::default();
        let mut analyzer = EnrichmentAnalyzer::new();
        for annotations in [&first, &second] {
            analyzer
                .compute_annotation_closure(&ontology, "process", annotations, &[], None)
                .unwrap();
        }
        assert_eq!(analyzer.cached_closures(), 2);
    }

    #[test]
    fn unknown_namespace() {
        let (ontology, annotations) = chain();
        let mut analyzer = EnrichmentAnalyzer::new();
        assert!(analyzer
            .compute_annotation_closure(&ontology, "function", &annotations, &[], None)
            .is_err());
    }

    #[test]
    fn parallel_analyzers() {
        use rayon::prelude::*;

        let (ontology, annotations) = chain();
        let pvalues: Vec<f64> = (0..8)
            .into_par_iter()
            .map(|_| {
                let mut analyzer = EnrichmentAnalyzer::new();
                let analysis = analyzer
                    .analyze(
                        &[query("q", &["obj1"])],
                        None,
                        &ontology,
                        &annotations,
                        &[],
                        AnalysisMode::Enrichment,
                    )
                    .unwrap();
                analysis.results("process").unwrap()[0].pvalue()
            })
            .collect();
        for p in pvalues {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
    }
}
