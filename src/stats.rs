//! Statistics for enrichment analyses
//!
//! - [`hypergeom`]: probabilities of the hypergeometric distribution,
//!   computed in log space with memoized tables of logarithms
//! - [`fdr`]: Q-values (false discovery rates) of a list of p-values
//!
//! The hypergeometric distribution describes drawing `n` objects
//! without replacement from a population of `N` objects, `K` of which are
//! "successes". For an ontology term, the population is the universe of
//! annotated objects, the successes are the objects annotated to the term
//! and the draws are the query set.

pub mod fdr;
pub mod hypergeom;

/// Converts a count to `f64`
///
/// Counts are far below 2^52 in practice, so the conversion is exact.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn f64_from_usize(n: usize) -> f64 {
    n as f64
}

/// Replaces a p-value that underflowed to `0.0` by the smallest positive `f64`
///
/// Keeps `-log10(p)` and ratios of p-values finite.
pub(crate) fn clamp_underflow(p: f64) -> f64 {
    if p <= 0.0 {
        f64::MIN_POSITIVE
    } else {
        p
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn underflow_is_clamped() {
        assert_eq!(clamp_underflow(0.0), f64::MIN_POSITIVE);
        assert!(clamp_underflow(0.0).log10().is_finite());
        assert_eq!(clamp_underflow(0.25), 0.25);
    }

    #[test]
    fn counts_to_float() {
        assert_eq!(f64_from_usize(0), 0.0);
        assert_eq!(f64_from_usize(25_000), 25_000.0);
    }
}
