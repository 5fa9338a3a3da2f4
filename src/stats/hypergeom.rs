//! Hypergeometric probabilities in log space
//!
//! All functions work on the logarithm of binomial coefficients, built from
//! memoized sums of `ln(i)`. This keeps the calculations finite for
//! populations of tens of thousands of objects, where the factorials
//! themselves overflow.
//!
//! Counts are signed. Negative counts and impossible combinations
//! (e.g. choosing more objects than there are) are not errors, their
//! binomial coefficient is `0` and their log is negative infinity.
//!
//! # Examples
//!
//! ```
//! use ontoenrich::Hypergeom;
//!
//! let mut hyper = Hypergeom::new();
//!
//! // 1 query object out of 3, the term has 1 object
//! let p = hyper.sum_hyperg(1, 1, 1, 3);
//! assert!((p - 1.0 / 3.0).abs() < 1e-12);
//!
//! // the lower tail for depletion analyses
//! let p = hyper.sum_hyperg2(0, 1, 1, 3);
//! assert!((p - 2.0 / 3.0).abs() < 1e-12);
//! ```

mod logcache;

use tracing::trace;

pub use logcache::{EvictionPolicy, LogCache, MaxEntries, NeverEvict};

/// Hypergeometric distribution functions with their own log tables
///
/// The tables grow with the largest population that is queried and are
/// kept for the lifetime of the instance. Range sums are evicted according
/// to the [`EvictionPolicy`] `E`.
#[derive(Debug, Clone)]
pub struct Hypergeom<E = NeverEvict> {
    cache: LogCache<E>,
}

impl Default for Hypergeom<NeverEvict> {
    fn default() -> Self {
        Self::new()
    }
}

impl Hypergeom<NeverEvict> {
    /// Constructs a new instance that never evicts cached range sums
    pub fn new() -> Self {
        Self {
            cache: LogCache::new(),
        }
    }
}

impl<E: EvictionPolicy> Hypergeom<E> {
    /// Constructs a new instance with the given eviction policy
    ///
    /// ```
    /// use ontoenrich::Hypergeom;
    /// use ontoenrich::stats::hypergeom::MaxEntries;
    ///
    /// let mut hyper = Hypergeom::with_policy(MaxEntries(10_000));
    /// assert!((hyper.n_choose_m(5, 2) - 10.0).abs() < 1e-9);
    /// ```
    pub fn with_policy(policy: E) -> Self {
        Self {
            cache: LogCache::with_policy(policy),
        }
    }

    /// Returns `ln(n! / (m! * (n - m)!))`
    ///
    /// Returns negative infinity if `n` or `m` is negative or if `m > n`.
    pub fn log_n_choose_m(&mut self, n: i64, m: i64) -> f64 {
        if n < 0 || m < 0 || m > n {
            return f64::NEG_INFINITY;
        }
        let (n, m) = (index(n), index(m));
        // sum over the shorter of the two possible ranges
        if 2 * m < n {
            self.cache.sum_logs(n - m + 1, n) - self.cache.sum_logs(1, m)
        } else {
            self.cache.sum_logs(m + 1, n) - self.cache.sum_logs(1, n - m)
        }
    }

    /// Returns the binomial coefficient `n` choose `m`
    pub fn n_choose_m(&mut self, n: i64, m: i64) -> f64 {
        self.log_n_choose_m(n, m).exp()
    }

    /// Returns the log probability of exactly `k` successes
    ///
    /// `n` objects are drawn from a population of `big_n` objects,
    /// `big_k` of which are successes.
    pub fn log_hyperg(&mut self, k: i64, n: i64, big_k: i64, big_n: i64) -> f64 {
        let total = self.log_n_choose_m(big_n, n);
        if total == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        self.log_n_choose_m(big_k, k) + self.log_n_choose_m(big_n - big_k, n - k) - total
    }

    /// Returns the probability of exactly `k` successes
    pub fn hyperg(&mut self, k: i64, n: i64, big_k: i64, big_n: i64) -> f64 {
        self.log_hyperg(k, n, big_k, big_n).exp()
    }

    /// Returns the probability of `k` or more successes
    ///
    /// This is the p-value of an enrichment (over-representation) test.
    pub fn sum_hyperg(&mut self, k: i64, n: i64, big_k: i64, big_n: i64) -> f64 {
        if k <= 0 {
            return 1.0;
        }
        let logs: Vec<f64> = (k..=n.min(big_k))
            .map(|i| self.log_hyperg(i, n, big_k, big_n))
            .collect();
        let p = log_sum(&logs).exp().min(1.0);
        trace!("sum_hyperg({}, {}, {}, {}) = {}", k, n, big_k, big_n, p);
        p
    }

    /// Returns the probability of `k` or fewer successes
    ///
    /// This is the p-value of a depletion (under-representation) test.
    pub fn sum_hyperg2(&mut self, k: i64, n: i64, big_k: i64, big_n: i64) -> f64 {
        if k < 0 {
            return 0.0;
        }
        let logs: Vec<f64> = (0..=k.min(n).min(big_k))
            .map(|i| self.log_hyperg(i, n, big_k, big_n))
            .collect();
        let p = log_sum(&logs).exp().min(1.0);
        trace!("sum_hyperg2({}, {}, {}, {}) = {}", k, n, big_k, big_n, p);
        p
    }

    /// Returns the log tables
    pub fn cache(&self) -> &LogCache<E> {
        &self.cache
    }

    /// Drops all cached range sums
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Returns `ln(sum(exp(x)))` without leaving log space
///
/// The largest value is factored out before exponentiation, so very
/// small probabilities do not underflow to `0`.
///
/// ```
/// use ontoenrich::stats::hypergeom::log_sum;
///
/// let sum = log_sum(&[0.25f64.ln(), 0.5f64.ln()]);
/// assert!((sum.exp() - 0.75).abs() < 1e-12);
/// assert_eq!(log_sum(&[]), f64::NEG_INFINITY);
/// ```
pub fn log_sum(logs: &[f64]) -> f64 {
    let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + logs.iter().map(|x| (x - max).exp()).sum::<f64>().ln()
}

/// Converts a count that is known to be non-negative
fn index(i: i64) -> usize {
    usize::try_from(i).unwrap_or_default()
}
