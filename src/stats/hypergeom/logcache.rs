use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{INITIAL_LOG_TABLE_SIZE, LOG_TABLE_GROWTH};

/// Decides when the range-sum table of a [`LogCache`] is dropped
///
/// The table of single logarithms is never dropped, it only grows to the
/// largest requested integer.
pub trait EvictionPolicy {
    /// Returns `true` if a table with `entries` entries should be cleared
    fn should_evict(&self, entries: usize) -> bool;
}

/// Keeps every range sum for the lifetime of the cache
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NeverEvict;

impl EvictionPolicy for NeverEvict {
    fn should_evict(&self, _: usize) -> bool {
        false
    }
}

/// Clears the range-sum table once it holds more than the given number of entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxEntries(pub usize);

impl EvictionPolicy for MaxEntries {
    fn should_evict(&self, entries: usize) -> bool {
        entries > self.0
    }
}

/// Memoized `ln(i)` values and sums of `ln(i)` over integer ranges
///
/// `sum_logs(a, b)` is `ln(a) + ln(a + 1) + ... + ln(b)`, i.e. `ln(b! / (a - 1)!)`.
/// Binomial coefficients are computed from such sums, which stay finite
/// long after the factorials themselves overflow.
///
/// Consecutive requests often differ by one at either end of the range.
/// Those are derived from the cached neighbour with a single addition or
/// subtraction instead of summing the whole range again.
///
/// # Examples
///
/// ```
/// use ontoenrich::stats::hypergeom::LogCache;
///
/// let mut cache = LogCache::new();
/// let ln_120 = cache.sum_logs(1, 5);
/// assert!((ln_120 - 120f64.ln()).abs() < 1e-12);
///
/// // derived from the cached range 1..=5
/// let ln_720 = cache.sum_logs(1, 6);
/// assert!((ln_720 - 720f64.ln()).abs() < 1e-12);
///
/// // empty ranges sum to zero
/// assert_eq!(cache.sum_logs(4, 3), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct LogCache<E = NeverEvict> {
    logs: Vec<f64>,
    sums: HashMap<(usize, usize), f64>,
    policy: E,
}

impl Default for LogCache<NeverEvict> {
    fn default() -> Self {
        Self::new()
    }
}

impl LogCache<NeverEvict> {
    /// A cache that never evicts range sums
    pub fn new() -> Self {
        Self::with_policy(NeverEvict)
    }
}

impl<E: EvictionPolicy> LogCache<E> {
    /// A cache with a custom eviction policy for range sums
    pub fn with_policy(policy: E) -> Self {
        let mut logs = Vec::with_capacity(INITIAL_LOG_TABLE_SIZE);
        logs.push(f64::NEG_INFINITY);
        logs.extend((1..INITIAL_LOG_TABLE_SIZE).map(ln));
        Self {
            logs,
            sums: HashMap::new(),
            policy,
        }
    }

    /// Returns `ln(i)`, `ln(0)` is negative infinity
    pub fn ln(&mut self, i: usize) -> f64 {
        self.ensure(i);
        self.logs[i]
    }

    /// Grows the log table so that it contains `ln(i)`
    fn ensure(&mut self, i: usize) {
        if i < self.logs.len() {
            return;
        }
        let end = i + LOG_TABLE_GROWTH;
        trace!("Growing log table to {}", end);
        self.logs.extend((self.logs.len()..end).map(ln));
    }

    /// Returns the sum of `ln(i)` for all `i` in `start..=end`
    ///
    /// Returns `0.0` for empty ranges (`start > end`). A range that starts
    /// at `0` includes `ln(0)` and is negative infinity.
    pub fn sum_logs(&mut self, start: usize, end: usize) -> f64 {
        if start > end {
            return 0.0;
        }
        // end + 1 is read when deriving from a longer range
        self.ensure(end + 1);

        if let Some(sum) = self.sums.get(&(start, end)) {
            return *sum;
        }

        let sum = if let Some(shorter) = self.sums.get(&(start + 1, end)) {
            shorter + self.logs[start]
        } else if let Some(shorter) = end.checked_sub(1).and_then(|e| self.sums.get(&(start, e))) {
            shorter + self.logs[end]
        } else if let Some(longer) = self.longer_from_below(start, end) {
            longer - self.logs[start - 1]
        } else if let Some(longer) = self.sums.get(&(start, end + 1)) {
            longer - self.logs[end + 1]
        } else {
            self.logs[start..=end].iter().sum()
        };
        self.insert((start, end), sum);
        sum
    }

    /// The cached sum of `start - 1..=end`, unless it includes `ln(0)`
    fn longer_from_below(&self, start: usize, end: usize) -> Option<f64> {
        if start < 2 {
            return None;
        }
        self.sums.get(&(start - 1, end)).copied()
    }

    fn insert(&mut self, key: (usize, usize), sum: f64) {
        if self.policy.should_evict(self.sums.len() + 1) {
            debug!("Evicting {} cached log sums", self.sums.len());
            self.sums.clear();
        }
        self.sums.insert(key, sum);
    }

    /// Returns the number of cached range sums
    pub fn len(&self) -> usize {
        self.sums.len()
    }

    /// Returns `true` if no range sum is cached
    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Returns the number of `ln(i)` values in the table
    pub fn table_len(&self) -> usize {
        self.logs.len()
    }

    /// Drops all cached range sums
    pub fn clear(&mut self) {
        self.sums.clear();
    }
}

fn ln(i: usize) -> f64 {
    crate::stats::f64_from_usize(i).ln()
}
