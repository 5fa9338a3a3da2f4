//! False discovery rates of multiple tests

/// Returns the Q-value of every p-value in `pvalues`
///
/// `pvalues` must be sorted ascending. The Q-value at (1 based) rank `i`
/// of `N` p-values is the smallest `N * p / j` over all ranks `j >= i`,
/// capped at `1.0`. Q-values are therefore non-decreasing in the order of
/// the p-values.
///
/// # Examples
///
/// ```
/// use ontoenrich::stats::fdr::qvalues;
///
/// let q = qvalues(&[0.01, 0.02, 0.03, 0.5]);
/// assert!((q[0] - 0.04).abs() < 1e-12);
/// assert!((q[1] - 0.04).abs() < 1e-12);
/// assert!((q[2] - 0.04).abs() < 1e-12);
/// assert!((q[3] - 0.5).abs() < 1e-12);
/// ```
pub fn qvalues(pvalues: &[f64]) -> Vec<f64> {
    let total = super::f64_from_usize(pvalues.len());
    let mut qvalues = vec![1.0; pvalues.len()];
    let mut running_min = 1.0f64;
    for (idx, p) in pvalues.iter().enumerate().rev() {
        let rank = super::f64_from_usize(idx + 1);
        running_min = running_min.min(total * p / rank);
        qvalues[idx] = running_min;
    }
    qvalues
}
