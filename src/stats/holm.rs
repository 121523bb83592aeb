// Holm-Bonferroni step-down adjustment for multiple comparisons
//
// Less conservative than plain Bonferroni while still controlling the
// family-wise error rate: the smallest raw p-value is multiplied by m, the
// next by m-1, and so on, with a cumulative maximum enforcing monotonicity
// over the sorted sequence.

/// Adjust a family of raw p-values with the Holm-Bonferroni step-down rule.
///
/// The hypothesis at ascending-raw-p rank k (0-indexed, family size m) gets
/// `min(1, (m - k) * p)`; a cumulative maximum over the sorted order then
/// makes the adjusted sequence non-decreasing. The result is mapped back to
/// the submission order, so `holm_adjust(p)[i]` always belongs to `p[i]`.
///
/// Raw p-values are expected in `[0, 1]`. An empty slice yields an empty
/// vector.
///
/// # Example
/// ```
/// use cotejar::stats::holm_adjust;
///
/// let adjusted = holm_adjust(&[0.01, 0.04, 0.03]);
/// assert_eq!(adjusted, vec![0.03, 0.06, 0.06]);
/// ```
pub fn holm_adjust(pvalues: &[f64]) -> Vec<f64> {
    let m = pvalues.len();
    if m == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| pvalues[a].total_cmp(&pvalues[b]));

    let mut adjusted = vec![0.0; m];
    let mut running_max = 0.0_f64;
    for (k, &idx) in order.iter().enumerate() {
        let scaled = ((m - k) as f64 * pvalues[idx]).min(1.0);
        running_max = running_max.max(scaled);
        adjusted[idx] = running_max;
    }
    adjusted
}
