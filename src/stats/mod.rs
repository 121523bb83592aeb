// Non-parametric significance tests with family-wise error control
//
// This module is the statistical core of the crate: the Wilcoxon signed-rank
// test for matched pairs, the Friedman rank-sum test for repeated-measures
// designs, and the Holm-Bonferroni step-down adjustment used to control the
// family-wise error rate across a set of comparisons.
//
// Conventions (the results depend on these, so they are part of the contract):
// - Signed-rank zero handling: zero differences are discarded before ranking
//   (the classical "wilcox" convention). All-zero input is an error.
// - Tie handling: tied values receive the average of the ranks they span,
//   in both tests.
// - P-values: the signed-rank test enumerates the exact null distribution
//   for small tie-free samples and otherwise uses the tie-corrected normal
//   approximation; the Friedman statistic is referred to the chi-squared
//   distribution with k-1 degrees of freedom.
//
// Distribution CDFs come from statrs; the test logic itself lives here so
// the conventions above are explicit rather than inherited from a library.

mod friedman;
mod holm;
mod wilcoxon;

pub use friedman::{friedman_test, FriedmanTest};
pub use holm::holm_adjust;
pub use wilcoxon::{signed_rank_test, SignedRankTest};

/// Assign ranks 1..=n to `values`, giving tied values the average of the
/// ranks they would otherwise span.
pub(crate) fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // ranks are 1-based; a run [i, j] shares the mean of ranks i+1..=j+1
        let shared = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = shared;
        }
        i = j + 1;
    }
    ranks
}

#[cfg(test)]
mod tests;
