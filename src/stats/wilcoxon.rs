// Wilcoxon signed-rank test for matched pairs
//
// Zero handling: zero differences are discarded before ranking (the classical
// "wilcox" convention), so the reported sample size is the number of non-zero
// differences. Tie handling: tied absolute differences receive average ranks.
//
// P-value computation is two-sided. For n <= 25 tie-free samples the exact
// null distribution of the rank sum is enumerated (the ranks are then the
// integers 1..=n, so a subset-sum count gives the distribution directly).
// Otherwise the normal approximation is used with the tie-corrected variance
//   sigma^2 = n(n+1)(2n+1)/24 - sum(t^3 - t)/48
// and no continuity correction.

use anyhow::{bail, Result};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::stats::average_ranks;

/// Largest tie-free sample for which the exact null distribution is used.
const EXACT_LIMIT: usize = 25;

/// Result of a two-sided Wilcoxon signed-rank test
#[derive(Debug, Clone)]
pub struct SignedRankTest {
    /// Test statistic: min(W+, W-), the smaller signed rank sum
    pub statistic: f64,
    /// Two-sided p-value
    pub pvalue: f64,
    /// Number of non-zero differences the test was computed from
    pub n_used: usize,
    /// True when the exact null distribution was enumerated
    pub exact: bool,
}

/// Run a two-sided Wilcoxon signed-rank test on matched samples.
///
/// # Arguments
/// * `x` - First sample (one value per subject)
/// * `y` - Second sample, matched to `x` by position
///
/// # Errors
/// Fails when the samples differ in length, are empty, or contain no
/// non-zero differences (every pair tied), since the rank sum is undefined
/// in those cases.
///
/// # Example
/// ```
/// use cotejar::stats::signed_rank_test;
///
/// let x = [33.0, 34.0, 32.0, 35.0];
/// let y = [30.0, 31.0, 29.0, 32.0];
/// let test = signed_rank_test(&x, &y).unwrap();
/// assert!(test.pvalue < 0.05);
/// ```
pub fn signed_rank_test(x: &[f64], y: &[f64]) -> Result<SignedRankTest> {
    if x.len() != y.len() {
        bail!(
            "signed-rank test requires matched samples, got {} vs {} values",
            x.len(),
            y.len()
        );
    }
    if x.is_empty() {
        bail!("signed-rank test requires at least one matched pair");
    }

    let diffs: Vec<f64> = x
        .iter()
        .zip(y.iter())
        .map(|(a, b)| a - b)
        .filter(|d| *d != 0.0)
        .collect();
    let n = diffs.len();
    if n == 0 {
        bail!(
            "signed-rank test is undefined when all {} differences are zero",
            x.len()
        );
    }

    let abs_diffs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&abs_diffs);

    let w_plus: f64 = ranks
        .iter()
        .zip(diffs.iter())
        .filter(|(_, d)| **d > 0.0)
        .map(|(r, _)| r)
        .sum();
    let w_minus = n as f64 * (n as f64 + 1.0) / 2.0 - w_plus;
    let statistic = w_plus.min(w_minus);

    let tie_groups = tied_group_sizes(&abs_diffs);
    let has_ties = tie_groups.iter().any(|&t| t > 1);

    let (pvalue, exact) = if n <= EXACT_LIMIT && !has_ties {
        (exact_pvalue(n, statistic), true)
    } else {
        (approx_pvalue(n, w_plus, &tie_groups)?, false)
    };

    Ok(SignedRankTest {
        statistic,
        pvalue,
        n_used: n,
        exact,
    })
}

/// Sizes of the groups of equal absolute differences (size 1 = untied).
fn tied_group_sizes(abs_diffs: &[f64]) -> Vec<usize> {
    let mut sorted = abs_diffs.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut groups = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[i] {
            j += 1;
        }
        groups.push(j - i + 1);
        i = j + 1;
    }
    groups
}

/// Exact two-sided p-value for a tie-free sample of size n.
///
/// Counts, for every achievable rank sum, the number of sign assignments
/// producing it (a subset-sum table over the ranks 1..=n), then doubles the
/// lower tail at the observed statistic. Counts fit exactly in f64 up to
/// 2^25 subsets.
fn exact_pvalue(n: usize, statistic: f64) -> f64 {
    let max_sum = n * (n + 1) / 2;
    let mut counts = vec![0.0_f64; max_sum + 1];
    counts[0] = 1.0;
    for rank in 1..=n {
        for sum in (rank..=max_sum).rev() {
            counts[sum] += counts[sum - rank];
        }
    }

    let w = statistic.floor() as usize;
    let lower_tail: f64 = counts[..=w.min(max_sum)].iter().sum();
    let total = (n as f64).exp2();
    (2.0 * lower_tail / total).min(1.0)
}

/// Normal-approximation two-sided p-value with tie-corrected variance.
fn approx_pvalue(n: usize, w_plus: f64, tie_groups: &[usize]) -> Result<f64> {
    let nf = n as f64;
    let mean = nf * (nf + 1.0) / 4.0;
    let tie_term: f64 = tie_groups
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let variance = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_term / 48.0;
    if variance <= 0.0 {
        bail!("signed-rank variance degenerate for n={n}");
    }

    let z = (w_plus - mean) / variance.sqrt();
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| anyhow::anyhow!("failed to construct standard normal: {e}"))?;
    Ok((2.0 * normal.sf(z.abs())).min(1.0))
}
