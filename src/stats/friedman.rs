// Friedman rank-sum test for repeated-measures designs
//
// Each subject (block) ranks the k treatments; under the null hypothesis of
// no treatment effect the rank sums are close to equal. Tied values within a
// block receive average ranks and the statistic is divided by the standard
// tie correction 1 - sum(t^3 - t) / (n * (k^3 - k)). The statistic is
// referred to the chi-squared distribution with k - 1 degrees of freedom.

use anyhow::{bail, Result};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::stats::average_ranks;

/// Result of a Friedman rank-sum test
#[derive(Debug, Clone)]
pub struct FriedmanTest {
    /// Tie-corrected chi-squared statistic
    pub statistic: f64,
    /// P-value from the chi-squared(k-1) reference distribution
    pub pvalue: f64,
    /// Number of subjects (blocks)
    pub n_subjects: usize,
    /// Number of treatments (columns)
    pub n_treatments: usize,
}

/// Run a Friedman test over treatment columns of matched per-subject values.
///
/// # Arguments
/// * `columns` - One vector per treatment; `columns[j][i]` is the value of
///   treatment j for subject i. All columns must have equal length.
///
/// # Errors
/// Fails with fewer than 3 treatments or fewer than 2 subjects (the minimum
/// design the test is defined for), on ragged columns, and when every block
/// is fully tied (the tie correction degenerates and no ranking information
/// remains).
pub fn friedman_test(columns: &[Vec<f64>]) -> Result<FriedmanTest> {
    let k = columns.len();
    if k < 3 {
        bail!("Friedman test requires at least 3 treatments, got {k}");
    }
    let n = columns[0].len();
    if columns.iter().any(|c| c.len() != n) {
        bail!("Friedman test requires equally sized treatment columns");
    }
    if n < 2 {
        bail!("Friedman test requires at least 2 subjects, got {n}");
    }

    let mut rank_sums = vec![0.0_f64; k];
    let mut tie_term = 0.0_f64;
    let mut block = vec![0.0_f64; k];
    for i in 0..n {
        for (j, column) in columns.iter().enumerate() {
            block[j] = column[i];
        }
        let ranks = average_ranks(&block);
        for (j, r) in ranks.iter().enumerate() {
            rank_sums[j] += r;
        }
        tie_term += block_tie_term(&block);
    }

    let (nf, kf) = (n as f64, k as f64);
    let rank_sum_squares: f64 = rank_sums.iter().map(|r| r * r).sum();
    let mut statistic =
        12.0 * rank_sum_squares / (nf * kf * (kf + 1.0)) - 3.0 * nf * (kf + 1.0);

    let correction = 1.0 - tie_term / (nf * (kf * kf * kf - kf));
    if correction <= 0.0 {
        bail!("Friedman test is undefined: all {k} treatments tied in every block");
    }
    statistic /= correction;

    let chi2 = ChiSquared::new(kf - 1.0)
        .map_err(|e| anyhow::anyhow!("failed to construct chi-squared({}): {e}", k - 1))?;
    let pvalue = chi2.sf(statistic);

    Ok(FriedmanTest {
        statistic,
        pvalue,
        n_subjects: n,
        n_treatments: k,
    })
}

/// Sum of t^3 - t over the groups of tied values within one block.
fn block_tie_term(block: &[f64]) -> f64 {
    let mut sorted = block.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut term = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[i] {
            j += 1;
        }
        let t = (j - i + 1) as f64;
        term += t * t * t - t;
        i = j + 1;
    }
    term
}
