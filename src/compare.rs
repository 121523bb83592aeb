//! Pairwise significance comparisons with family-wise error control
//!
//! Builds the comparison family (every method against a baseline, or all
//! unordered pairs), runs a two-sided Wilcoxon signed-rank test per pair on
//! matched per-image values, then Holm-adjusts the raw p-values over the
//! whole family. One family per metric: the adjustment spans every pair this
//! function was asked about, in construction order.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::observations::PerImageTable;
use crate::stats::{holm_adjust, signed_rank_test};

/// One pairwise comparison record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseComparison {
    pub method_a: String,
    pub method_b: String,
    /// Signed-rank statistic min(W+, W-)
    pub statistic: f64,
    /// Raw two-sided p-value
    pub pvalue: f64,
    /// Holm-adjusted p-value over the comparison family
    pub pvalue_holm: f64,
}

/// Run the Wilcoxon-Holm comparison family over a per-image pivot.
///
/// # Arguments
/// * `per_image` - Matched per-image values, one column per method
/// * `methods` - Methods to compare, in presentation order
/// * `baseline` - When given, each other method is compared against it
///   (record A = method, B = baseline); otherwise all unordered pairs
///
/// Results are sorted ascending by (adjusted p, raw p).
///
/// # Errors
/// Fails when a requested method has no column in the pivot, and when any
/// pair's signed-rank test is degenerate (the error names the pair).
pub fn wilcoxon_holm(
    per_image: &PerImageTable,
    methods: &[String],
    baseline: Option<&str>,
) -> Result<Vec<PairwiseComparison>> {
    let pairs = build_pairs(methods, baseline);
    if pairs.is_empty() {
        return Ok(Vec::new());
    }

    let mut raw_pvalues = Vec::with_capacity(pairs.len());
    let mut tested = Vec::with_capacity(pairs.len());
    for (a, b) in pairs {
        let xa = column(per_image, &a)?;
        let xb = column(per_image, &b)?;
        let test = signed_rank_test(xa, xb)
            .with_context(|| format!("signed-rank test failed for pair '{a}' vs '{b}'"))?;
        raw_pvalues.push(test.pvalue);
        tested.push((a, b, test));
    }

    let adjusted = holm_adjust(&raw_pvalues);
    let mut comparisons: Vec<PairwiseComparison> = tested
        .into_iter()
        .zip(adjusted)
        .map(|((method_a, method_b, test), pvalue_holm)| PairwiseComparison {
            method_a,
            method_b,
            statistic: test.statistic,
            pvalue: test.pvalue,
            pvalue_holm,
        })
        .collect();

    comparisons.sort_by(|left, right| {
        left.pvalue_holm
            .total_cmp(&right.pvalue_holm)
            .then(left.pvalue.total_cmp(&right.pvalue))
    });
    Ok(comparisons)
}

fn build_pairs(methods: &[String], baseline: Option<&str>) -> Vec<(String, String)> {
    match baseline {
        Some(base) => methods
            .iter()
            .filter(|m| m.as_str() != base)
            .map(|m| (m.clone(), base.to_string()))
            .collect(),
        None => {
            let mut pairs = Vec::new();
            for i in 0..methods.len() {
                for j in (i + 1)..methods.len() {
                    pairs.push((methods[i].clone(), methods[j].clone()));
                }
            }
            pairs
        }
    }
}

fn column<'a>(per_image: &'a PerImageTable, method: &str) -> Result<&'a [f64]> {
    match per_image.column(method) {
        Some(values) => Ok(values),
        None => bail!(
            "method '{method}' has no column in the {} per-image table",
            per_image.metric.column()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::{Metric, Observation, ObservationTable};

    fn table(values: &[(&str, &str, f64)]) -> ObservationTable {
        ObservationTable::new(
            values
                .iter()
                .map(|(method, image, psnr)| Observation {
                    run: "1".to_string(),
                    method: method.to_string(),
                    image: image.to_string(),
                    psnr: *psnr,
                    ssim: 0.9,
                    cr: 2.0,
                })
                .collect(),
        )
    }

    fn pivot(table: &ObservationTable) -> crate::observations::PerImageTable {
        table.per_image_means(Metric::Psnr, &table.methods()).unwrap()
    }

    #[test]
    fn test_baseline_produces_one_record_per_other_method() {
        let table = table(&[
            ("Standard", "i1", 30.0),
            ("Standard", "i2", 31.0),
            ("Standard", "i3", 29.0),
            ("Standard", "i4", 32.0),
            ("X", "i1", 33.0),
            ("X", "i2", 34.0),
            ("X", "i3", 32.0),
            ("X", "i4", 35.0),
        ]);
        let methods = table.methods();
        let comparisons = wilcoxon_holm(&pivot(&table), &methods, Some("Standard")).unwrap();

        assert_eq!(comparisons.len(), 1);
        let cmp = &comparisons[0];
        assert_eq!(cmp.method_a, "X");
        assert_eq!(cmp.method_b, "Standard");
        // family of one: Holm multiplies by 1
        assert_eq!(cmp.pvalue, cmp.pvalue_holm);
    }

    #[test]
    fn test_all_pairs_without_baseline() {
        let table = table(&[
            ("A", "i1", 30.0),
            ("A", "i2", 31.0),
            ("B", "i1", 33.0),
            ("B", "i2", 34.5),
            ("C", "i1", 28.0),
            ("C", "i2", 29.5),
        ]);
        let methods = table.methods();
        let comparisons = wilcoxon_holm(&pivot(&table), &methods, None).unwrap();

        assert_eq!(comparisons.len(), 3);
        let mut pairs: Vec<(String, String)> = comparisons
            .iter()
            .map(|c| (c.method_a.clone(), c.method_b.clone()))
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "B".to_string()),
                ("A".to_string(), "C".to_string()),
                ("B".to_string(), "C".to_string()),
            ]
        );
    }

    #[test]
    fn test_sorted_by_adjusted_then_raw_pvalue() {
        let table = table(&[
            ("Standard", "i1", 30.0),
            ("Standard", "i2", 31.0),
            ("Standard", "i3", 29.0),
            ("Standard", "i4", 32.0),
            ("Near", "i1", 30.1),
            ("Near", "i2", 30.8),
            ("Near", "i3", 29.2),
            ("Near", "i4", 31.9),
            ("Far", "i1", 36.0),
            ("Far", "i2", 37.0),
            ("Far", "i3", 35.0),
            ("Far", "i4", 38.0),
        ]);
        let methods = table.methods();
        let comparisons = wilcoxon_holm(&pivot(&table), &methods, Some("Standard")).unwrap();

        assert_eq!(comparisons.len(), 2);
        assert!(comparisons[0].pvalue_holm <= comparisons[1].pvalue_holm);
        assert_eq!(comparisons[0].method_a, "Far");
    }

    #[test]
    fn test_degenerate_pair_error_names_the_pair() {
        let table = table(&[
            ("Standard", "i1", 30.0),
            ("Standard", "i2", 31.0),
            ("Same", "i1", 30.0),
            ("Same", "i2", 31.0),
        ]);
        let methods = table.methods();
        let err = wilcoxon_holm(&pivot(&table), &methods, Some("Standard")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("'Same' vs 'Standard'"), "unexpected: {msg}");
    }

    #[test]
    fn test_unknown_method_is_an_error() {
        let table = table(&[("A", "i1", 30.0), ("B", "i1", 31.0)]);
        let pivot = table.per_image_means(Metric::Psnr, &table.methods()).unwrap();
        let err = wilcoxon_holm(
            &pivot,
            &["A".to_string(), "Ghost".to_string()],
            Some("A"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn test_empty_family() {
        let table = table(&[("Standard", "i1", 30.0)]);
        let methods = table.methods();
        let comparisons = wilcoxon_holm(&pivot(&table), &methods, Some("Standard")).unwrap();
        assert!(comparisons.is_empty());
    }
}
