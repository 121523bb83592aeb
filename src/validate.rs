//! One-shot validation pipeline over a results workbook
//!
//! Load → resolve tables → recompute the descriptive summary → cross-check
//! it against the stored summary → recompute the Friedman test per metric,
//! plus the baseline-relative Wilcoxon-Holm comparisons when a baseline
//! method is present. Every step is a pure function of the loaded workbook;
//! any failure aborts the run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::compare::{wilcoxon_holm, PairwiseComparison};
use crate::crosscheck::cross_validate;
use crate::observations::{Metric, BASELINE_METHOD};
use crate::stats::friedman_test;
use crate::summary::{summarize, SummaryRow};
use crate::workbook::{parse_observations, parse_stored_summary, TableLayout, Workbook};

/// Per-metric Friedman recomputation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriedmanReportRow {
    pub metric: String,
    pub statistic: f64,
    pub pvalue: f64,
    pub images: usize,
    pub methods: usize,
}

/// Baseline-relative comparison family for one metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricComparisons {
    pub metric: String,
    pub baseline: String,
    pub comparisons: Vec<PairwiseComparison>,
}

/// Everything a validation run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub summary: Vec<SummaryRow>,
    pub friedman: Vec<FriedmanReportRow>,
    pub baseline_comparisons: Vec<MetricComparisons>,
}

impl ValidationReport {
    /// Human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("OK: stored summary statistics are reproducible from the observations.\n");

        out.push_str("\nPer-method summary (mean ± std (±95% CI)):\n");
        for row in &self.summary {
            out.push_str(&format!(
                "  {:<12} n={:<4} PSNR {}  SSIM {}  CR {}\n",
                row.method, row.n, row.psnr_display, row.ssim_display, row.cr_display
            ));
        }

        out.push_str("\nFriedman recomputation (from observations):\n");
        out.push_str("  metric  statistic     p-value  images  methods\n");
        for row in &self.friedman {
            out.push_str(&format!(
                "  {:<6} {:>10.4} {:>11.4e} {:>7} {:>8}\n",
                row.metric, row.statistic, row.pvalue, row.images, row.methods
            ));
        }

        for family in &self.baseline_comparisons {
            out.push_str(&format!(
                "\n{} comparisons vs {} (Wilcoxon signed-rank, Holm-adjusted):\n",
                family.metric, family.baseline
            ));
            for cmp in &family.comparisons {
                out.push_str(&format!(
                    "  {:<12} vs {:<12} W={:<8.1} p={:<10.4e} p_holm={:.4e}\n",
                    cmp.method_a, cmp.method_b, cmp.statistic, cmp.pvalue, cmp.pvalue_holm
                ));
            }
        }
        out
    }
}

/// Run the full validation pipeline over a loaded workbook.
pub fn run_validation(workbook: &Workbook, layout: &TableLayout) -> Result<ValidationReport> {
    let observations_sheet = workbook
        .resolve(&layout.observations)
        .context("locating the observations table")?;
    let summary_sheet = workbook
        .resolve(&layout.summary)
        .context("locating the stored summary table")?;

    let table = parse_observations(observations_sheet)?;
    let stored = parse_stored_summary(summary_sheet)?;
    tracing::info!(
        observations = table.len(),
        methods = table.methods().len(),
        images = table.images().len(),
        "workbook tables resolved"
    );

    let summary = summarize(&table)?;
    cross_validate(&summary, &stored).context("stored summary failed cross-validation")?;

    let methods = table.methods();
    let mut friedman = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let pivot = table.per_image_means(metric, &methods)?;
        let test = friedman_test(pivot.columns())
            .with_context(|| format!("Friedman test failed for {}", metric.label()))?;
        friedman.push(FriedmanReportRow {
            metric: metric.label().to_string(),
            statistic: test.statistic,
            pvalue: test.pvalue,
            images: test.n_subjects,
            methods: test.n_treatments,
        });
    }

    let mut baseline_comparisons = Vec::new();
    if methods.len() >= 2 && methods.iter().any(|m| m == BASELINE_METHOD) {
        for metric in Metric::ALL {
            let pivot = table.per_image_means(metric, &methods)?;
            let comparisons = wilcoxon_holm(&pivot, &methods, Some(BASELINE_METHOD))
                .with_context(|| format!("pairwise comparison failed for {}", metric.label()))?;
            baseline_comparisons.push(MetricComparisons {
                metric: metric.label().to_string(),
                baseline: BASELINE_METHOD.to_string(),
                comparisons,
            });
        }
    }

    Ok(ValidationReport {
        summary,
        friedman,
        baseline_comparisons,
    })
}
