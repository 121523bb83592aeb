//! Per-method descriptive summary: count, mean, sample standard deviation,
//! and the 95% confidence-interval half-width for each metric
//!
//! Rows are ordered with the baseline method first. Each row also carries a
//! formatted `mean ± std (±CI)` string per metric for human-readable output.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::observations::{Metric, ObservationTable};

/// 95% confidence-interval half-width, normal approximation.
///
/// Returns `1.96 * std / sqrt(n)`. Not defined for n = 0 (the result is not
/// finite); callers only pass groups that contain observations.
pub fn ci95(std: f64, n: usize) -> f64 {
    1.96 * std / (n as f64).sqrt()
}

/// Descriptive summary of one method across all its observations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub method: String,
    /// Number of observation rows for this method
    pub n: usize,
    pub psnr_mean: f64,
    pub psnr_std: f64,
    pub ssim_mean: f64,
    pub ssim_std: f64,
    pub cr_mean: f64,
    pub cr_std: f64,
    pub psnr_ci95: f64,
    pub ssim_ci95: f64,
    pub cr_ci95: f64,
    /// `mean ± std (±CI)` with metric-appropriate precision
    pub psnr_display: String,
    pub ssim_display: String,
    pub cr_display: String,
}

impl SummaryRow {
    /// The numeric columns cross-validated against a stored summary.
    pub const NUMERIC_COLUMNS: [&'static str; 9] = [
        "psnr_mean", "psnr_std", "ssim_mean", "ssim_std", "cr_mean", "cr_std", "psnr_ci95",
        "ssim_ci95", "cr_ci95",
    ];

    /// Look up one of [`Self::NUMERIC_COLUMNS`] by name.
    pub fn numeric_value(&self, column: &str) -> Option<f64> {
        match column {
            "psnr_mean" => Some(self.psnr_mean),
            "psnr_std" => Some(self.psnr_std),
            "ssim_mean" => Some(self.ssim_mean),
            "ssim_std" => Some(self.ssim_std),
            "cr_mean" => Some(self.cr_mean),
            "cr_std" => Some(self.cr_std),
            "psnr_ci95" => Some(self.psnr_ci95),
            "ssim_ci95" => Some(self.ssim_ci95),
            "cr_ci95" => Some(self.cr_ci95),
            _ => None,
        }
    }

    pub fn display_for(&self, metric: Metric) -> &str {
        match metric {
            Metric::Psnr => &self.psnr_display,
            Metric::Ssim => &self.ssim_display,
            Metric::Cr => &self.cr_display,
        }
    }

    pub fn mean_for(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Psnr => self.psnr_mean,
            Metric::Ssim => self.ssim_mean,
            Metric::Cr => self.cr_mean,
        }
    }

    pub fn ci95_for(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Psnr => self.psnr_ci95,
            Metric::Ssim => self.ssim_ci95,
            Metric::Cr => self.cr_ci95,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divisor n - 1); NaN for n < 2.
fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

fn formatted(mean: f64, std: f64, ci: f64, decimals: usize) -> String {
    format!("{mean:.decimals$} ± {std:.decimals$} (±{ci:.decimals$})")
}

/// Compute the per-method descriptive summary of an observation table.
///
/// # Errors
/// Fails on an empty table; every method that appears has at least one row,
/// so per-group statistics are always defined (std and CI are NaN for
/// single-row groups, where the sample deviation has no meaning).
pub fn summarize(table: &ObservationTable) -> Result<Vec<SummaryRow>> {
    if table.is_empty() {
        bail!("cannot summarize an empty observation table");
    }

    let mut rows = Vec::new();
    for method in table.methods() {
        let n = table
            .observations()
            .iter()
            .filter(|o| o.method == method)
            .count();
        let mut row_stats = Vec::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let values = table.values_for_method(&method, metric);
            let m = mean(&values);
            let s = sample_std(&values, m);
            let ci = ci95(s, n);
            row_stats.push((m, s, ci, metric.decimals()));
        }

        let (psnr, ssim, cr) = (&row_stats[0], &row_stats[1], &row_stats[2]);
        rows.push(SummaryRow {
            method,
            n,
            psnr_mean: psnr.0,
            psnr_std: psnr.1,
            ssim_mean: ssim.0,
            ssim_std: ssim.1,
            cr_mean: cr.0,
            cr_std: cr.1,
            psnr_ci95: psnr.2,
            ssim_ci95: ssim.2,
            cr_ci95: cr.2,
            psnr_display: formatted(psnr.0, psnr.1, psnr.2, psnr.3),
            ssim_display: formatted(ssim.0, ssim.1, ssim.2, ssim.3),
            cr_display: formatted(cr.0, cr.1, cr.2, cr.3),
        });
    }
    Ok(rows)
}
