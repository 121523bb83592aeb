//! Cotejar - statistical validation and plotting for compression benchmarks
//!
//! This library recomputes descriptive statistics (mean, standard deviation,
//! 95% confidence intervals) and significance tests (Wilcoxon signed-rank
//! with Holm-Bonferroni correction, Friedman) over a table of per-image,
//! per-method, per-run quality metrics, cross-checks them against a stored
//! summary, and renders comparison figures.

pub mod cli;
pub mod compare;
pub mod crosscheck;
pub mod observations;
pub mod plot;
pub mod stats;
pub mod summary;
pub mod validate;
pub mod workbook;
