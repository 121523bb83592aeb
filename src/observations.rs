//! Observation table for per-image, per-method, per-run metric rows
//!
//! One observation is a single compression run of one method on one image,
//! carrying the three quality metrics. The table owns the ordered rows and
//! derives everything else: the method list (baseline first), the image
//! list, and the per-image pivot the rank tests consume.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Reference method name; when present it is ordered first everywhere.
pub const BASELINE_METHOD: &str = "Standard";

/// The three quality metrics tracked per observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Peak signal-to-noise ratio (dB)
    Psnr,
    /// Structural similarity (0..1)
    Ssim,
    /// Compression ratio
    Cr,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Psnr, Metric::Ssim, Metric::Cr];

    /// Column name in the observations sheet
    pub fn column(self) -> &'static str {
        match self {
            Metric::Psnr => "psnr",
            Metric::Ssim => "ssim",
            Metric::Cr => "cr",
        }
    }

    /// Display label used in reports and figures
    pub fn label(self) -> &'static str {
        match self {
            Metric::Psnr => "PSNR",
            Metric::Ssim => "SSIM",
            Metric::Cr => "CR",
        }
    }

    /// Decimal places for formatted values (SSIM lives near 0..1)
    pub fn decimals(self) -> usize {
        match self {
            Metric::Ssim => 5,
            Metric::Psnr | Metric::Cr => 3,
        }
    }
}

/// One row: a single run of one method on one image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub run: String,
    pub method: String,
    pub image: String,
    pub psnr: f64,
    pub ssim: f64,
    pub cr: f64,
}

impl Observation {
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Psnr => self.psnr,
            Metric::Ssim => self.ssim,
            Metric::Cr => self.cr,
        }
    }
}

/// Ordered collection of observations with derived groupings
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    observations: Vec<Observation>,
}

impl ObservationTable {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Distinct method names, sorted, with the baseline method first when
    /// present.
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self
            .observations
            .iter()
            .map(|o| o.method.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        if let Some(pos) = methods.iter().position(|m| m == BASELINE_METHOD) {
            let baseline = methods.remove(pos);
            methods.insert(0, baseline);
        }
        methods
    }

    /// Distinct image identifiers, sorted.
    pub fn images(&self) -> Vec<String> {
        self.observations
            .iter()
            .map(|o| o.image.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// All raw values of one metric under one method, in row order.
    pub fn values_for_method(&self, method: &str, metric: Metric) -> Vec<f64> {
        self.observations
            .iter()
            .filter(|o| o.method == method)
            .map(|o| o.metric(metric))
            .collect()
    }

    /// Collapse repeated runs to one mean value per (image, method) and
    /// restrict the columns to `methods`.
    ///
    /// # Errors
    /// Fails when any requested method has no observation for some image:
    /// the rank tests need complete matched blocks, and a silent gap would
    /// corrupt them.
    pub fn per_image_means(&self, metric: Metric, methods: &[String]) -> Result<PerImageTable> {
        let mut cells: BTreeMap<(&str, &str), (f64, usize)> = BTreeMap::new();
        for obs in &self.observations {
            let entry = cells
                .entry((obs.image.as_str(), obs.method.as_str()))
                .or_insert((0.0, 0));
            entry.0 += obs.metric(metric);
            entry.1 += 1;
        }

        let images = self.images();
        let mut columns = Vec::with_capacity(methods.len());
        for method in methods {
            let mut column = Vec::with_capacity(images.len());
            for image in &images {
                match cells.get(&(image.as_str(), method.as_str())) {
                    Some((sum, count)) => column.push(sum / *count as f64),
                    None => bail!(
                        "no {} observations for image '{image}' under method '{method}'",
                        metric.column()
                    ),
                }
            }
            columns.push(column);
        }

        Ok(PerImageTable {
            metric,
            images,
            methods: methods.to_vec(),
            columns,
        })
    }
}

/// Per-image pivot: one row per image, one column of run-averaged values per
/// method, for a single metric
#[derive(Debug, Clone)]
pub struct PerImageTable {
    pub metric: Metric,
    pub images: Vec<String>,
    pub methods: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl PerImageTable {
    /// The run-averaged column for one method, image order matching `images`.
    pub fn column(&self, method: &str) -> Option<&[f64]> {
        let idx = self.methods.iter().position(|m| m == method)?;
        Some(&self.columns[idx])
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(run: &str, method: &str, image: &str, psnr: f64) -> Observation {
        Observation {
            run: run.to_string(),
            method: method.to_string(),
            image: image.to_string(),
            psnr,
            ssim: psnr / 100.0,
            cr: psnr / 10.0,
        }
    }

    #[test]
    fn test_methods_sorted_with_baseline_first() {
        let table = ObservationTable::new(vec![
            obs("1", "Zeta", "img1", 30.0),
            obs("1", "Alpha", "img1", 31.0),
            obs("1", "Standard", "img1", 29.0),
        ]);
        assert_eq!(table.methods(), vec!["Standard", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_methods_sorted_without_baseline() {
        let table = ObservationTable::new(vec![
            obs("1", "B", "img1", 30.0),
            obs("1", "A", "img1", 31.0),
        ]);
        assert_eq!(table.methods(), vec!["A", "B"]);
    }

    #[test]
    fn test_per_image_means_averages_runs() {
        let table = ObservationTable::new(vec![
            obs("1", "A", "img1", 30.0),
            obs("2", "A", "img1", 32.0),
            obs("1", "A", "img2", 28.0),
        ]);
        let pivot = table
            .per_image_means(Metric::Psnr, &["A".to_string()])
            .unwrap();
        assert_eq!(pivot.images, vec!["img1", "img2"]);
        assert_eq!(pivot.column("A").unwrap(), &[31.0, 28.0]);
    }

    #[test]
    fn test_per_image_means_missing_cell_is_an_error() {
        let table = ObservationTable::new(vec![
            obs("1", "A", "img1", 30.0),
            obs("1", "B", "img1", 31.0),
            obs("1", "A", "img2", 29.0),
        ]);
        let err = table
            .per_image_means(Metric::Psnr, &["A".to_string(), "B".to_string()])
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("img2"));
        assert!(msg.contains("'B'"));
    }

    #[test]
    fn test_per_image_means_restricts_to_requested_methods() {
        let table = ObservationTable::new(vec![
            obs("1", "A", "img1", 30.0),
            obs("1", "B", "img1", 31.0),
        ]);
        let pivot = table
            .per_image_means(Metric::Psnr, &["A".to_string()])
            .unwrap();
        assert!(pivot.column("B").is_none());
        assert_eq!(pivot.methods, vec!["A"]);
    }

    #[test]
    fn test_values_for_method_in_row_order() {
        let table = ObservationTable::new(vec![
            obs("1", "A", "img1", 30.0),
            obs("1", "B", "img1", 99.0),
            obs("2", "A", "img2", 32.0),
        ]);
        assert_eq!(table.values_for_method("A", Metric::Psnr), vec![30.0, 32.0]);
        assert_eq!(table.values_for_method("A", Metric::Cr), vec![3.0, 3.2]);
    }

    #[test]
    fn test_metric_formatting_metadata() {
        assert_eq!(Metric::Psnr.decimals(), 3);
        assert_eq!(Metric::Ssim.decimals(), 5);
        assert_eq!(Metric::Cr.label(), "CR");
        assert_eq!(Metric::ALL.len(), 3);
    }
}
