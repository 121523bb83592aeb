//! Figure rendering: per-metric box plots and confidence-interval charts
//!
//! One box plot per metric (one box per method, baseline first, whiskers at
//! the most extreme points within 1.5 IQR of the quartiles, outliers not
//! drawn) and one CI chart per metric (methods sorted descending by mean,
//! point markers with error bars at the 95% CI half-width). Figures are
//! written as PNG files into the output directory, created if absent.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use plotters::prelude::*;

use crate::observations::{Metric, ObservationTable};
use crate::summary::SummaryRow;

const FIGURE_SIZE: (u32, u32) = (1000, 500);
const BOX_WIDTH: f64 = 0.6;

fn chart_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("chart rendering failed: {e}")
}

/// Render every figure for a table and its summary; returns the written paths.
pub fn render_plots(
    table: &ObservationTable,
    summary: &[SummaryRow],
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let mut written = Vec::new();
    for metric in Metric::ALL {
        let box_path = out_dir.join(format!("boxplot_{}.png", metric.column()));
        box_plot(table, metric, &box_path)?;
        written.push(box_path);

        let ci_path = out_dir.join(format!("ci_{}.png", metric.column()));
        ci_chart(summary, metric, &ci_path)?;
        written.push(ci_path);
    }
    tracing::info!(figures = written.len(), dir = %out_dir.display(), "figures rendered");
    Ok(written)
}

/// Linear-interpolation percentile of sorted data (0..=100).
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let index = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Five-number box geometry with whiskers clamped to 1.5 IQR
#[derive(Debug, Clone, PartialEq)]
struct BoxGeometry {
    whisker_low: f64,
    q1: f64,
    median: f64,
    q3: f64,
    whisker_high: f64,
}

fn box_geometry(values: &[f64]) -> Option<BoxGeometry> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = percentile(&sorted, 25.0);
    let median = percentile(&sorted, 50.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let whisker_low = sorted
        .iter()
        .copied()
        .find(|v| *v >= low_fence)
        .unwrap_or(q1);
    let whisker_high = sorted
        .iter()
        .rev()
        .copied()
        .find(|v| *v <= high_fence)
        .unwrap_or(q3);

    Some(BoxGeometry {
        whisker_low,
        q1,
        median,
        q3,
        whisker_high,
    })
}

fn padded_range(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    if span <= 0.0 {
        (min - 1.0, max + 1.0)
    } else {
        (min - 0.05 * span, max + 0.1 * span)
    }
}

fn box_plot(table: &ObservationTable, metric: Metric, path: &Path) -> Result<()> {
    let methods = table.methods();
    if methods.is_empty() {
        bail!("cannot render a box plot without methods");
    }
    let series: Vec<Vec<f64>> = methods
        .iter()
        .map(|m| table.values_for_method(m, metric))
        .collect();

    let all: Vec<f64> = series.iter().flatten().copied().collect();
    let min = all.iter().copied().fold(f64::INFINITY, f64::min);
    let max = all.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (y_min, y_max) = padded_range(min, max);

    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} by method", metric.label()), ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..(methods.len() as f64 - 0.5), y_min..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(methods.len())
        .x_label_formatter(&|x| {
            let idx = x.round();
            if idx >= 0.0 && (x - idx).abs() < 0.25 {
                methods.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_desc(metric.label())
        .draw()
        .map_err(chart_err)?;

    for (i, values) in series.iter().enumerate() {
        let Some(geom) = box_geometry(values) else {
            continue;
        };
        let x = i as f64;
        let half = BOX_WIDTH / 2.0;

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - half, geom.q1), (x + half, geom.q3)],
                BLUE.mix(0.35).filled(),
            )))
            .map_err(chart_err)?;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - half, geom.q1), (x + half, geom.q3)],
                BLUE.stroke_width(1),
            )))
            .map_err(chart_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x - half, geom.median), (x + half, geom.median)],
                BLUE.stroke_width(2),
            )))
            .map_err(chart_err)?;

        for (from, to) in [
            (geom.whisker_low, geom.q1),
            (geom.q3, geom.whisker_high),
        ] {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x, from), (x, to)],
                    BLUE.stroke_width(1),
                )))
                .map_err(chart_err)?;
        }
        for cap in [geom.whisker_low, geom.whisker_high] {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x - half / 2.0, cap), (x + half / 2.0, cap)],
                    BLUE.stroke_width(1),
                )))
                .map_err(chart_err)?;
        }
    }

    root.present().map_err(chart_err)?;
    Ok(())
}

fn ci_chart(summary: &[SummaryRow], metric: Metric, path: &Path) -> Result<()> {
    if summary.is_empty() {
        bail!("cannot render a CI chart from an empty summary");
    }

    let mut rows: Vec<&SummaryRow> = summary.iter().collect();
    rows.sort_by(|a, b| b.mean_for(metric).total_cmp(&a.mean_for(metric)));

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for row in &rows {
        let mean = row.mean_for(metric);
        let ci = row.ci95_for(metric);
        let (low, high) = if ci.is_finite() {
            (mean - ci, mean + ci)
        } else {
            (mean, mean)
        };
        lo = lo.min(low);
        hi = hi.max(high);
    }
    let (y_min, y_max) = padded_range(lo, hi);

    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{} (mean ± 95% CI)", metric.label()),
            ("sans-serif", 24),
        )
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..(rows.len() as f64 - 0.5), y_min..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(rows.len())
        .x_label_formatter(&|x| {
            let idx = x.round();
            if idx >= 0.0 && (x - idx).abs() < 0.25 {
                rows.get(idx as usize)
                    .map(|r| r.method.clone())
                    .unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_desc(format!("{} (mean ± 95% CI)", metric.label()))
        .draw()
        .map_err(chart_err)?;

    for (i, row) in rows.iter().enumerate() {
        let x = i as f64;
        let mean = row.mean_for(metric);
        let ci = row.ci95_for(metric);

        if ci.is_finite() {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x, mean - ci), (x, mean + ci)],
                    BLACK.stroke_width(1),
                )))
                .map_err(chart_err)?;
            for cap in [mean - ci, mean + ci] {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(x - 0.1, cap), (x + 0.1, cap)],
                        BLACK.stroke_width(1),
                    )))
                    .map_err(chart_err)?;
            }
        }
        chart
            .draw_series(std::iter::once(Circle::new((x, mean), 4, BLUE.filled())))
            .map_err(chart_err)?;
    }

    root.present().map_err(chart_err)?;
    Ok(())
}
