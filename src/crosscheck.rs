//! Cross-validation of a stored summary against a freshly recomputed one
//!
//! Guards against silent drift between a cached report and the raw
//! observations it was derived from: every numeric descriptive column must
//! match within an absolute-or-relative tolerance, or the run fails naming
//! the first offending column and the largest deviation seen in it.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::summary::SummaryRow;

/// Relative tolerance for column comparison
pub const RELATIVE_TOLERANCE: f64 = 1e-6;
/// Absolute tolerance for column comparison
pub const ABSOLUTE_TOLERANCE: f64 = 1e-6;

/// One row of a previously stored summary sheet, keyed by column name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSummaryRow {
    pub method: String,
    values: BTreeMap<String, f64>,
}

impl StoredSummaryRow {
    pub fn new(method: String, values: BTreeMap<String, f64>) -> Self {
        Self { method, values }
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }
}

/// `|new - old| <= atol + rtol * |old|`, the usual numeric-closeness rule.
fn within_tolerance(new: f64, old: f64) -> bool {
    (new - old).abs() <= ABSOLUTE_TOLERANCE + RELATIVE_TOLERANCE * old.abs()
}

/// Compare a recomputed summary with a stored one, column by column.
///
/// Rows are joined on method name. Methods present on only one side are
/// logged and skipped; an empty join is an error because it means the stored
/// summary describes entirely different methods. Columns are checked in
/// [`SummaryRow::NUMERIC_COLUMNS`] order and the first mismatching column
/// fails with its maximum absolute difference.
pub fn cross_validate(computed: &[SummaryRow], stored: &[StoredSummaryRow]) -> Result<()> {
    let stored_by_method: BTreeMap<&str, &StoredSummaryRow> =
        stored.iter().map(|row| (row.method.as_str(), row)).collect();

    let mut matched: Vec<(&SummaryRow, &StoredSummaryRow)> = Vec::new();
    for row in computed {
        match stored_by_method.get(row.method.as_str()) {
            Some(stored_row) => matched.push((row, stored_row)),
            None => tracing::warn!(
                method = %row.method,
                "method missing from stored summary, skipping comparison"
            ),
        }
    }
    for row in stored {
        if !computed.iter().any(|c| c.method == row.method) {
            tracing::warn!(
                method = %row.method,
                "stored summary lists a method absent from the observations"
            );
        }
    }
    if matched.is_empty() {
        bail!(
            "stored summary shares no methods with the recomputed one \
             (computed {}, stored {})",
            computed.len(),
            stored.len()
        );
    }

    for column in SummaryRow::NUMERIC_COLUMNS {
        let mut max_abs_diff = 0.0_f64;
        let mut mismatch = false;
        for (new_row, old_row) in &matched {
            let new = new_row
                .numeric_value(column)
                .unwrap_or(f64::NAN);
            let Some(old) = old_row.value(column) else {
                bail!(
                    "stored summary is missing column '{column}' for method '{}'",
                    old_row.method
                );
            };
            let diff = (new - old).abs();
            if !within_tolerance(new, old) {
                mismatch = true;
            }
            if diff > max_abs_diff || diff.is_nan() {
                max_abs_diff = diff;
            }
        }
        if mismatch {
            bail!("summary mismatch in column '{column}': max abs diff = {max_abs_diff}");
        }
    }

    tracing::debug!(
        methods = matched.len(),
        "stored summary matches recomputed statistics"
    );
    Ok(())
}
