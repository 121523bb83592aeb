//! Workbook model and spreadsheet loading
//!
//! A [`Workbook`] is a flat list of named [`Sheet`]s with typed cells; the
//! `.xlsx` loader fills one via calamine. Logical tables are located with an
//! explicit [`SheetSelector`] per table, and resolution insists on exactly
//! one matching sheet so a renamed or duplicated tab fails loudly at load
//! time instead of silently picking the wrong data.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};

use crate::crosscheck::StoredSummaryRow;
use crate::observations::{Observation, ObservationTable};
use crate::summary::SummaryRow;

/// Columns every observations sheet must provide
pub const REQUIRED_OBSERVATION_COLUMNS: [&str; 6] = ["run", "method", "image", "psnr", "ssim", "cr"];

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Empty,
}

impl Value {
    /// Numeric view: numbers directly, numeric-looking text parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Empty => None,
        }
    }

    /// Text view: trimmed strings, numbers rendered without a trailing `.0`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            Value::Empty => None,
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

/// One worksheet: a header row plus data rows
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    pub fn new(name: &str, headers: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    fn cell(&self, row: &[Value], column: usize) -> Value {
        row.get(column).cloned().unwrap_or(Value::Empty)
    }
}

/// How a logical table is located among the workbook's sheets
#[derive(Debug, Clone)]
pub enum SheetSelector {
    /// Sheet name ends with the token, case-insensitive
    EndsWith(String),
    /// Sheet name contains the token, case-insensitive
    Contains(String),
}

impl SheetSelector {
    pub fn matches(&self, sheet_name: &str) -> bool {
        let name = sheet_name.to_lowercase();
        match self {
            SheetSelector::EndsWith(token) => name.ends_with(&token.to_lowercase()),
            SheetSelector::Contains(token) => name.contains(&token.to_lowercase()),
        }
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::EndsWith(token) => write!(f, "name ending with '{token}'"),
            SheetSelector::Contains(token) => write!(f, "name containing '{token}'"),
        }
    }
}

/// Mapping of the two logical tables to their source sheets
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub observations: SheetSelector,
    pub summary: SheetSelector,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            observations: SheetSelector::EndsWith("allobs".to_string()),
            summary: SheetSelector::Contains("summary".to_string()),
        }
    }
}

/// In-memory workbook
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Load every worksheet of an `.xlsx` file.
    pub fn load_xlsx(path: &Path) -> Result<Self> {
        let mut reader = open_workbook_auto(path)
            .with_context(|| format!("failed to open workbook {}", path.display()))?;

        let mut sheets = Vec::new();
        for (name, range) in reader.worksheets() {
            let mut rows = range.rows();
            let headers: Vec<String> = rows
                .next()
                .map(|header_row| header_row.iter().map(header_text).collect())
                .unwrap_or_default();
            let data = rows
                .map(|row| row.iter().map(convert_cell).collect())
                .collect();
            sheets.push(Sheet {
                name,
                headers,
                rows: data,
            });
        }
        if sheets.is_empty() {
            bail!("workbook {} contains no sheets", path.display());
        }
        tracing::debug!(sheets = sheets.len(), path = %path.display(), "workbook loaded");
        Ok(Self { sheets })
    }

    /// Find the single sheet a selector describes.
    ///
    /// # Errors
    /// Zero matches and multiple matches both fail, naming the selector and
    /// the candidate sheets, so a layout mismatch is diagnosed at load time.
    pub fn resolve(&self, selector: &SheetSelector) -> Result<&Sheet> {
        let matches: Vec<&Sheet> = self
            .sheets
            .iter()
            .filter(|s| selector.matches(&s.name))
            .collect();
        match matches.as_slice() {
            [sheet] => Ok(sheet),
            [] => bail!(
                "no sheet with {selector} (available: {:?})",
                self.sheet_names()
            ),
            found => bail!(
                "multiple sheets with {selector}: {:?}",
                found.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
            ),
        }
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn convert_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(dt) => Value::Number(dt.as_f64()),
        other => Value::Text(other.to_string()),
    }
}

/// Parse the observations sheet into a typed table.
///
/// Column names are trimmed and lowercased before matching; columns outside
/// the required set are tolerated. Fully empty rows are skipped; a row with
/// a missing identifier or a non-numeric metric fails naming the row and
/// column.
pub fn parse_observations(sheet: &Sheet) -> Result<ObservationTable> {
    let normalized: Vec<String> = sheet
        .headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut indices = BTreeMap::new();
    for required in REQUIRED_OBSERVATION_COLUMNS {
        if let Some(idx) = normalized.iter().position(|h| h == required) {
            indices.insert(required, idx);
        }
    }
    let missing: Vec<&str> = REQUIRED_OBSERVATION_COLUMNS
        .iter()
        .filter(|c| !indices.contains_key(*c))
        .copied()
        .collect();
    if !missing.is_empty() {
        bail!(
            "observations sheet '{}' missing columns: {missing:?}",
            sheet.name
        );
    }

    let text_cell = |row: &[Value], column: &str, row_no: usize| -> Result<String> {
        sheet
            .cell(row, indices[column])
            .as_text()
            .with_context(|| {
                format!(
                    "observations sheet '{}' row {row_no}: missing value in column '{column}'",
                    sheet.name
                )
            })
    };
    let number_cell = |row: &[Value], column: &str, row_no: usize| -> Result<f64> {
        sheet
            .cell(row, indices[column])
            .as_f64()
            .with_context(|| {
                format!(
                    "observations sheet '{}' row {row_no}: column '{column}' is not numeric",
                    sheet.name
                )
            })
    };

    let mut observations = Vec::new();
    for (i, row) in sheet.rows.iter().enumerate() {
        if row.iter().all(Value::is_empty) {
            continue;
        }
        let row_no = i + 2; // 1-based, after the header row
        observations.push(Observation {
            run: text_cell(row, "run", row_no)?,
            method: text_cell(row, "method", row_no)?,
            image: text_cell(row, "image", row_no)?,
            psnr: number_cell(row, "psnr", row_no)?,
            ssim: number_cell(row, "ssim", row_no)?,
            cr: number_cell(row, "cr", row_no)?,
        });
    }
    if observations.is_empty() {
        bail!("observations sheet '{}' has no data rows", sheet.name);
    }
    tracing::debug!(rows = observations.len(), sheet = %sheet.name, "observations parsed");
    Ok(ObservationTable::new(observations))
}

/// Parse a stored summary sheet into comparison rows.
///
/// Headers are trimmed; `method` plus the nine numeric summary columns are
/// required, anything else (counts, display strings) is ignored.
pub fn parse_stored_summary(sheet: &Sheet) -> Result<Vec<StoredSummaryRow>> {
    let trimmed: Vec<String> = sheet.headers.iter().map(|h| h.trim().to_string()).collect();

    let method_idx = trimmed
        .iter()
        .position(|h| h == "method")
        .with_context(|| format!("summary sheet '{}' missing column 'method'", sheet.name))?;

    let mut column_indices = Vec::new();
    let mut missing = Vec::new();
    for column in SummaryRow::NUMERIC_COLUMNS {
        match trimmed.iter().position(|h| h == column) {
            Some(idx) => column_indices.push((column, idx)),
            None => missing.push(column),
        }
    }
    if !missing.is_empty() {
        bail!("summary sheet '{}' missing columns: {missing:?}", sheet.name);
    }

    let mut rows = Vec::new();
    for (i, row) in sheet.rows.iter().enumerate() {
        if row.iter().all(Value::is_empty) {
            continue;
        }
        let row_no = i + 2;
        let method = sheet.cell(row, method_idx).as_text().with_context(|| {
            format!("summary sheet '{}' row {row_no}: missing method name", sheet.name)
        })?;

        let mut values = BTreeMap::new();
        for (column, idx) in &column_indices {
            let value = sheet.cell(row, *idx).as_f64().with_context(|| {
                format!(
                    "summary sheet '{}' row {row_no}: column '{column}' is not numeric",
                    sheet.name
                )
            })?;
            values.insert(column.to_string(), value);
        }
        rows.push(StoredSummaryRow::new(method, values));
    }
    if rows.is_empty() {
        bail!("summary sheet '{}' has no data rows", sheet.name);
    }
    Ok(rows)
}
