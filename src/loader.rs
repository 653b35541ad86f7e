use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;

use crate::error::SimError;
use crate::schema::{self, dimension, key, measure};

/// Sheet read when the caller does not name one.
pub const DEFAULT_SHEET: &str = "data";

// ── Raw readers ─────────────────────────────────────────────────────────────

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
pub fn read_csv_as_strings(path: &Path) -> Result<DataFrame, SimError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

/// Read one worksheet of an Excel/ODS workbook with all columns as String dtype.
///
/// The first row of the used range is the header. Integral numbers are
/// written without a decimal part so codes such as `202403` survive as-is.
pub fn read_excel_as_strings(path: &Path, sheet: &str) -> Result<DataFrame, SimError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range(sheet)?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells
            .iter()
            .enumerate()
            .map(|(i, cell)| cell_text(cell).unwrap_or_else(|| format!("column_{i}")))
            .map(|name| name.trim().to_string())
            .collect(),
        None => {
            return Err(SimError::InvalidData(format!(
                "Sheet '{sheet}' in {} is empty",
                path.display()
            )))
        }
    };

    let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); header.len()];
    for row in rows {
        for (i, column) in values.iter_mut().enumerate() {
            column.push(row.get(i).and_then(cell_text));
        }
    }

    let columns: Vec<Column> = header
        .iter()
        .zip(values)
        .map(|(name, vals)| Column::new(name.as_str().into(), vals))
        .collect();

    Ok(DataFrame::new(columns)?)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
        other => Some(other.to_string()),
    }
}

// ── Normalized loading ──────────────────────────────────────────────────────

/// Load and normalize a CSV file.
pub fn load_csv(path: &Path) -> Result<DataFrame, SimError> {
    let df = normalize(read_csv_as_strings(path)?)?;
    log::info!("Loaded {} rows from {}", df.height(), path.display());
    Ok(df)
}

/// Load and normalize one sheet of a workbook.
pub fn load_excel(path: &Path, sheet: &str) -> Result<DataFrame, SimError> {
    let df = normalize(read_excel_as_strings(path, sheet)?)?;
    log::info!(
        "Loaded {} rows from sheet '{}' of {}",
        df.height(),
        sheet,
        path.display()
    );
    Ok(df)
}

/// Load a table, choosing the reader by file extension.
/// `sheet` is ignored for CSV input.
pub fn load_path(path: &Path, sheet: Option<&str>) -> Result<DataFrame, SimError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("csv") | Some("txt") => load_csv(path),
        Some("xlsx") | Some("xlsm") | Some("xls") | Some("xlsb") | Some("ods") => {
            load_excel(path, sheet.unwrap_or(DEFAULT_SHEET))
        }
        _ => Err(SimError::InvalidData(format!(
            "Unsupported input file type: {}",
            path.display()
        ))),
    }
}

/// Bring a raw table into the shape the simulator works on.
///
/// - every required column must be present
/// - dimensions become String
/// - `Year Month` and `Product Group` become Int64, missing values 0
/// - financial measures become Float64, missing values 0
///
/// Text that does not parse as a number is a fatal input error. Columns
/// beyond the required set are kept untouched.
pub fn normalize(raw: DataFrame) -> Result<DataFrame, SimError> {
    require_columns(&raw, &schema::required_columns())?;

    let numeric: Vec<&str> = key::ALL.iter().chain(measure::ALL.iter()).copied().collect();

    let raw_schema = raw.schema().clone();
    let strip: Vec<Expr> = numeric
        .iter()
        .copied()
        .filter(|c| matches!(raw_schema.get(c), Some(DataType::String)))
        .map(|c| col(c).str().strip_chars(lit(" \t\r\n")))
        .collect();
    let dims: Vec<Expr> = dimension::ALL
        .iter()
        .map(|c| col(*c).cast(DataType::String))
        .collect();

    let mut df = raw.lazy().with_columns(dims).with_columns(strip).collect()?;

    for name in key::ALL {
        let series = coerce_numeric(&df, name, &DataType::Int64)?;
        df.with_column(series)?;
    }
    for name in measure::ALL {
        let series = coerce_numeric(&df, name, &DataType::Float64)?;
        df.with_column(series)?;
    }

    Ok(df)
}

pub(crate) fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), SimError> {
    let schema = df.schema();
    for &col_name in required {
        if !schema.contains(col_name) {
            return Err(SimError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// Parse one column to `target`, counting text that fails to parse.
fn coerce_numeric(df: &DataFrame, name: &str, target: &DataType) -> Result<Series, SimError> {
    let column = df.column(name)?;

    let parsed = match column.dtype() {
        DataType::String => {
            let present = column
                .str()?
                .into_iter()
                .filter(|v| v.is_some_and(|s| !s.is_empty()))
                .count();
            // Through Float64 so "202403.0" still lands on 202403.
            let parsed = column
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let failed = present.saturating_sub(parsed.len() - parsed.null_count());
            if failed > 0 {
                return Err(SimError::NonNumeric {
                    column: name.to_string(),
                    count: failed,
                });
            }
            parsed
        }
        _ => column.as_materialized_series().clone(),
    };

    Ok(parsed
        .cast(target)?
        .fill_null(FillNullStrategy::Zero)?)
}
