use super::utils::*;
use std::collections::HashSet;
use std::io::Cursor;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use polars::prelude::*;
use crate::error::AnalysisError;

const TYPE_DETECTION_ROWS: usize = 100;
const EMPTY_CELL: &Data = &Data::Empty;

/// Days between the spreadsheet epoch (1899-12-30) and 1970-01-01.
const EXCEL_UNIX_EPOCH_DAYS: f64 = 25_569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Numeric,
    Date,
    Boolean,
    Text,
    Empty,
}

/// Reads the first worksheet; the first row holds the headers.
pub fn read_xlsx(data: &[u8]) -> Result<DataFrame, AnalysisError> {
    let cursor = Cursor::new(data.to_vec());
    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)
        .map_err(|e| AnalysisError::UnparsableFile(format!("Failed to open Excel file: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| AnalysisError::UnparsableFile("No sheets found in workbook".to_string()))?;

    if sheet_names.len() > 1 {
        tracing::info!("Workbook has {} sheets, reading {}", sheet_names.len(), sheet_name);
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| AnalysisError::UnparsableFile(format!("Failed to read worksheet {}: {}", sheet_name, e)))?;

    let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
    create_dataframe(&rows)
}

fn create_dataframe(rows: &[Vec<Data>]) -> Result<DataFrame, AnalysisError> {
    let header_row = rows
        .first()
        .ok_or_else(|| AnalysisError::UnparsableFile("Worksheet is empty".to_string()))?;

    let mut existing_names = HashSet::new();
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| unique_column_name(&cell_text(cell), idx, &mut existing_names))
        .collect();

    let mut columns = Vec::with_capacity(headers.len());

    for (col_idx, header) in headers.iter().enumerate() {
        let values: Vec<&Data> = rows
            .iter()
            .skip(1) // Skip header row
            .map(|row| row.get(col_idx).unwrap_or(EMPTY_CELL))
            .collect();

        let series = match detect_column_type(&values) {
            CellKind::Numeric => {
                let nums: Vec<Option<f64>> = values.iter().map(|v| match v {
                    Data::Float(f) => Some(*f),
                    Data::Int(i) => Some(*i as f64),
                    _ => None,
                }).collect();
                Series::new(header, nums)
            }
            CellKind::Date => {
                let millis: Vec<Option<i64>> = values.iter().map(|v| match v {
                    Data::DateTime(d) => {
                        Some(((d.as_f64() - EXCEL_UNIX_EPOCH_DAYS) * MILLIS_PER_DAY).round() as i64)
                    }
                    _ => None,
                }).collect();
                Series::new(header, millis)
                    .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            }
            CellKind::Boolean => {
                let flags: Vec<Option<bool>> = values.iter().map(|v| match v {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                }).collect();
                Series::new(header, flags)
            }
            CellKind::Text | CellKind::Empty => {
                let strings: Vec<Option<String>> = values.iter().map(|v| match v {
                    Data::Empty => None,
                    other => Some(cell_text(other)),
                }).collect();
                Series::new(header, strings)
            }
        };

        columns.push(series);
    }

    Ok(DataFrame::new(columns)?)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        // Whole floats come back from most spreadsheets for integer cells.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// A column takes a typed representation when at least 80% of its non-empty
/// cells agree; the rest become nulls. Anything else is kept as text.
fn detect_column_type(values: &[&Data]) -> CellKind {
    let (numeric_count, date_count, bool_count, total) = values
        .iter()
        .filter(|v| !matches!(v, Data::Empty))
        .take(TYPE_DETECTION_ROWS)
        .fold((0, 0, 0, 0), |(num, date, bool, total), value| match value {
            Data::Float(_) | Data::Int(_) => (num + 1, date, bool, total + 1),
            Data::DateTime(_) | Data::DateTimeIso(_) => (num, date + 1, bool, total + 1),
            Data::Bool(_) => (num, date, bool + 1, total + 1),
            _ => (num, date, bool, total + 1),
        });

    if total == 0 {
        return CellKind::Empty;
    }

    let threshold = total as f64 * 0.8;
    match () {
        _ if numeric_count as f64 >= threshold => CellKind::Numeric,
        _ if date_count as f64 >= threshold => CellKind::Date,
        _ if bool_count as f64 >= threshold => CellKind::Boolean,
        _ => CellKind::Text,
    }
}
