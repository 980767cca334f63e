//! Column metadata pass run once after ingestion.
//!
//! Every column is classified as categorical, numeric or other, and gets a
//! short profile (nulls, distinct values, a few samples) for the selectors.

use polars::prelude::*;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::models::{ColumnKind, ColumnProfile, TableSchema, SAMPLE_SIZE};
use crate::services::ingest::utils::is_date_string;

/// Number of leading non-null values inspected when looking for date strings.
const DATE_DETECTION_ROWS: usize = 100;

pub fn infer_schema(df: &DataFrame) -> TableSchema {
    let columns = df
        .get_columns()
        .par_iter()
        .map(profile_column)
        .collect::<Vec<_>>();

    tracing::debug!(
        "Schema inferred: {:?}",
        columns.iter().map(|c| (c.name.as_str(), c.kind)).collect::<Vec<_>>()
    );

    TableSchema { columns }
}

fn profile_column(series: &Series) -> ColumnProfile {
    let null_count = series.null_count();
    let non_null = series.drop_nulls();

    let mut sample_values = SmallVec::<[String; SAMPLE_SIZE]>::new();
    for idx in 0..non_null.len().min(SAMPLE_SIZE) {
        if let Ok(value) = non_null.get(idx) {
            sample_values.push(any_value_to_string(&value));
        }
    }

    ColumnProfile {
        name: series.name().to_string(),
        kind: classify(series, &non_null),
        null_count,
        unique_count: non_null.n_unique().unwrap_or(0),
        sample_values,
    }
}

fn classify(series: &Series, non_null: &Series) -> ColumnKind {
    if series.dtype().is_numeric() {
        return ColumnKind::Numeric;
    }
    if non_null.is_empty() {
        return ColumnKind::Other;
    }

    match series.dtype() {
        DataType::Boolean => ColumnKind::Categorical,
        DataType::String if looks_like_dates(non_null) => ColumnKind::Other,
        DataType::String => ColumnKind::Categorical,
        _ => ColumnKind::Other,
    }
}

fn looks_like_dates(non_null: &Series) -> bool {
    let Ok(strings) = non_null.str() else {
        return false;
    };

    let (date_count, total_count) = strings
        .into_iter()
        .flatten()
        .take(DATE_DETECTION_ROWS)
        .fold((0usize, 0usize), |(dates, total), value| {
            (dates + usize::from(is_date_string(value)), total + 1)
        });

    total_count > 0 && (date_count as f64 / total_count as f64) >= 0.8
}

pub fn any_value_to_string(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}
