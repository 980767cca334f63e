use polars::prelude::*;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::services::schema::any_value_to_string;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

/// First `limit` rows of the frame as JSON values, row major.
pub fn preview(df: &DataFrame, limit: usize) -> Preview {
    let head = df.head(Some(limit));
    let columns = head.get_column_names().iter().map(|s| s.to_string()).collect();

    let rows = (0..head.height())
        .map(|row_idx| {
            head.get_columns()
                .iter()
                .map(|series| match series.get(row_idx) {
                    Ok(value) => any_value_to_json(&value),
                    Err(e) => {
                        tracing::warn!("Error getting value at row {}: {}", row_idx, e);
                        JsonValue::Null
                    }
                })
                .collect()
        })
        .collect();

    Preview { columns, rows }
}

fn any_value_to_json(value: &AnyValue) -> JsonValue {
    match value {
        AnyValue::Null => JsonValue::Null,
        AnyValue::Boolean(v) => JsonValue::from(*v),
        AnyValue::Int32(v) => JsonValue::from(*v),
        AnyValue::Int64(v) => JsonValue::from(*v),
        AnyValue::UInt32(v) => JsonValue::from(*v),
        AnyValue::UInt64(v) => JsonValue::from(*v),
        AnyValue::Float32(v) => serde_json::Number::from_f64(*v as f64).map_or(JsonValue::Null, JsonValue::Number),
        AnyValue::Float64(v) => serde_json::Number::from_f64(*v).map_or(JsonValue::Null, JsonValue::Number),
        other => JsonValue::String(any_value_to_string(other)),
    }
}
