use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::services::schema::infer_schema;

pub const SAMPLE_SIZE: usize = 3;

/// Label of the "no numeric column" option of the numeric selector.
pub const NO_NUMERIC_COLUMN: &str = "Aucune";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Categorical,
    Numeric,
    Other,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub null_count: usize,
    pub unique_count: usize,
    pub sample_values: SmallVec<[String; SAMPLE_SIZE]>,
}

/// Typed column metadata, computed once per ingested table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnProfile>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Options of the garantie selector: every column, in table order.
    pub fn garantie_options(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Options of the numeric selector: the "none" sentinel, then numeric columns.
    pub fn numeric_options(&self) -> Vec<String> {
        std::iter::once(NO_NUMERIC_COLUMN.to_string())
            .chain(
                self.columns
                    .iter()
                    .filter(|c| c.kind == ColumnKind::Numeric)
                    .map(|c| c.name.clone()),
            )
            .collect()
    }
}

/// An ingested file: the frame plus its schema. Immutable once built.
#[derive(Debug, Clone)]
pub struct Table {
    pub frame: DataFrame,
    pub schema: TableSchema,
}

impl Table {
    pub fn new(frame: DataFrame) -> Self {
        let schema = infer_schema(&frame);
        Self { frame, schema }
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_count(&self) -> usize {
        self.frame.width()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    #[serde(rename = "Moyenne")]
    pub mean: Option<f64>,
    #[serde(rename = "Total")]
    pub sum: f64,
    #[serde(rename = "Minimum")]
    pub min: Option<f64>,
    #[serde(rename = "Maximum")]
    pub max: Option<f64>,
}

/// One aggregated record per distinct garantie value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub garantie: Option<String>,
    #[serde(rename = "Nombre")]
    pub count: usize,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericStats>,
}

/// Display text of a group key; the missing key renders as "(vide)".
pub fn group_label(key: Option<&str>) -> &str {
    key.unwrap_or("(vide)")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsTable {
    pub garantie_column: String,
    pub numeric_column: Option<String>,
    pub rows: Vec<GroupStats>,
}

impl StatsTable {
    pub fn total_count(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount {
    pub garantie: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryFacts {
    pub max_group: GroupCount,
    pub min_group: GroupCount,
    pub total: usize,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub facts: SummaryFacts,
    pub narrative: String,
}

/// Chart choices offered to the user. The same enum drives the selector and
/// the dispatch in `services::chart`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    #[default]
    Barres,
    Camembert,
    #[serde(alias = "Histogramme (si données numériques)")]
    Histogramme,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Barres, ChartKind::Camembert, ChartKind::Histogramme];

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Barres => "Barres",
            ChartKind::Camembert => "Camembert",
            ChartKind::Histogramme => "Histogramme (si données numériques)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_row_serializes_with_french_headers() {
        let row = GroupStats {
            garantie: Some("A".into()),
            count: 2,
            numeric: Some(NumericStats { mean: Some(15.0), sum: 30.0, min: Some(10.0), max: Some(20.0) }),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["garantie"], "A");
        assert_eq!(json["Nombre"], 2);
        assert_eq!(json["Moyenne"], 15.0);
        assert_eq!(json["Total"], 30.0);
        assert_eq!(json["Minimum"], 10.0);
        assert_eq!(json["Maximum"], 20.0);
    }

    #[test]
    fn count_only_row_has_no_numeric_fields() {
        let row = GroupStats { garantie: None, count: 1, numeric: None };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json["garantie"].is_null());
        assert!(json.get("Moyenne").is_none());
        assert_eq!(group_label(row.garantie.as_deref()), "(vide)");
    }

    #[test]
    fn column_kind_serializes_lowercase() {
        let json = serde_json::to_value([ColumnKind::Categorical, ColumnKind::Numeric, ColumnKind::Other]).unwrap();
        assert_eq!(json, serde_json::json!(["categorical", "numeric", "other"]));
        assert_eq!(ColumnKind::Numeric.to_string(), "numeric");
    }

    #[test]
    fn chart_labels_round_trip_through_serde() {
        for kind in ChartKind::ALL {
            let parsed: ChartKind = serde_json::from_value(serde_json::json!(kind.label())).unwrap();
            assert_eq!(parsed, kind);
        }
        let parsed: ChartKind = serde_json::from_str("\"Histogramme\"").unwrap();
        assert_eq!(parsed, ChartKind::Histogramme);
    }
}
