//! Grouped descriptive statistics by garantie.
//!
//! Output rows are sorted by group key, with the group of missing keys last.
//! Keys of a numeric garantie column sort by value, other keys by their text.
//! Without a numeric column `Nombre` is the number of rows in the group. With
//! one, `Nombre` and the statistics only see the non-missing values, so a group
//! without any numeric value gets a count of zero, `None` for mean, minimum and
//! maximum and a total of zero.

use std::cmp::Ordering;
use std::collections::HashMap;

use polars::prelude::*;

use crate::error::AnalysisError;
use crate::models::{ColumnKind, GroupStats, NumericStats, StatsTable, Table};

#[derive(Debug, Default)]
struct GroupAccumulator {
    rows: usize,
    values: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl GroupAccumulator {
    fn push(&mut self, value: Option<f64>) {
        self.rows += 1;
        if let Some(v) = value {
            self.values += 1;
            self.sum += v;
            self.min = Some(self.min.map_or(v, |m| m.min(v)));
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
        }
    }

    fn numeric_stats(&self) -> NumericStats {
        NumericStats {
            mean: (self.values > 0).then(|| self.sum / self.values as f64),
            sum: self.sum,
            min: self.min,
            max: self.max,
        }
    }
}

struct Group<'a> {
    key: Option<&'a str>,
    order: Option<f64>,
    acc: GroupAccumulator,
}

pub fn aggregate(
    table: &Table,
    garantie_column: &str,
    numeric_column: Option<&str>,
) -> Result<StatsTable, AnalysisError> {
    let keys = group_keys(table, garantie_column)?;
    let order = numeric_key_order(table, garantie_column)?;
    let values = match numeric_column {
        Some(name) => Some(numeric_values(table, name)?),
        None => None,
    };

    let mut index: HashMap<Option<&str>, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for (row, key) in keys.iter().enumerate() {
        let key = key.as_deref();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Group {
                key,
                order: order.as_ref().and_then(|o| o[row]),
                acc: GroupAccumulator::default(),
            });
            groups.len() - 1
        });
        let value = values.as_ref().and_then(|v| v[row]);
        groups[slot].acc.push(value);
    }

    if order.is_some() {
        groups.sort_by(|a, b| compare_keys(a.order, b.order, f64::total_cmp));
    } else {
        groups.sort_by(|a, b| compare_keys(a.key, b.key, |a, b| a.cmp(b)));
    }

    let rows = groups
        .into_iter()
        .map(|group| GroupStats {
            garantie: group.key.map(str::to_string),
            count: if values.is_some() { group.acc.values } else { group.acc.rows },
            numeric: values.as_ref().map(|_| group.acc.numeric_stats()),
        })
        .collect();

    Ok(StatsTable {
        garantie_column: garantie_column.to_string(),
        numeric_column: numeric_column.map(str::to_string),
        rows,
    })
}

fn compare_keys<T: Copy>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn not_castable(column: &str, series: &Series) -> impl FnOnce(PolarsError) -> AnalysisError {
    let column = column.to_string();
    let found = series.dtype().to_string();
    move |err| {
        tracing::debug!("Cast of column {} failed: {}", column, err);
        AnalysisError::InvalidColumnType { column, found }
    }
}

/// Group key of every row, rendered as text. Any column may act as garantie.
pub fn group_keys(table: &Table, column: &str) -> Result<Vec<Option<String>>, AnalysisError> {
    if table.schema.column(column).is_none() {
        return Err(AnalysisError::ColumnNotFound(column.to_string()));
    }

    let series = table
        .frame
        .column(column)
        .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?;
    let as_text = series
        .cast(&DataType::String)
        .map_err(not_castable(column, series))?;
    let strings = as_text.str().map_err(not_castable(column, series))?;

    Ok(strings.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Sort value of every row when the garantie column holds numbers.
fn numeric_key_order(table: &Table, column: &str) -> Result<Option<Vec<Option<f64>>>, AnalysisError> {
    let series = table
        .frame
        .column(column)
        .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?;
    if !series.dtype().is_numeric() {
        return Ok(None);
    }

    let floats = series
        .cast(&DataType::Float64)
        .map_err(not_castable(column, series))?;
    let floats = floats.f64().map_err(not_castable(column, series))?;

    Ok(Some(floats.into_iter().collect()))
}

/// Values of a numeric column as floats; NaN counts as missing.
pub fn numeric_values(table: &Table, column: &str) -> Result<Vec<Option<f64>>, AnalysisError> {
    let profile = table
        .schema
        .column(column)
        .ok_or_else(|| AnalysisError::ColumnNotFound(column.to_string()))?;

    if profile.kind != ColumnKind::Numeric {
        return Err(AnalysisError::InvalidColumnType {
            column: column.to_string(),
            found: profile.kind.to_string(),
        });
    }

    let series = table
        .frame
        .column(column)
        .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?;
    let floats = series
        .cast(&DataType::Float64)
        .map_err(not_castable(column, series))?;
    let floats = floats.f64().map_err(not_castable(column, series))?;

    Ok(floats.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::new(
            df!(
                "garantie" => &["A", "A", "B", "C", "C", "C"],
                "montant" => &[10i64, 20, 30, 40, 50, 60],
                "agence" => &["Nord", "Sud", "Nord", "Est", "Sud", "Nord"]
            )
            .unwrap(),
        )
    }

    fn counts(stats: &StatsTable) -> Vec<(Option<&str>, usize)> {
        stats.rows.iter().map(|r| (r.garantie.as_deref(), r.count)).collect()
    }

    #[test]
    fn counts_per_garantie() {
        let stats = aggregate(&sample_table(), "garantie", None).unwrap();
        assert_eq!(counts(&stats), vec![(Some("A"), 2), (Some("B"), 1), (Some("C"), 3)]);
        assert!(stats.rows.iter().all(|r| r.numeric.is_none()));
        assert_eq!(stats.total_count(), 6);
    }

    #[test]
    fn five_statistics_over_numeric_column() {
        let stats = aggregate(&sample_table(), "garantie", Some("montant")).unwrap();
        assert_eq!(stats.numeric_column.as_deref(), Some("montant"));

        let a = &stats.rows[0];
        assert_eq!(a.count, 2);
        assert_eq!(
            a.numeric,
            Some(NumericStats { mean: Some(15.0), sum: 30.0, min: Some(10.0), max: Some(20.0) })
        );

        let c = &stats.rows[2];
        assert_eq!(c.count, 3);
        assert_eq!(
            c.numeric,
            Some(NumericStats { mean: Some(50.0), sum: 150.0, min: Some(40.0), max: Some(60.0) })
        );
    }

    #[test]
    fn missing_numeric_values_are_skipped() {
        let table = Table::new(
            df!(
                "garantie" => &["A", "A", "B", "B"],
                "montant" => &[Some(10.0f64), None, None, Some(f64::NAN)]
            )
            .unwrap(),
        );

        let stats = aggregate(&table, "garantie", Some("montant")).unwrap();
        assert_eq!(counts(&stats), vec![(Some("A"), 1), (Some("B"), 0)]);
        assert_eq!(
            stats.rows[0].numeric,
            Some(NumericStats { mean: Some(10.0), sum: 10.0, min: Some(10.0), max: Some(10.0) })
        );
        assert_eq!(
            stats.rows[1].numeric,
            Some(NumericStats { mean: None, sum: 0.0, min: None, max: None })
        );
    }

    #[test]
    fn count_follows_non_missing_numeric_values() {
        let table = Table::new(
            df!(
                "garantie" => &["A", "A", "B"],
                "montant" => &[Some(10.0f64), None, Some(5.0)]
            )
            .unwrap(),
        );

        let with_numeric = aggregate(&table, "garantie", Some("montant")).unwrap();
        assert_eq!(counts(&with_numeric), vec![(Some("A"), 1), (Some("B"), 1)]);

        let count_only = aggregate(&table, "garantie", None).unwrap();
        assert_eq!(counts(&count_only), vec![(Some("A"), 2), (Some("B"), 1)]);
        assert_eq!(count_only.total_count(), table.row_count());
    }

    #[test]
    fn missing_keys_form_the_last_group() {
        let table = Table::new(df!("garantie" => &[None, Some("B"), Some("A"), None]).unwrap());
        let stats = aggregate(&table, "garantie", None).unwrap();
        assert_eq!(counts(&stats), vec![(Some("A"), 1), (Some("B"), 1), (None, 2)]);
        assert_eq!(stats.total_count(), table.row_count());
    }

    #[test]
    fn numeric_column_can_be_the_garantie() {
        let stats = aggregate(&sample_table(), "montant", None).unwrap();
        assert_eq!(stats.rows.len(), 6);
        assert!(stats.rows.iter().all(|r| r.count == 1));
    }

    #[test]
    fn numeric_keys_sort_by_value() {
        let table = Table::new(df!("code" => &[Some(9i64), Some(10), None, Some(100), Some(20)]).unwrap());
        let stats = aggregate(&table, "code", None).unwrap();
        let keys: Vec<Option<&str>> = stats.rows.iter().map(|r| r.garantie.as_deref()).collect();
        assert_eq!(keys, vec![Some("9"), Some("10"), Some("20"), Some("100"), None]);

        let table = Table::new(df!("taux" => &[3.0f64, 1.0, 2.5, 1.0]).unwrap());
        let stats = aggregate(&table, "taux", None).unwrap();
        assert_eq!(counts(&stats), vec![(Some("1.0"), 2), (Some("2.5"), 1), (Some("3.0"), 1)]);
    }

    #[test]
    fn group_count_matches_distinct_values_and_rows() {
        let table = sample_table();
        for column in ["garantie", "agence", "montant"] {
            let stats = aggregate(&table, column, None).unwrap();
            let distinct = table.schema.column(column).unwrap().unique_count;
            assert_eq!(stats.rows.len(), distinct, "{}", column);
            assert_eq!(stats.total_count(), table.row_count(), "{}", column);
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let table = sample_table();
        let first = aggregate(&table, "agence", Some("montant")).unwrap();
        let second = aggregate(&table, "agence", Some("montant")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_table_gives_no_groups() {
        let table = Table::new(
            df!(
                "garantie" => Vec::<&str>::new(),
                "montant" => Vec::<f64>::new()
            )
            .unwrap(),
        );
        let stats = aggregate(&table, "garantie", None).unwrap();
        assert!(stats.rows.is_empty());
    }

    #[test]
    fn unknown_garantie_column() {
        let err = aggregate(&sample_table(), "produit", None).unwrap_err();
        assert_eq!(err, AnalysisError::ColumnNotFound("produit".to_string()));
    }

    #[test]
    fn unknown_numeric_column() {
        let err = aggregate(&sample_table(), "garantie", Some("cout")).unwrap_err();
        assert_eq!(err, AnalysisError::ColumnNotFound("cout".to_string()));
    }

    #[test]
    fn categorical_column_rejected_as_numeric() {
        let err = aggregate(&sample_table(), "garantie", Some("agence")).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InvalidColumnType {
                column: "agence".to_string(),
                found: "categorical".to_string(),
            }
        );
    }

    #[test]
    fn failed_cast_reports_column_type() {
        let lists = Series::new(
            "montant",
            &[Series::new("", &[1i64, 2]), Series::new("", &[3i64])],
        );
        let frame = DataFrame::new(vec![Series::new("garantie", &["A", "B"]), lists]).unwrap();
        let mut table = Table::new(frame);
        for profile in table.schema.columns.iter_mut().filter(|c| c.name == "montant") {
            profile.kind = ColumnKind::Numeric;
        }

        let err = aggregate(&table, "garantie", Some("montant")).unwrap_err();
        assert!(
            matches!(&err, AnalysisError::InvalidColumnType { column, .. } if column == "montant"),
            "{:?}",
            err
        );
    }
}
