use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::models::{ChartKind, GroupStats, Summary, Table, NO_NUMERIC_COLUMN};
use crate::services::aggregator::aggregate;
use crate::services::chart::{present, Chart, Presentation, MISSING_NUMERIC_WARNING};
use crate::services::summarizer::summarize;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub garantie_column: String,
    #[serde(default)]
    pub numeric_column: Option<String>,
    #[serde(default)]
    pub chart: ChartKind,
}

impl AnalysisRequest {
    /// The numeric selection, with the "Aucune" sentinel mapped to `None`.
    pub fn numeric_selection(&self) -> Option<&str> {
        self.numeric_column
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != NO_NUMERIC_COLUMN)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub garantie_column: String,
    pub numeric_column: Option<String>,
    pub chart_kind: ChartKind,
    pub stats: Vec<GroupStats>,
    pub chart: Option<Chart>,
    pub warning: Option<String>,
    pub summary: Option<Summary>,
    pub summary_error: Option<String>,
}

/// One pass of the pipeline: aggregate, pick the chart, summarize.
///
/// Column errors abort the run. An empty table still yields a report whose
/// `summary_error` explains why there is no narrative.
pub fn run_analysis(table: &Table, request: &AnalysisRequest, bins: usize) -> Result<AnalysisReport, AnalysisError> {
    let start = std::time::Instant::now();
    let numeric_column = request.numeric_selection();

    let stats = aggregate(table, &request.garantie_column, numeric_column)?;

    let (chart, warning) = match present(request.chart, table, &stats, bins)? {
        Presentation::Chart(chart) => (Some(chart), None),
        Presentation::MissingNumericSelection => {
            tracing::info!("Histogram requested without a numeric column");
            (None, Some(MISSING_NUMERIC_WARNING.to_string()))
        }
    };

    let (summary, summary_error) = match summarize(&stats.rows) {
        Ok(summary) => (Some(summary), None),
        Err(e) => {
            tracing::warn!("No summary for {}: {}", request.garantie_column, e);
            (None, Some(e.to_string()))
        }
    };

    tracing::info!(
        "Analysis of {} by {} ({:?}): {} groups in {:?}",
        numeric_column.unwrap_or(NO_NUMERIC_COLUMN),
        request.garantie_column,
        request.chart,
        stats.rows.len(),
        start.elapsed()
    );

    Ok(AnalysisReport {
        garantie_column: stats.garantie_column,
        numeric_column: stats.numeric_column,
        chart_kind: request.chart,
        stats: stats.rows,
        chart,
        warning,
        summary,
        summary_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn request(numeric: Option<&str>, chart: ChartKind) -> AnalysisRequest {
        AnalysisRequest {
            garantie_column: "garantie".to_string(),
            numeric_column: numeric.map(str::to_string),
            chart,
        }
    }

    fn sample_table() -> Table {
        Table::new(
            df!(
                "garantie" => &["A", "A", "B", "C", "C", "C"],
                "montant" => &[10i64, 20, 30, 40, 50, 60]
            )
            .unwrap(),
        )
    }

    #[test]
    fn sentinel_means_no_numeric_column() {
        assert_eq!(request(Some("Aucune"), ChartKind::Barres).numeric_selection(), None);
        assert_eq!(request(Some(""), ChartKind::Barres).numeric_selection(), None);
        assert_eq!(request(None, ChartKind::Barres).numeric_selection(), None);
        assert_eq!(request(Some("montant"), ChartKind::Barres).numeric_selection(), Some("montant"));
    }

    #[test]
    fn request_defaults_to_bar_chart() {
        let req: AnalysisRequest = serde_json::from_str(r#"{"garantie_column": "garantie"}"#).unwrap();
        assert_eq!(req.chart, ChartKind::Barres);
        assert!(req.numeric_column.is_none());
    }

    #[test]
    fn full_report_for_reference_scenario() {
        let report = run_analysis(&sample_table(), &request(None, ChartKind::Camembert), 10).unwrap();
        assert_eq!(report.stats.len(), 3);
        assert!(matches!(report.chart, Some(Chart::Camembert { .. })));
        assert!(report.warning.is_none());

        let summary = report.summary.unwrap();
        assert_eq!(summary.facts.total, 6);
        assert_eq!(summary.facts.max_group.garantie.as_deref(), Some("C"));
        assert_eq!(summary.facts.min_group.garantie.as_deref(), Some("B"));
    }

    #[test]
    fn histogram_without_numeric_returns_warning_and_stats() {
        let report = run_analysis(&sample_table(), &request(Some("Aucune"), ChartKind::Histogramme), 10).unwrap();
        assert!(report.chart.is_none());
        assert_eq!(report.warning.as_deref(), Some(MISSING_NUMERIC_WARNING));
        assert_eq!(report.stats.len(), 3);
        assert!(report.summary.is_some());
    }

    #[test]
    fn empty_table_reports_summary_error() {
        let table = Table::new(df!("garantie" => Vec::<&str>::new()).unwrap());
        let report = run_analysis(&table, &request(None, ChartKind::Barres), 10).unwrap();
        assert!(report.stats.is_empty());
        assert!(report.summary.is_none());
        assert_eq!(report.summary_error, Some(AnalysisError::EmptyInput.to_string()));
    }

    #[test]
    fn column_errors_abort_the_run() {
        let mut req = request(None, ChartKind::Barres);
        req.garantie_column = "inconnue".to_string();
        assert_eq!(
            run_analysis(&sample_table(), &req, 10).unwrap_err(),
            AnalysisError::ColumnNotFound("inconnue".to_string())
        );
    }
}
