//! Chart payloads for the front end. Rendering itself happens client side;
//! this module only decides what to plot and prepares the series.

use serde::Serialize;

use crate::error::AnalysisError;
use crate::models::{ChartKind, StatsTable, Table};
use crate::services::aggregator::{group_keys, numeric_values};

pub const MISSING_NUMERIC_WARNING: &str = "⚠️ Choisissez une colonne numérique pour l'histogramme.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: Option<String>,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: Option<String>,
    pub value: usize,
    /// Percentage of all records.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSeries {
    pub label: Option<String>,
    pub counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Chart {
    Barres {
        title: String,
        bars: Vec<ChartPoint>,
    },
    Camembert {
        title: String,
        slices: Vec<PieSlice>,
    },
    Histogramme {
        title: String,
        column: String,
        /// `bin_edges.len() == bins + 1`; empty when the column has no values.
        bin_edges: Vec<f64>,
        series: Vec<HistogramSeries>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    Chart(Chart),
    MissingNumericSelection,
}

pub fn present(
    kind: ChartKind,
    table: &Table,
    stats: &StatsTable,
    bins: usize,
) -> Result<Presentation, AnalysisError> {
    let chart = match kind {
        ChartKind::Barres => bar_chart(stats),
        ChartKind::Camembert => pie_chart(stats),
        ChartKind::Histogramme => match stats.numeric_column.as_deref() {
            Some(column) => histogram(table, stats, column, bins)?,
            None => return Ok(Presentation::MissingNumericSelection),
        },
    };
    Ok(Presentation::Chart(chart))
}

fn bar_chart(stats: &StatsTable) -> Chart {
    Chart::Barres {
        title: "Répartition des enregistrements par garantie".to_string(),
        bars: stats
            .rows
            .iter()
            .map(|row| ChartPoint { label: row.garantie.clone(), value: row.count })
            .collect(),
    }
}

fn pie_chart(stats: &StatsTable) -> Chart {
    let total = stats.total_count();
    Chart::Camembert {
        title: "Répartition des garanties (camembert)".to_string(),
        slices: stats
            .rows
            .iter()
            .map(|row| PieSlice {
                label: row.garantie.clone(),
                value: row.count,
                share: if total == 0 { 0.0 } else { row.count as f64 * 100.0 / total as f64 },
            })
            .collect(),
    }
}

/// Equal-width bins over the global value range, one count series per group in
/// the order of the statistics table.
fn histogram(table: &Table, stats: &StatsTable, column: &str, bins: usize) -> Result<Chart, AnalysisError> {
    let bins = bins.max(1);
    let keys = group_keys(table, &stats.garantie_column)?;
    let values = numeric_values(table, column)?;

    let (lo, hi) = values
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));

    let bin_edges: Vec<f64> = if lo > hi {
        Vec::new()
    } else if lo == hi {
        vec![lo, lo + 1.0]
    } else {
        let width = (hi - lo) / bins as f64;
        (0..=bins).map(|i| if i == bins { hi } else { lo + width * i as f64 }).collect()
    };
    let bin_count = bin_edges.len().saturating_sub(1);

    let mut series: Vec<HistogramSeries> = stats
        .rows
        .iter()
        .map(|row| HistogramSeries { label: row.garantie.clone(), counts: vec![0; bin_count] })
        .collect();

    if bin_count > 0 {
        let width = (bin_edges[bin_count] - bin_edges[0]) / bin_count as f64;
        for (key, value) in keys.iter().zip(values.iter()) {
            let Some(v) = value else { continue };
            let Some(target) = series.iter_mut().find(|s| s.label == *key) else { continue };
            let bin = (((v - bin_edges[0]) / width).floor() as usize).min(bin_count - 1);
            target.counts[bin] += 1;
        }
    }

    Ok(Chart::Histogramme {
        title: format!("Distribution de {} par garantie", column),
        column: column.to_string(),
        bin_edges,
        series,
    })
}
