//! Turns uploaded bytes into a typed [`Table`].

pub mod csv;
pub mod excel;
pub mod utils;

use std::path::Path;
use crate::error::AnalysisError;
use crate::models::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    pub fn from_file_name(file_name: &str) -> Result<Self, AnalysisError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("xlsx") => Ok(FileFormat::Xlsx),
            _ => Err(AnalysisError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

pub fn ingest(file_name: &str, data: &[u8]) -> Result<Table, AnalysisError> {
    let start = std::time::Instant::now();
    let format = FileFormat::from_file_name(file_name)?;
    tracing::info!("Reading {} ({:?}, {}KB)", file_name, format, data.len() / 1024);

    let frame = match format {
        FileFormat::Csv => csv::read_csv(data)?,
        FileFormat::Xlsx => excel::read_xlsx(data)?,
    };

    let table = Table::new(frame);
    tracing::info!(
        "Ingested {}: {} rows x {} columns in {:?}",
        file_name,
        table.row_count(),
        table.column_count(),
        start.elapsed()
    );

    Ok(table)
}
