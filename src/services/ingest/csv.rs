use std::io::Cursor;
use polars::prelude::*;
use crate::error::AnalysisError;

const TYPE_DETECTION_ROWS: usize = 1000;

/// Reads a comma separated file with a header row; column types are inferred
/// by polars from the leading rows.
pub fn read_csv(data: &[u8]) -> Result<DataFrame, AnalysisError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(data);
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(AnalysisError::UnparsableFile("CSV file is empty".to_string()));
    }

    CsvReader::new(Cursor::new(data.to_vec()))
        .has_header(true)
        .infer_schema(Some(TYPE_DETECTION_ROWS))
        .finish()
        .map_err(|e| AnalysisError::UnparsableFile(format!("Failed to parse CSV: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_numeric_and_text_columns() {
        let df = read_csv(b"garantie,montant\nA,10\nB,\nA,30.5\n").unwrap();
        assert_eq!(df.shape(), (3, 2));
        assert_eq!(df.column("garantie").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("montant").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("montant").unwrap().null_count(), 1);
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let df = read_csv("\u{feff}garantie\nA\n".as_bytes()).unwrap();
        assert_eq!(df.get_column_names(), vec!["garantie"]);
    }

    #[test]
    fn header_only_file_gives_empty_table() {
        let df = read_csv(b"garantie,montant\n").unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn empty_file_is_unparsable() {
        assert!(matches!(read_csv(b"  \n"), Err(AnalysisError::UnparsableFile(_))));
    }
}
