use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

/// Failures of the ingestion / aggregation / summary pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Unable to read file: {0}")]
    UnparsableFile(String),
    #[error("Unsupported file format: {0} (expected .csv or .xlsx)")]
    UnsupportedFormat(String),
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Column {column} is not numeric (found {found})")]
    InvalidColumnType { column: String, found: String },
    #[error("No data to summarize")]
    EmptyInput,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("No analysis available for session {0}")]
    AnalysisNotFound(String),
    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: usize, limit: usize },
    #[error("HTTP error: {0}")]
    HttpError(String),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<polars::prelude::PolarsError> for AnalysisError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        AnalysisError::UnparsableFile(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::InvalidInput(err.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AnalysisNotFound(_) => StatusCode::NOT_FOUND,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::HttpError(_) => StatusCode::BAD_GATEWAY,
            AppError::Analysis(err) => match err {
                AnalysisError::UnparsableFile(_) => StatusCode::BAD_REQUEST,
                AnalysisError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
                AnalysisError::ColumnNotFound(_) => StatusCode::NOT_FOUND,
                AnalysisError::InvalidColumnType { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                AnalysisError::EmptyInput => StatusCode::UNPROCESSABLE_ENTITY,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_errors_map_to_client_statuses() {
        let err = AppError::from(AnalysisError::ColumnNotFound("garantie".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = AppError::from(AnalysisError::InvalidColumnType {
            column: "agence".into(),
            found: "categorical".into(),
        });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Column agence is not numeric (found categorical)");
    }

    #[test]
    fn oversize_upload_is_413() {
        let err = AppError::FileTooLarge { size: 20, limit: 10 };
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
