use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post},
    Router,
    Json,
    http::{Method, StatusCode},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use crate::{
    AppState,
    error::AppError,
    models::{ChartKind, ColumnProfile},
    services::{
        analysis::{run_analysis, AnalysisReport, AnalysisRequest},
        ingest::{self, utils::load_file_from_url},
        preview::{preview, Preview},
        session::Session,
    },
};
use tower_http::cors::{CorsLayer, Any};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/sessions", post(upload_session))
        .route("/sessions/from-url", post(session_from_url))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/analysis", post(analyze).get(last_analysis))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct UrlUploadRequest {
    file_name: String,
    signed_url: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    id: Uuid,
    file_name: String,
    created_at: DateTime<Utc>,
    row_count: usize,
    column_count: usize,
    preview: Preview,
    columns: Vec<ColumnProfile>,
    garantie_options: Vec<String>,
    numeric_options: Vec<String>,
    chart_options: Vec<&'static str>,
    has_analysis: bool,
}

impl SessionView {
    fn new(session: &Session, preview_rows: usize) -> Self {
        let table = &session.table;
        Self {
            id: session.id,
            file_name: session.file_name.clone(),
            created_at: session.created_at,
            row_count: table.row_count(),
            column_count: table.column_count(),
            preview: preview(&table.frame, preview_rows),
            columns: table.schema.columns.clone(),
            garantie_options: table.schema.garantie_options(),
            numeric_options: table.schema.numeric_options(),
            chart_options: ChartKind::ALL.iter().map(|k| k.label()).collect(),
            has_analysis: session.last_analysis.is_some(),
        }
    }
}

async fn open_session(state: &AppState, file_name: String, data: Bytes) -> Result<SessionView, AppError> {
    let limit = state.config.max_file_size;
    if data.len() > limit {
        return Err(AppError::FileTooLarge { size: data.len(), limit });
    }

    let name = file_name.clone();
    let table = tokio::task::spawn_blocking(move || ingest::ingest(&name, &data)).await??;

    let session = state.sessions.create(file_name, table);
    Ok(SessionView::new(&session, state.config.preview_rows))
}

async fn upload_session(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidInput("Uploaded file has no name".to_string()))?;
        let data = field.bytes().await?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) = upload
        .ok_or_else(|| AppError::InvalidInput("Missing multipart field 'file'".to_string()))?;
    tracing::info!("Received upload {}, size: {}KB", file_name, data.len() / 1024);

    let view = open_session(&state, file_name, data).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn session_from_url(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UrlUploadRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    // Fail on the extension before downloading anything.
    ingest::FileFormat::from_file_name(&request.file_name)?;

    tracing::info!("Downloading {} from URL...", request.file_name);
    let download_start = std::time::Instant::now();
    let data = load_file_from_url(&state.http, &request.signed_url, state.config.max_file_size).await?;
    tracing::info!("File downloaded, size: {}KB, took: {:?}", data.len() / 1024, download_start.elapsed());

    let view = open_session(&state, request.file_name, data).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
    Ok(Json(SessionView::new(&session, state.config.preview_rows)))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::SessionNotFound(id.to_string()))
    }
}

#[axum::debug_handler]
async fn analyze(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;

    let table = session.table.clone();
    let bins = state.config.histogram_bins;
    let report = tokio::task::spawn_blocking(move || run_analysis(&table, &request, bins)).await??;

    state
        .sessions
        .record_analysis(&id, report.clone())
        .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;

    Ok(Json(report))
}

async fn last_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisReport>, AppError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
    let report = session
        .last_analysis
        .as_deref()
        .cloned()
        .ok_or_else(|| AppError::AnalysisNotFound(id.to_string()))?;
    Ok(Json(report))
}
