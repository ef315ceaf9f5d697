//! Complaint routes: batch processing and the persisted complaint log.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info, warn};
use triage_core::{BatchReport, ComplaintStatus, Error, RawDocument};
use uuid::Uuid;

use crate::state::AppState;

/// Upper bound on one multipart batch.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/process-complaints",
            post(process_complaints).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/complaints", get(list_complaints))
        .route("/complaints/{id}", get(get_complaint))
        .route("/complaints/{id}/status", patch(update_status))
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

fn error_from(err: &Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(serde_json::json!({ "error": err.to_string(), "kind": err.kind() })),
    )
}

/// 200 unless every submitted file failed, in which case the first
/// failure's status.
pub(crate) fn batch_status(report: &BatchReport, submitted: usize) -> StatusCode {
    match report.errors.first() {
        Some(first) if submitted > 0 && report.failed_files == submitted => {
            StatusCode::from_u16(first.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        _ => StatusCode::OK,
    }
}

/// POST /api/process-complaints: score and rank an uploaded batch.
async fn process_complaints(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut docs = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        };
        if field.name() != Some("files") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        match field.bytes().await {
            Ok(bytes) => {
                let mut doc = RawDocument::new(filename, bytes.to_vec());
                doc.content_type = content_type;
                docs.push(doc);
            }
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        }
    }

    if docs.is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "No files uploaded");
    }

    let submitted = docs.len();
    info!("Processing batch of {} file(s)", submitted);

    let orchestrator = state.orchestrator.clone();
    let task = tokio::task::spawn_blocking(move || orchestrator.process_batch(docs));
    match tokio::time::timeout(state.config.batch_timeout, task).await {
        Ok(Ok(report)) => (batch_status(&report, submitted), Json(serde_json::json!(report))),
        Ok(Err(e)) => {
            error!("Batch worker failed: {}", e);
            error_from(&Error::Internal(format!("batch worker failed: {}", e)))
        }
        Err(_) => {
            warn!(
                "Batch of {} file(s) exceeded {:?}",
                submitted, state.config.batch_timeout
            );
            error_from(&Error::Timeout(format!(
                "batch processing exceeded {} seconds",
                state.config.batch_timeout.as_secs()
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListComplaintsQuery {
    limit: Option<usize>,
    status: Option<String>,
}

fn parse_status(raw: &str) -> Result<ComplaintStatus, (StatusCode, Json<serde_json::Value>)> {
    ComplaintStatus::parse(raw).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "Unknown status '{}'. Expected open, in_progress, resolved or rejected.",
                raw
            ),
        )
    })
}

fn parse_id(raw: &str) -> Result<Uuid, (StatusCode, Json<serde_json::Value>)> {
    Uuid::parse_str(raw)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, format!("Invalid complaint id '{}'", raw)))
}

/// GET /api/complaints: persisted complaints, newest first.
async fn list_complaints(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListComplaintsQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let status = match params.status.as_deref().map(parse_status).transpose() {
        Ok(status) => status,
        Err(resp) => return resp,
    };

    match state.store.list_complaints(limit, status) {
        Ok(complaints) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "complaints": complaints,
                "total": complaints.len(),
                "limit": limit,
            })),
        ),
        Err(e) => error_from(&e),
    }
}

/// GET /api/complaints/{id}
async fn get_complaint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.store.get_complaint(&id) {
        Ok(Some(complaint)) => (StatusCode::OK, Json(serde_json::json!(complaint))),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Complaint not found"),
        Err(e) => error_from(&e),
    }
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: String,
}

/// PATCH /api/complaints/{id}/status
async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> impl IntoResponse {
    let (id, status) = match (parse_id(&id), parse_status(&body.status)) {
        (Ok(id), Ok(status)) => (id, status),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    match state.store.update_status(&id, status) {
        Ok(complaint) => {
            info!("Complaint {} marked {}", id, status.as_str());
            (StatusCode::OK, Json(serde_json::json!(complaint)))
        }
        Err(e) => error_from(&e),
    }
}
