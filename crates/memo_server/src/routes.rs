//! Axum route handlers for the memo REST API.

use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, put};
use axum::Router;
use log::warn;
use memo_core::{ErrorKind, Memo, MemoServiceError, SessionStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// JSON error body with a stable `kind`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
}

impl From<MemoServiceError> for ApiError {
    fn from(err: MemoServiceError) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::LastItem => StatusCode::CONFLICT,
            ErrorKind::IndexOutOfRange | ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("event=api_error module=server status=error kind={kind:?} error={err}");
        }
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.message, "kind": self.kind })),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct MemoInput {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderInput {
    pub ordered_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocationInput {
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: SessionStatus,
    pub location: Option<PathBuf>,
    pub count: usize,
    pub pending_changes: bool,
    pub uptime_secs: u64,
    pub version: &'static str,
}

/// Builds the API router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/location", put(select_location))
        .route("/memos", get(list_memos).post(create_memo))
        .route("/memos/reorder", put(reorder_memos))
        .route(
            "/memos/:id",
            get(get_memo).put(update_memo).delete(delete_memo),
        )
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
}

fn status_snapshot(state: &AppState) -> StatusResponse {
    let session = state.lock_session();
    StatusResponse {
        status: session.status(),
        location: session.repository().location().map(|path| path.to_path_buf()),
        count: session.memos().len(),
        pending_changes: session.has_pending_changes(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        version: memo_core::core_version(),
    }
}

// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// GET /status
async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(status_snapshot(&state))
}

// PUT /location
async fn select_location(
    State(state): State<Arc<AppState>>,
    Json(input): Json<LocationInput>,
) -> ApiResult<Json<StatusResponse>> {
    state.pending_location.offer(input.path);
    let selected = state.lock_session().select_location();
    state.pending_location.clear();
    if !selected? {
        return Err(MemoServiceError::NotReady.into());
    }
    Ok(Json(status_snapshot(&state)))
}

// GET /memos
async fn list_memos(State(state): State<Arc<AppState>>) -> Json<Vec<Memo>> {
    Json(state.lock_session().memos().to_vec())
}

// GET /memos/:id
async fn get_memo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Memo>> {
    state
        .lock_session()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| MemoServiceError::MemoNotFound(id).into())
}

// POST /memos
async fn create_memo(
    State(state): State<Arc<AppState>>,
    Json(input): Json<MemoInput>,
) -> ApiResult<(StatusCode, Json<Memo>)> {
    let memo = state
        .lock_session()
        .add_memo(input.title, input.body.unwrap_or_default())?;
    Ok((StatusCode::CREATED, Json(memo)))
}

// PUT /memos/:id
async fn update_memo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<MemoInput>,
) -> ApiResult<Json<Memo>> {
    let memo = state
        .lock_session()
        .patch_memo(&id, input.title, input.body)?;
    Ok(Json(memo))
}

// DELETE /memos/:id
async fn delete_memo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let removed = state.lock_session().delete_memo(&id)?;
    Ok(Json(json!({ "success": true, "id": removed.id })))
}

// PUT /memos/reorder
async fn reorder_memos(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ReorderInput>,
) -> ApiResult<Json<Vec<Memo>>> {
    let mut session = state.lock_session();
    session.reorder_by_ids(&input.ordered_ids)?;
    Ok(Json(session.memos().to_vec()))
}
