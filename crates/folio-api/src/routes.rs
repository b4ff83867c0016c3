//! HTTP routes for the sync controller.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use folio_core::{IndexStats, JobView, SearchProbe};
use folio_jobs::{SyncController, SyncEvent};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SyncController>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/sync/full", post(start_full))
        .route("/api/v1/sync/incremental", post(start_incremental))
        .route("/api/v1/sync/cleanup", post(start_cleanup))
        .route("/api/v1/sync/jobs", get(list_jobs))
        .route("/api/v1/sync/jobs/:id", get(get_job).delete(delete_job))
        .route("/api/v1/sync/jobs/:id/cancel", post(cancel_job))
        .route("/api/v1/sync/stats", get(index_stats))
        .route("/api/v1/sync/search-test", post(search_test))
        .route("/api/v1/sync/events", get(sse_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// TRIGGERS
// =============================================================================

fn accepted(job_id: String) -> impl IntoResponse {
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "jobId": job_id })),
    )
}

async fn start_full(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(accepted(state.controller.start_full_regeneration().await?))
}

async fn start_incremental(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(accepted(state.controller.start_incremental_update().await?))
}

async fn start_cleanup(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(accepted(state.controller.start_cleanup().await?))
}

// =============================================================================
// JOBS
// =============================================================================

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobView>> {
    Json(state.controller.list_jobs().await)
}

async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    state
        .controller
        .get_job(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", id)))
}

async fn cancel_job(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let cancelled = state.controller.cancel_job(&id).await;
    Json(serde_json::json!({ "cancelled": cancelled }))
}

async fn delete_job(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let deleted = state.controller.delete_job(&id).await;
    Json(serde_json::json!({ "deleted": deleted }))
}

// =============================================================================
// INDEX
// =============================================================================

async fn index_stats(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.controller.get_index_stats().await)
}

#[derive(Debug, Default, Deserialize)]
struct SearchTestRequest {
    query: Option<String>,
}

async fn search_test(
    State(state): State<AppState>,
    body: Option<Json<SearchTestRequest>>,
) -> Json<SearchProbe> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    Json(state.controller.test_search(request.query.as_deref()).await)
}

/// Job lifecycle events as server-sent events.
async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let rx = state.controller.events();

    use tokio_stream::StreamExt as _;
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(
        |result: Result<SyncEvent, _>| match result {
            Ok(event) => serde_json::to_string(&event)
                .ok()
                .map(|json| Ok(Event::default().event(event.event_type()).data(json))),
            // Lagged subscribers skip ahead.
            Err(_) => None,
        },
    );

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("keepalive"),
    )
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Internal(folio_core::Error),
}

impl From<folio_core::Error> for ApiError {
    fn from(err: folio_core::Error) -> Self {
        match err {
            folio_core::Error::ScopeBusy { .. } => ApiError::Conflict(err.to_string()),
            folio_core::Error::JobNotFound(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
