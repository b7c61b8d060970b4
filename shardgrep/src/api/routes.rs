use crate::api::server::AppState;
use crate::api::types::{ProcessRequest, ProcessResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Instant;

/// POST /process - match one shard of lines
pub async fn process(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();

    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected /process body: {}", rejection.body_text());
            crate::metrics::record_process_request("bad_request", start.elapsed());
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            return (status, format!("bad request: {}", rejection.body_text())).into_response();
        }
    };

    let line_count = request.lines.len();
    let mode = request.mode();
    let matcher = state.matcher.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        matcher.find_matches(&request.lines, &request.pattern, mode)
    })
    .await;

    let response = match outcome {
        Ok(Ok(matches)) => {
            tracing::debug!("Processed {} lines, {} matches", line_count, matches.len());
            crate::metrics::record_process_request("ok", start.elapsed());
            ProcessResponse::ok(matches)
        }
        Ok(Err(e)) => {
            tracing::warn!("Match failed: {}", e);
            crate::metrics::record_process_request("error", start.elapsed());
            ProcessResponse::failed(e.to_string())
        }
        Err(e) => {
            tracing::error!("Matcher task failed: {}", e);
            crate::metrics::record_process_request("error", start.elapsed());
            ProcessResponse::failed(format!("matcher task failed: {}", e))
        }
    };

    Json(response).into_response()
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub workers: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
        workers: state.workers,
    })
}

/// GET /metrics - Prometheus exposition, 404 when no recorder is installed
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
