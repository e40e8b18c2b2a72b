//! Health probe handler.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;
use std::time::Instant;

/// Ping response with database round-trip timing.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    /// Milliseconds spent on the metadata health check.
    pub database_ms: f64,
}

/// Handle GET /v1/ping.
pub async fn ping(State(state): State<AppState>) -> ApiResult<Json<PingResponse>> {
    let started = Instant::now();
    state
        .metadata
        .health_check()
        .await
        .map_err(|e| ApiError::Internal(format!("database unreachable: {e}")))?;
    let database_ms = started.elapsed().as_secs_f64() * 1000.0;

    Ok(Json(PingResponse {
        status: "ok",
        database_ms,
    }))
}
