//! Health check endpoint

use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    gateway_configured: bool,
    guidelines_configured: bool,
    sessions: usize,
}

/// GET /health - Liveness plus which upstream integrations are configured.
///
/// Upstreams are not probed: an unreachable vector store only degrades
/// reports, and the gateway is checked on first use.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        gateway_configured: state.services.model.is_some(),
        guidelines_configured: state.services.guidelines.is_some(),
        sessions: state.sessions.len().await,
    })
}
