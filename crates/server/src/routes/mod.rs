pub mod health;
pub mod metrics;
mod report;
mod session;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    routing::{get, post, put},
};
use sonoreport_core::Language;

use crate::AppState;
use crate::error::AppError;

/// Build the session workflow routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(session::create))
        .route("/sessions/{id}", get(session::read).delete(session::delete))
        .route("/sessions/{id}/approve", post(session::approve))
        .route("/sessions/{id}/guidelines", get(session::guidelines))
        .route(
            "/sessions/{id}/report",
            post(report::generate).get(report::read).put(report::edit),
        )
        .route("/sessions/{id}/recommendation", put(report::edit_recommendation))
        .route("/sessions/{id}/language", post(report::switch_language))
        .route("/sessions/{id}/translation/refresh", post(report::refresh_translation))
}

/// Unwrap a JSON body, reporting malformed input in the service's error shape
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Parse an optional language parameter
fn parse_language(raw: Option<&str>) -> Result<Option<Language>, AppError> {
    raw.map(str::parse::<Language>)
        .transpose()
        .map_err(AppError::from)
}
