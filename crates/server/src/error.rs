//! Application error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sonoreport_core::ReportError;

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    TooManyRequests(String),
    BadGateway(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl AppError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            AppError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "splice_failed", msg)
            }
            AppError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, "throttled", msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "gateway_error", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code = code, error = %message, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), code = code, error = %message, "Request rejected");
        }

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        let message = err.to_string();
        match err {
            ReportError::Input(_) => AppError::BadRequest(message),
            ReportError::MissingVariant(_) => AppError::Conflict(message),
            ReportError::SpliceConsistency(_) => AppError::Unprocessable(message),
            ReportError::Gateway(_) => AppError::BadGateway(message),
            ReportError::Retrieval(_) => AppError::BadGateway(message),
        }
    }
}
