//! Session lifecycle handlers

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sonoreport_core::{Language, PatientRecord, Session, SonographicFindings};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;

#[derive(Serialize)]
pub struct CreatedSession {
    id: Uuid,
}

/// Summary of a session's state
#[derive(Serialize)]
pub struct SessionView {
    id: Uuid,
    created_at: DateTime<Utc>,
    active_language: Language,
    languages: Vec<Language>,
    stale: Vec<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    patient: Option<PatientRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    findings: Option<SonographicFindings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    approved_at: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let languages = session.languages();
        Self {
            id: session.id(),
            created_at: session.created_at(),
            active_language: session.active_language(),
            stale: languages
                .iter()
                .copied()
                .filter(|lang| session.is_stale(*lang))
                .collect(),
            languages,
            patient: session.patient().cloned(),
            findings: session.findings().cloned(),
            approved_at: session.approved_at(),
        }
    }
}

#[derive(Serialize)]
pub struct GuidelineView {
    query: Option<String>,
    passages: Vec<String>,
}

#[derive(Serialize)]
pub struct Approval {
    id: Uuid,
    language: Language,
    approved_at: DateTime<Utc>,
}

/// POST /api/sessions - Open a new drafting session
pub async fn create(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let id = state.sessions.create().await;

    let mut headers = HeaderMap::new();
    let location = format!("/api/sessions/{}", id)
        .parse()
        .map_err(|_| AppError::Internal("Invalid session location".to_string()))?;
    headers.insert(header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(CreatedSession { id })))
}

/// GET /api/sessions/{id}
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

/// DELETE /api/sessions/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/sessions/{id}/guidelines - Context the current report was drafted with
pub async fn guidelines(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GuidelineView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(GuidelineView {
        query: session.findings().map(SonographicFindings::guideline_query),
        passages: session.guideline_context().to_vec(),
    }))
}

/// POST /api/sessions/{id}/approve - Mark the active report as final
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Approval>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let approved_at = session.approve()?;
    let language = session.active_language();

    tracing::info!(session_id = %id, language = %language, "Report approved");

    Ok(Json(Approval {
        id,
        language,
        approved_at,
    }))
}
