//! Report drafting, translation and editing handlers

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use sonoreport_core::{
    Language, LanguageSwitch, PatientInput, PatientRecord, ReportRequest, Section, SectionKind,
    Session, SonographicFindings, outline,
};
use uuid::Uuid;

use super::{json_body, parse_language};
use crate::AppState;
use crate::ai::{composer, translator};
use crate::error::AppError;
use crate::guidelines;

/// `?lang=en|de`; defaults differ per endpoint
#[derive(Debug, Deserialize, Default)]
pub struct LanguageQuery {
    lang: Option<String>,
}

/// Request body for report generation
#[derive(Deserialize)]
pub struct GenerateRequest {
    /// Falls back to the built-in test patient when absent
    #[serde(default)]
    patient: Option<PatientInput>,
    findings: SonographicFindings,
}

#[derive(Deserialize)]
pub struct TextBody {
    text: String,
}

#[derive(Deserialize)]
pub struct LanguageRequest {
    language: String,
}

#[derive(Serialize)]
pub struct SectionView {
    header: Option<String>,
    kind: Option<SectionKind>,
    body: String,
}

impl From<Section<'_>> for SectionView {
    fn from(section: Section<'_>) -> Self {
        Self {
            header: section.header.map(str::to_string),
            kind: section.kind,
            body: section.body.to_string(),
        }
    }
}

/// One language variant of a session's report
#[derive(Serialize)]
pub struct ReportView {
    session_id: Uuid,
    language: Language,
    active: bool,
    text: String,
    recommendation: String,
    sections: Vec<SectionView>,
    /// Translated from an English text that has since changed
    stale: bool,
}

impl ReportView {
    fn of(session: &Session, lang: Language) -> Result<Self, AppError> {
        let variant = session.variant(lang)?;
        Ok(Self {
            session_id: session.id(),
            language: lang,
            active: session.active_language() == lang,
            text: variant.text.clone(),
            recommendation: variant.recommendation.clone(),
            sections: outline(&variant.text)
                .into_iter()
                .map(SectionView::from)
                .collect(),
            stale: session.is_stale(lang),
        })
    }
}

#[derive(Serialize)]
pub struct RecommendationUpdate {
    changed: bool,
    #[serde(flatten)]
    report: ReportView,
}

#[derive(Serialize)]
pub struct LanguageUpdate {
    outcome: &'static str,
    #[serde(flatten)]
    report: ReportView,
}

/// POST /api/sessions/{id}/report - Draft a new English report
///
/// Input is validated before any upstream call. Guideline retrieval
/// degrades to no context; a gateway failure leaves the session as it was.
pub async fn generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<ReportView>, AppError> {
    let request = json_body(payload)?;
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;

    let patient = match request.patient {
        Some(input) => PatientRecord::resolve(input)?,
        None => PatientRecord::test_patient(),
    };
    let findings = request.findings;
    findings.validate()?;
    let model = state.services.model()?;

    let context = guidelines::retrieve_context(
        state.services.guidelines.as_deref(),
        &findings.guideline_query(),
        state.services.guideline_k,
    )
    .await;

    let timestamp = chrono::Local::now().naive_local();
    let text = composer::compose(
        model,
        &ReportRequest {
            patient: &patient,
            findings: &findings,
            guideline_context: &context,
            timestamp,
            location: &state.services.report_location,
        },
    )
    .await?;

    tracing::info!(
        session_id = %id,
        patient_id = %patient.id,
        context_chunks = context.len(),
        "Report drafted"
    );
    session.install_report(patient, findings, context, text);

    Ok(Json(ReportView::of(&session, Language::English)?))
}

/// GET /api/sessions/{id}/report?lang= - Defaults to the active language
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<ReportView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    let lang = parse_language(query.lang.as_deref())?.unwrap_or(session.active_language());
    Ok(Json(ReportView::of(&session, lang)?))
}

/// PUT /api/sessions/{id}/report?lang= - Replace the full text of a variant
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LanguageQuery>,
    payload: Result<Json<TextBody>, JsonRejection>,
) -> Result<Json<ReportView>, AppError> {
    let body = json_body(payload)?;
    if body.text.trim().is_empty() {
        return Err(AppError::BadRequest("Report text must not be empty".to_string()));
    }

    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let lang = parse_language(query.lang.as_deref())?.unwrap_or(session.active_language());

    session.edit_report(lang, body.text)?;
    tracing::info!(session_id = %id, language = %lang, "Report text edited");

    Ok(Json(ReportView::of(&session, lang)?))
}

/// PUT /api/sessions/{id}/recommendation?lang= - Apply the physician's recommendation
pub async fn edit_recommendation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LanguageQuery>,
    payload: Result<Json<TextBody>, JsonRejection>,
) -> Result<Json<RecommendationUpdate>, AppError> {
    let body = json_body(payload)?;
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let lang = parse_language(query.lang.as_deref())?.unwrap_or(session.active_language());

    let changed = session.edit_recommendation(lang, &body.text)?;
    tracing::info!(
        session_id = %id,
        language = %lang,
        changed = changed,
        "Recommendation applied"
    );

    Ok(Json(RecommendationUpdate {
        changed,
        report: ReportView::of(&session, lang)?,
    }))
}

/// POST /api/sessions/{id}/language - Switch variant, translating on a cache miss
pub async fn switch_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<LanguageRequest>, JsonRejection>,
) -> Result<Json<LanguageUpdate>, AppError> {
    let request = json_body(payload)?;
    let lang: Language = request.language.parse()?;

    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;

    let outcome = match session.switch_language(lang)? {
        LanguageSwitch::Active => "active",
        LanguageSwitch::Ready => "ready",
        LanguageSwitch::NeedsTranslation(key) => {
            let model = state.services.model()?;
            let english = session.variant(Language::English)?.text.clone();
            let text = translator::translate(model, &english, lang).await?;
            session.install_translation(key, text);
            "translated"
        }
    };
    tracing::info!(session_id = %id, language = %lang, outcome = outcome, "Language switched");

    Ok(Json(LanguageUpdate {
        outcome,
        report: ReportView::of(&session, lang)?,
    }))
}

/// POST /api/sessions/{id}/translation/refresh?lang= - Translate the current
/// English text again, bypassing the cache. Defaults to German.
pub async fn refresh_translation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<ReportView>, AppError> {
    let target = parse_language(query.lang.as_deref())?.unwrap_or(Language::German);
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let model = state.services.model()?;

    let key = session.invalidate_translation(target)?;
    let english = session.variant(Language::English)?.text.clone();
    let text = translator::translate(model, &english, target).await?;
    session.install_translation(key, text);

    tracing::info!(session_id = %id, language = %target, "Translation refreshed");
    Ok(Json(ReportView::of(&session, target)?))
}
