//! Report drafting through the language model

use sonoreport_core::{ReportError, ReportRequest, SectionKind, outline, prompt};

use super::client::LanguageModel;

/// Draft the English report. Exactly one gateway call.
pub async fn compose(
    model: &dyn LanguageModel,
    request: &ReportRequest<'_>,
) -> Result<String, ReportError> {
    let prompt = prompt::report_prompt(request);

    tracing::info!(
        patient_id = %request.patient.id,
        context_chunks = request.guideline_context.len(),
        "Drafting report"
    );

    let result = model.generate(&prompt).await;
    super::record_call("compose", &result);
    let report = clean_response(&result?);

    if report.is_empty() {
        return Err(ReportError::Gateway("Model returned an empty report".to_string()));
    }
    if !has_recommendation(&report) {
        tracing::warn!(
            patient_id = %request.patient.id,
            "Drafted report has no recommendation section"
        );
    }

    Ok(report)
}

/// Whether the text has a recommendation section, in either language
pub(crate) fn has_recommendation(report: &str) -> bool {
    outline(report)
        .iter()
        .any(|section| section.kind == Some(SectionKind::Recommendation))
}

/// Strip surrounding whitespace and a markdown code fence, if the model
/// wrapped its answer in one.
pub(crate) fn clean_response(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(after) = trimmed.strip_prefix("```") {
        // Drop an info string such as ```text
        let body = after.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        if let Some(inner) = body.trim_end().strip_suffix("```") {
            return inner.trim().to_string();
        }
    }

    trimmed.to_string()
}
