//! Report translation through the language model

use sonoreport_core::{Language, ReportError, SectionKind, prompt};

use super::client::LanguageModel;
use super::composer::{clean_response, has_recommendation};

/// Translate an English report into `target`, keeping its sections.
pub async fn translate(
    model: &dyn LanguageModel,
    report: &str,
    target: Language,
) -> Result<String, ReportError> {
    if target == Language::English {
        return Ok(report.to_string());
    }

    let prompt = prompt::translation_prompt(report, target);
    tracing::info!(target_language = %target, "Translating report");

    let result = model.generate(&prompt).await;
    super::record_call("translate", &result);
    let translated = clean_response(&result?);

    if translated.is_empty() {
        return Err(ReportError::Gateway(
            "Model returned an empty translation".to_string(),
        ));
    }

    let recommendation = SectionKind::Recommendation.label(target);
    if !has_recommendation(&translated) {
        tracing::warn!(
            target_language = %target,
            header = recommendation,
            "Translation lost its recommendation header"
        );
    }

    Ok(translated)
}
