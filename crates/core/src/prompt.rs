//! Prompt templates for report drafting and translation

use chrono::NaiveDateTime;

use crate::findings::SonographicFindings;
use crate::patient::PatientRecord;
use crate::vocabulary::{FIELD_LABELS, Language, SectionKind};

/// Everything the report prompt interpolates
pub struct ReportRequest<'a> {
    pub patient: &'a PatientRecord,
    pub findings: &'a SonographicFindings,
    pub guideline_context: &'a [String],
    pub timestamp: NaiveDateTime,
    /// Site line printed in the report header
    pub location: &'a str,
}

/// Build the report-generation prompt
pub fn report_prompt(request: &ReportRequest<'_>) -> String {
    let patient = request.patient;
    let findings = request.findings;
    let context = request.guideline_context.join("\n\n");
    let date = request.timestamp.format("%d.%m.%Y");
    let time = request.timestamp.format("%H:%M");
    let site = request.location;

    let title = SectionKind::Title.label(Language::English);
    let findings_header = SectionKind::Findings.label(Language::English);
    let impression_header = SectionKind::Impression.label(Language::English);
    let recommendation_header = SectionKind::Recommendation.label(Language::English);

    format!(
        r#"You are an expert Breast Radiologist writing a clinical ultrasound report in standard radiology format. Write ONLY the complete report with all required sections.

BI-RADS GUIDELINES (CONTEXT):
{context}

PATIENT INFORMATION:
- Patient ID: {id}
- Age: {age} years
- Gender: {gender}
- Laterality: {laterality}
- Report Date: {date}
- Report Time: {time}
- Location: {site}

CLINICAL HISTORY:
{history}

ULTRASOUND FINDINGS (from segmentation analysis):
- Location: {lesion_location}
- Size: {size} mm
- Shape: {shape}
- Margin: {margin}
- Echo Pattern: {echo}

OUTPUT REQUIREMENTS:
- Write a complete professional radiology report starting with the header section
- Use BI-RADS standardized terminology and sentence structures
- Follow standard radiology report format exactly as shown below
- Format exactly as follows (include all sections):

{title}

Patient ID: {id}
Patient Age: {age} years
Report Date: {date}
Report Time: {time}
Location: {site}

Clinical History:
{history}

{findings_header}:
[Describe the findings using BI-RADS standardized terminology. Write in complete, professional sentences as used in real clinical radiology reports. Include location, size, shape, margin, echo pattern, and any additional relevant observations. Be descriptive and use proper medical terminology.]

{impression_header}:
[Provide the BI-RADS category (0-6) and clinical interpretation using standard BI-RADS language. State the category clearly and provide appropriate recommendations based on BI-RADS guidelines.]

{recommendation_header}:
[Provide clinical recommendations based on BI-RADS category and findings. Include follow-up imaging, biopsy recommendations, or routine screening as appropriate.]

Do NOT include any introductory text like "Here is the report" or "Certainly". Start directly with "{title}"."#,
        id = patient.id,
        age = patient.age,
        gender = patient.gender,
        laterality = patient.laterality,
        history = patient.clinical_history,
        lesion_location = findings.location,
        size = findings.size_mm,
        shape = findings.shape,
        margin = findings.margin,
        echo = findings.echo_pattern,
    )
}

/// Build the prompt translating an English report into `target`.
///
/// The header mapping is generated from the vocabulary so the translated
/// report keeps headers the section engine recognizes.
pub fn translation_prompt(report: &str, target: Language) -> String {
    let source = Language::English;
    let mut mapping = String::new();

    for kind in SectionKind::ALL {
        mapping.push_str(&format!(
            "- Translate \"{}\" to \"{}\"\n",
            kind.label(source),
            kind.label(target)
        ));
    }
    for (english, german) in FIELD_LABELS {
        let translated = match target {
            Language::German => german,
            Language::English => english,
        };
        mapping.push_str(&format!("- Translate \"{english}\" to \"{translated}\"\n"));
    }

    let structure = [
        SectionKind::Findings,
        SectionKind::Impression,
        SectionKind::Recommendation,
    ]
    .iter()
    .map(|kind| kind.label(target))
    .collect::<Vec<_>>()
    .join(" → ");
    let title = SectionKind::Title.label(target);

    format!(
        r#"You are a medical translator specializing in radiology reports. Translate the following English radiology report to {language}, maintaining the exact format and structure.

CRITICAL REQUIREMENTS:
- Translate the COMPLETE report including header section (Patient ID, Age, Date, Location, Clinical History)
- Maintain the exact structure: Header → Clinical History → {structure}
- Keep every section header on its own line, in capital letters, followed by a colon
{mapping}- Use standard {language} medical terminology as used in real clinical radiology reports
- Keep BI-RADS categories as "BI-RADS" (not translated)
- Do NOT add any introductory text, explanations, or meta-commentary

English Report:
{report}

Output ONLY the complete translation maintaining the exact format - start with "{title}"."#,
        language = language_name(target),
    )
}

fn language_name(lang: Language) -> &'static str {
    match lang {
        Language::English => "English",
        Language::German => "German",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::{EchoPattern, Location, Margin, Shape};
    use chrono::NaiveDate;

    fn findings() -> SonographicFindings {
        SonographicFindings {
            location: Location::NineOClock,
            size_mm: 22,
            shape: Shape::Round,
            margin: Margin::Indistinct,
            echo_pattern: EchoPattern::Complex,
        }
    }

    #[test]
    fn report_prompt_fills_every_placeholder() {
        let patient = PatientRecord::test_patient();
        let findings = findings();
        let context = vec!["Chunk one.".to_string(), "Chunk two.".to_string()];
        let timestamp = NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();

        let prompt = report_prompt(&ReportRequest {
            patient: &patient,
            findings: &findings,
            guideline_context: &context,
            timestamp,
            location: "Remagen, Germany",
        });

        assert!(prompt.contains("Chunk one.\n\nChunk two."));
        assert!(prompt.contains("- Patient ID: TEST_PATIENT_001"));
        assert!(prompt.contains("- Age: 45 years"));
        assert!(prompt.contains("- Laterality: Left"));
        assert!(prompt.contains("Report Date: 07.03.2026"));
        assert!(prompt.contains("Report Time: 09:05"));
        assert!(prompt.contains("- Location: 9 o'clock"));
        assert!(prompt.contains("- Size: 22 mm"));
        assert!(prompt.contains("- Echo Pattern: Complex"));
        assert!(prompt.contains("\nRECOMMENDATION:\n"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn report_prompt_tolerates_empty_context() {
        let patient = PatientRecord::test_patient();
        let findings = findings();
        let prompt = report_prompt(&ReportRequest {
            patient: &patient,
            findings: &findings,
            guideline_context: &[],
            timestamp: NaiveDateTime::default(),
            location: "Remagen, Germany",
        });
        assert!(prompt.contains("BI-RADS GUIDELINES (CONTEXT):\n\n\nPATIENT INFORMATION:"));
    }

    #[test]
    fn translation_prompt_lists_header_mapping() {
        let prompt = translation_prompt("FINDINGS:\nNo mass.", Language::German);
        assert!(prompt.contains("Translate \"RECOMMENDATION\" to \"EMPFEHLUNG\""));
        assert!(prompt.contains("Translate \"IMPRESSION\" to \"EINDRUCK\""));
        assert!(prompt.contains("Translate \"Patient ID\" to \"Patienten-ID\""));
        assert!(prompt.contains("BEFUND → EINDRUCK → EMPFEHLUNG"));
        assert!(prompt.contains("English Report:\nFINDINGS:\nNo mass."));
        assert!(prompt.ends_with("start with \"ULTRASCHALLBEFUND\"."));
    }
}
