//! Patient metadata used in the report header

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Placeholder for demographic fields the source row does not carry
pub const NOT_AVAILABLE: &str = "N/A";

/// Clinical history used when neither the row nor the lookup table has one
pub const DEFAULT_CLINICAL_HISTORY: &str = "Routine breast imaging examination.";

/// Synthetic clinical histories for the demonstration cohort
const CLINICAL_HISTORIES: &[(&str, &str)] = &[
    (
        "TCGA_CS_4941",
        "Patient presents with palpable mass in the right breast. Family history of breast cancer in maternal grandmother. Routine screening mammography recommended.",
    ),
    (
        "TCGA_CS_4942",
        "Annual screening mammography. Previous benign biopsy 3 years ago. No interval changes noted on clinical examination.",
    ),
    (
        "TCGA_CS_4943",
        "Follow-up imaging for previously identified BI-RADS 3 lesion. Patient with high-risk family history. Recommended 6-month follow-up.",
    ),
    (
        "TCGA_CS_4944",
        "Patient presents with nipple discharge. Clinical examination shows asymmetry. Diagnostic mammography and ultrasound requested.",
    ),
    (
        "TCGA_CS_5393",
        "Screening mammography in high-risk patient. BRCA mutation carrier. Annual MRI recommended.",
    ),
    (
        "TCGA_CS_5395",
        "Follow-up imaging after lumpectomy 2 years ago. No palpable abnormalities on clinical examination. Routine surveillance.",
    ),
    (
        "TCGA_CS_5396",
        "Patient with dense breast tissue. Screening mammography with supplementary ultrasound. Previous normal mammogram 1 year ago.",
    ),
    (
        "TCGA_CS_5397",
        "Diagnostic workup for breast pain and tenderness. Clinical examination reveals no discrete masses. Diagnostic imaging to rule out pathology.",
    ),
    (
        "TCGA_CS_6186",
        "High-risk screening patient. History of atypical ductal hyperplasia. Enhanced surveillance protocol.",
    ),
    (
        "TCGA_CS_6188",
        "Follow-up for BI-RADS 0 assessment from screening. Additional imaging for complete evaluation.",
    ),
];

/// Patient fields as submitted; everything but the id may be missing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientInput {
    pub id: String,
    #[serde(default, alias = "age_at_initial_pathologic")]
    pub age: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub laterality: Option<String>,
    #[serde(default)]
    pub clinical_history: Option<String>,
}

/// Patient record with every field resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: String,
    pub age: String,
    pub gender: String,
    pub laterality: String,
    pub clinical_history: String,
}

impl PatientRecord {
    /// Resolve submitted fields, substituting defaults where possible.
    ///
    /// A blank patient id cannot be defaulted and aborts the action.
    pub fn resolve(input: PatientInput) -> Result<Self, ReportError> {
        let id = input.id.trim().to_string();
        if id.is_empty() {
            return Err(ReportError::Input("Patient ID is required".to_string()));
        }

        let clinical_history = present(input.clinical_history)
            .or_else(|| lookup_clinical_history(&id).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_CLINICAL_HISTORY.to_string());

        Ok(Self {
            age: present(input.age).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            gender: present(input.gender).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            laterality: present(input.laterality).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            clinical_history,
            id,
        })
    }

    /// Offline stand-in used when no patient roster is available
    pub fn test_patient() -> Self {
        Self {
            id: "TEST_PATIENT_001".to_string(),
            age: "45".to_string(),
            gender: "Female".to_string(),
            laterality: "Left".to_string(),
            clinical_history: DEFAULT_CLINICAL_HISTORY.to_string(),
        }
    }
}

/// Synthetic clinical history for a known patient id
pub fn lookup_clinical_history(patient_id: &str) -> Option<&'static str> {
    CLINICAL_HISTORIES
        .iter()
        .find(|(id, _)| *id == patient_id)
        .map(|(_, history)| *history)
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str) -> PatientInput {
        PatientInput {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn blank_id_is_rejected() {
        let err = PatientRecord::resolve(input("   ")).unwrap_err();
        assert!(matches!(err, ReportError::Input(_)));
    }

    #[test]
    fn missing_demographics_default_to_not_available() {
        let record = PatientRecord::resolve(input("P-1")).unwrap();
        assert_eq!(record.age, NOT_AVAILABLE);
        assert_eq!(record.gender, NOT_AVAILABLE);
        assert_eq!(record.laterality, NOT_AVAILABLE);
    }

    #[test]
    fn clinical_history_falls_back_to_lookup_then_default() {
        let known = PatientRecord::resolve(input("TCGA_CS_5393")).unwrap();
        assert!(known.clinical_history.contains("BRCA mutation carrier"));

        let unknown = PatientRecord::resolve(input("P-2")).unwrap();
        assert_eq!(unknown.clinical_history, DEFAULT_CLINICAL_HISTORY);
    }

    #[test]
    fn submitted_history_wins_over_lookup() {
        let record = PatientRecord::resolve(PatientInput {
            id: "TCGA_CS_5393".to_string(),
            clinical_history: Some("Screening only.".to_string()),
            age: Some(" 61 ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(record.clinical_history, "Screening only.");
        assert_eq!(record.age, "61");
    }

    #[test]
    fn spreadsheet_nan_counts_as_missing() {
        let record = PatientRecord::resolve(PatientInput {
            id: "TCGA_CS_6188".to_string(),
            clinical_history: Some("NaN".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(record.clinical_history.starts_with("Follow-up for BI-RADS 0"));
    }

    #[test]
    fn row_field_alias_for_age() {
        let parsed: PatientInput = serde_json::from_str(
            r#"{"id": "TCGA_CS_4941", "age_at_initial_pathologic": "52", "gender": "FEMALE"}"#,
        )
        .unwrap();
        let record = PatientRecord::resolve(parsed).unwrap();
        assert_eq!(record.age, "52");
        assert_eq!(record.gender, "FEMALE");
    }
}
