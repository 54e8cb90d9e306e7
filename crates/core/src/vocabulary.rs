//! Section header vocabulary for the two report languages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

/// Language variant of a report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "de")]
    German,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::German];

    /// ISO 639-1 code
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::German => "de",
        }
    }

    /// Header of the section physicians edit directly
    pub fn recommendation_header(self) -> &'static str {
        SectionKind::Recommendation.label(self)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "de" | "deutsch" | "german" => Ok(Language::German),
            other => Err(ReportError::Input(format!("Unsupported language '{other}'"))),
        }
    }
}

/// Recognized report sections
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Title,
    ClinicalHistory,
    Findings,
    Impression,
    Recommendation,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Title,
        SectionKind::ClinicalHistory,
        SectionKind::Findings,
        SectionKind::Impression,
        SectionKind::Recommendation,
    ];

    /// Canonical header label in the given language
    pub fn label(self, lang: Language) -> &'static str {
        self.labels(lang)[0]
    }

    /// All accepted labels, canonical first
    fn labels(self, lang: Language) -> &'static [&'static str] {
        match (self, lang) {
            (SectionKind::Title, Language::English) => &["ULTRASOUND REPORT"],
            (SectionKind::Title, Language::German) => &["ULTRASCHALLBEFUND", "ULTRASCHALLBERICHT"],
            (SectionKind::ClinicalHistory, Language::English) => &["CLINICAL HISTORY"],
            (SectionKind::ClinicalHistory, Language::German) => &["KLINISCHE ANAMNESE"],
            (SectionKind::Findings, Language::English) => &["FINDINGS"],
            (SectionKind::Findings, Language::German) => &["BEFUND"],
            (SectionKind::Impression, Language::English) => &["IMPRESSION"],
            (SectionKind::Impression, Language::German) => &["EINDRUCK"],
            (SectionKind::Recommendation, Language::English) => &["RECOMMENDATION"],
            // The misspelling shows up in older drafts and model output
            (SectionKind::Recommendation, Language::German) => &["EMPFEHLUNG", "EMPFHEHLUNG"],
        }
    }
}

/// Header-block field labels, English to German
pub const FIELD_LABELS: &[(&str, &str)] = &[
    ("Patient ID", "Patienten-ID"),
    ("Patient Age", "Patientenalter"),
    ("Report Date", "Befunddatum"),
    ("Report Time", "Befundzeit"),
    ("Location", "Ort"),
    ("Clinical History", "Klinische Anamnese"),
];

/// Look up a header label in either language (case-insensitive, aliases accepted).
pub fn kind_of(label: &str) -> Option<(SectionKind, Language)> {
    let wanted = normalize_label(label);
    for kind in SectionKind::ALL {
        for lang in Language::ALL {
            if kind
                .labels(lang)
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(&wanted))
            {
                return Some((kind, lang));
            }
        }
    }
    None
}

/// Map a header label into the other language's canonical label.
///
/// Returns `None` for labels outside the vocabulary or labels that do not
/// belong to `from`.
pub fn translate_label(label: &str, from: Language, to: Language) -> Option<&'static str> {
    match kind_of(label) {
        Some((kind, lang)) if lang == from => Some(kind.label(to)),
        _ => None,
    }
}

/// Strip one trailing colon and collapse whitespace runs
pub(crate) fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    trimmed
        .strip_suffix(':')
        .unwrap_or(trimmed)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_headers() {
        assert_eq!(Language::English.recommendation_header(), "RECOMMENDATION");
        assert_eq!(Language::German.recommendation_header(), "EMPFEHLUNG");
    }

    #[test]
    fn lookup_is_case_insensitive_and_accepts_colon() {
        assert_eq!(
            kind_of("Findings:"),
            Some((SectionKind::Findings, Language::English))
        );
        assert_eq!(
            kind_of("  eindruck "),
            Some((SectionKind::Impression, Language::German))
        );
        assert_eq!(kind_of("THIS IS NOT A HEADER"), None);
    }

    #[test]
    fn aliases_resolve_to_canonical_kind() {
        assert_eq!(
            kind_of("EMPFHEHLUNG"),
            Some((SectionKind::Recommendation, Language::German))
        );
        assert_eq!(
            kind_of("ULTRASCHALLBERICHT"),
            Some((SectionKind::Title, Language::German))
        );
    }

    #[test]
    fn labels_translate_both_ways() {
        assert_eq!(
            translate_label("RECOMMENDATION", Language::English, Language::German),
            Some("EMPFEHLUNG")
        );
        assert_eq!(
            translate_label("BEFUND:", Language::German, Language::English),
            Some("FINDINGS")
        );
        assert_eq!(
            translate_label("BEFUND", Language::English, Language::German),
            None
        );
    }

    #[test]
    fn language_parsing() {
        assert_eq!("de".parse::<Language>().unwrap(), Language::German);
        assert_eq!("English".parse::<Language>().unwrap(), Language::English);
        assert!("fr".parse::<Language>().is_err());
    }
}
