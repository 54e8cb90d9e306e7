//! Per-session report state
//!
//! A session owns one report per language variant together with the
//! physician's recommendation for it. Edits to the recommendation are
//! detected by comparing the current value against the value last spliced
//! into the report, never by a dirty flag.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ReportError;
use crate::findings::SonographicFindings;
use crate::patient::PatientRecord;
use crate::section;
use crate::vocabulary::Language;

/// Identity of a translation: source text digest plus target language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TranslationKey {
    pub source: String,
    pub target: Language,
}

impl TranslationKey {
    pub fn new(source_text: &str, target: Language) -> Self {
        Self {
            source: hex::encode(Sha256::digest(source_text.as_bytes())),
            target,
        }
    }
}

/// Report text of one language variant
#[derive(Debug, Clone, Serialize)]
pub struct ReportVariant {
    pub text: String,
    /// Recommendation as the physician last entered it
    pub recommendation: String,
    /// Recommendation last spliced into `text`
    #[serde(skip)]
    previous_recommendation: String,
    /// Digest of the English text this variant was translated from
    #[serde(skip)]
    source: Option<String>,
}

impl ReportVariant {
    fn new(lang: Language, text: String, source: Option<String>) -> Self {
        let recommendation = section::extract(&text, lang.recommendation_header())
            .unwrap_or_default()
            .to_string();
        Self {
            text,
            previous_recommendation: recommendation.clone(),
            recommendation,
            source,
        }
    }

    /// Splice a changed recommendation into the text. Converges in one step.
    fn sync(&mut self, lang: Language) -> Result<bool, ReportError> {
        if self.recommendation == self.previous_recommendation {
            return Ok(false);
        }
        self.text = section::splice(
            &self.text,
            lang.recommendation_header(),
            &self.recommendation,
        )?;
        self.previous_recommendation = self.recommendation.clone();
        Ok(true)
    }
}

/// Outcome of asking for a different language variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSwitch {
    /// Already showing this language
    Active,
    /// Variant existed or was served from the translation cache
    Ready,
    /// Caller has to translate and then call [`Session::install_translation`]
    NeedsTranslation(TranslationKey),
}

/// State of one interactive drafting session
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    active: Language,
    variants: HashMap<Language, ReportVariant>,
    translations: HashMap<TranslationKey, String>,
    patient: Option<PatientRecord>,
    findings: Option<SonographicFindings>,
    guideline_context: Vec<String>,
    approved_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            active: Language::English,
            variants: HashMap::new(),
            translations: HashMap::new(),
            patient: None,
            findings: None,
            guideline_context: Vec::new(),
            approved_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn active_language(&self) -> Language {
        self.active
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn patient(&self) -> Option<&PatientRecord> {
        self.patient.as_ref()
    }

    pub fn findings(&self) -> Option<&SonographicFindings> {
        self.findings.as_ref()
    }

    /// Guideline chunks the current report was drafted with
    pub fn guideline_context(&self) -> &[String] {
        &self.guideline_context
    }

    /// Languages with a report, English first
    pub fn languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|lang| self.variants.contains_key(lang))
            .collect()
    }

    pub fn variant(&self, lang: Language) -> Result<&ReportVariant, ReportError> {
        self.variants
            .get(&lang)
            .ok_or(ReportError::MissingVariant(lang))
    }

    fn variant_mut(&mut self, lang: Language) -> Result<&mut ReportVariant, ReportError> {
        self.variants
            .get_mut(&lang)
            .ok_or(ReportError::MissingVariant(lang))
    }

    /// Whether a translated variant no longer matches the English text
    pub fn is_stale(&self, lang: Language) -> bool {
        let Some(source) = self.variants.get(&lang).and_then(|v| v.source.as_deref()) else {
            return false;
        };
        match self.translation_key(lang) {
            Ok(key) => key.source != source,
            Err(_) => true,
        }
    }

    /// Replace the session's report with a freshly drafted English one.
    ///
    /// Earlier variants belong to the old report and are dropped; cached
    /// translations stay since they are keyed by source text.
    pub fn install_report(
        &mut self,
        patient: PatientRecord,
        findings: SonographicFindings,
        guideline_context: Vec<String>,
        text: String,
    ) {
        self.variants.clear();
        self.variants.insert(
            Language::English,
            ReportVariant::new(Language::English, text, None),
        );
        self.active = Language::English;
        self.patient = Some(patient);
        self.findings = Some(findings);
        self.guideline_context = guideline_context;
        self.approved_at = None;
    }

    /// Cache key for translating the current English report into `target`
    pub fn translation_key(&self, target: Language) -> Result<TranslationKey, ReportError> {
        let english = self.variant(Language::English)?;
        Ok(TranslationKey::new(&english.text, target))
    }

    pub fn cached_translation(&self, key: &TranslationKey) -> Option<&str> {
        self.translations.get(key).map(String::as_str)
    }

    /// Make `lang` the active variant, translating only when nothing usable
    /// exists yet.
    pub fn switch_language(&mut self, lang: Language) -> Result<LanguageSwitch, ReportError> {
        if lang == self.active && self.variants.contains_key(&lang) {
            return Ok(LanguageSwitch::Active);
        }
        if self.variants.contains_key(&lang) {
            self.active = lang;
            return Ok(LanguageSwitch::Ready);
        }
        if lang == Language::English {
            return Err(ReportError::MissingVariant(lang));
        }

        let key = self.translation_key(lang)?;
        if let Some(text) = self.translations.get(&key).cloned() {
            self.install_translation(key, text);
            return Ok(LanguageSwitch::Ready);
        }
        Ok(LanguageSwitch::NeedsTranslation(key))
    }

    /// Store a translation, replace the target variant with it and make it
    /// active.
    pub fn install_translation(&mut self, key: TranslationKey, text: String) {
        let target = key.target;
        self.variants.insert(
            target,
            ReportVariant::new(target, text.clone(), Some(key.source.clone())),
        );
        self.translations.insert(key, text);
        self.active = target;
    }

    /// Drop the cached translation of the current English text into
    /// `target` and return the key to translate under again.
    pub fn invalidate_translation(
        &mut self,
        target: Language,
    ) -> Result<TranslationKey, ReportError> {
        if target == Language::English {
            return Err(ReportError::Input(
                "The English report is the translation source".to_string(),
            ));
        }
        let key = self.translation_key(target)?;
        self.translations.remove(&key);
        Ok(key)
    }

    /// Replace the full text of a variant with the physician's edit.
    ///
    /// The recommendation is re-read from the new text.
    pub fn edit_report(&mut self, lang: Language, text: String) -> Result<(), ReportError> {
        let variant = self.variant_mut(lang)?;
        let source = variant.source.take();
        *variant = ReportVariant::new(lang, text, source);
        Ok(())
    }

    /// Apply the physician's recommendation to a variant.
    ///
    /// Returns whether the report text changed. When the splice fails the
    /// variant is left exactly as it was.
    pub fn edit_recommendation(
        &mut self,
        lang: Language,
        recommendation: &str,
    ) -> Result<bool, ReportError> {
        let variant = self.variant_mut(lang)?;
        let prior = std::mem::replace(&mut variant.recommendation, recommendation.to_string());
        match variant.sync(lang) {
            Ok(changed) => Ok(changed),
            Err(err) => {
                variant.recommendation = prior;
                Err(err)
            }
        }
    }

    /// Mark the report as approved. Persisting it is left to the caller.
    pub fn approve(&mut self) -> Result<DateTime<Utc>, ReportError> {
        self.variant(self.active)?;
        let now = Utc::now();
        self.approved_at = Some(now);
        Ok(now)
    }
}
