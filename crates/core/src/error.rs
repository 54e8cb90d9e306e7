use crate::vocabulary::Language;
use thiserror::Error;

/// Report drafting error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Guideline retrieval failed: {0}")]
    Retrieval(String),

    #[error("Language model gateway error: {0}")]
    Gateway(String),

    #[error("Section splice failed: {0}")]
    SpliceConsistency(String),

    #[error("No {0} report in this session")]
    MissingVariant(Language),
}

/// Failure to interpret a section header name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpliceError {
    #[error("Header name is empty")]
    EmptyHeader,

    #[error("Header name '{0}' must contain only letters and spaces")]
    InvalidHeader(String),
}

impl From<SpliceError> for ReportError {
    fn from(err: SpliceError) -> Self {
        ReportError::SpliceConsistency(err.to_string())
    }
}
