//! sonoreport-core: Ultrasound report drafting domain
//!
//! This crate holds everything that does not talk to the network: the
//! section engine used to extract and splice report sections, the header
//! vocabulary of both report languages, patient and findings input, the
//! prompt templates, and per-session report state.

pub mod error;
pub mod findings;
pub mod patient;
pub mod prompt;
pub mod section;
pub mod session;
pub mod vocabulary;

pub use error::{ReportError, SpliceError};
pub use findings::{EchoPattern, Location, Margin, Shape, SonographicFindings};
pub use patient::{PatientInput, PatientRecord};
pub use prompt::ReportRequest;
pub use section::{Section, extract, outline, splice};
pub use session::{LanguageSwitch, ReportVariant, Session, TranslationKey};
pub use vocabulary::{Language, SectionKind};
