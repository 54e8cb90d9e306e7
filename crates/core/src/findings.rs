//! Sonographic findings entered from the segmentation step

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ReportError;

/// Accepted lesion size range in millimetres
pub const SIZE_RANGE_MM: std::ops::RangeInclusive<u32> = 1..=100;

/// BI-RADS mass shape
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Shape {
    Oval,
    Round,
    Irregular,
}

/// BI-RADS mass margin
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Margin {
    Circumscribed,
    Indistinct,
    Spiculated,
}

/// BI-RADS echo pattern
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EchoPattern {
    Hypoechoic,
    Isoechoic,
    Anechoic,
    Complex,
}

/// Lesion position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Location {
    #[serde(rename = "12 o'clock")]
    TwelveOClock,
    #[serde(rename = "3 o'clock")]
    ThreeOClock,
    #[serde(rename = "6 o'clock")]
    SixOClock,
    #[serde(rename = "9 o'clock")]
    NineOClock,
    #[serde(rename = "Upper Outer Quadrant")]
    UpperOuterQuadrant,
    #[serde(rename = "Retroareolar")]
    Retroareolar,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Margin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for EchoPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Location::TwelveOClock => "12 o'clock",
            Location::ThreeOClock => "3 o'clock",
            Location::SixOClock => "6 o'clock",
            Location::NineOClock => "9 o'clock",
            Location::UpperOuterQuadrant => "Upper Outer Quadrant",
            Location::Retroareolar => "Retroareolar",
        };
        f.write_str(label)
    }
}

/// Measurements and descriptors of a single mass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SonographicFindings {
    pub location: Location,
    pub size_mm: u32,
    pub shape: Shape,
    pub margin: Margin,
    pub echo_pattern: EchoPattern,
}

impl SonographicFindings {
    pub fn validate(&self) -> Result<(), ReportError> {
        if !SIZE_RANGE_MM.contains(&self.size_mm) {
            return Err(ReportError::Input(format!(
                "Size must be between {} and {} mm, got {}",
                SIZE_RANGE_MM.start(),
                SIZE_RANGE_MM.end(),
                self.size_mm
            )));
        }
        Ok(())
    }

    /// Query text sent to the guideline store
    pub fn guideline_query(&self) -> String {
        format!(
            "Mass shape is {}, margin is {}, echo pattern is {}.",
            self.shape, self.margin, self.echo_pattern
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn findings(size_mm: u32) -> SonographicFindings {
        SonographicFindings {
            location: Location::UpperOuterQuadrant,
            size_mm,
            shape: Shape::Irregular,
            margin: Margin::Spiculated,
            echo_pattern: EchoPattern::Hypoechoic,
        }
    }

    #[test]
    fn size_bounds() {
        assert!(findings(1).validate().is_ok());
        assert!(findings(100).validate().is_ok());
        assert!(matches!(findings(0).validate(), Err(ReportError::Input(_))));
        assert!(findings(101).validate().is_err());
    }

    #[test]
    fn query_names_descriptors() {
        assert_eq!(
            findings(15).guideline_query(),
            "Mass shape is Irregular, margin is Spiculated, echo pattern is Hypoechoic."
        );
    }

    #[test]
    fn location_uses_display_labels() {
        let parsed: SonographicFindings = serde_json::from_str(
            r#"{"location": "12 o'clock", "size_mm": 15, "shape": "Oval",
                "margin": "Circumscribed", "echo_pattern": "Anechoic"}"#,
        )
        .unwrap();
        assert_eq!(parsed.location, Location::TwelveOClock);
        assert_eq!(parsed.location.to_string(), "12 o'clock");
    }
}
