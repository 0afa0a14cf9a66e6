use crate::clinical::patient::{ImageUpload, PatientRecord};
use crate::prelude::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned region in source-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }

    fn is_well_formed(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mild => write!(f, "mild"),
            Self::Moderate => write!(f, "moderate"),
            Self::Severe => write!(f, "severe"),
        }
    }
}

/// Structured diagnosis consumed by the renderer, the report and the dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub has_condition: bool,
    pub confidence: f32,
    pub affected_regions: Vec<Rect>,
    pub severity: Severity,
    pub recommendations: Vec<String>,
}

impl DetectionResult {
    /// The positive scenario the workstation ships with. Regions are laid out
    /// on the [`REFERENCE_FRAME`].
    pub fn reference() -> Self {
        Self {
            has_condition: true,
            confidence: 0.87,
            affected_regions: vec![
                Rect::new(120.0, 80.0, 60.0, 80.0),
                Rect::new(200.0, 120.0, 40.0, 50.0),
            ],
            severity: Severity::Moderate,
            recommendations: vec![
                "Immediate antibiotic treatment recommended".into(),
                "Follow-up chest X-ray in 7-10 days".into(),
                "Monitor oxygen saturation levels".into(),
                "Complete blood count and blood cultures advised".into(),
            ],
        }
    }

    pub fn clear(confidence: f32) -> Self {
        Self {
            has_condition: false,
            confidence,
            affected_regions: Vec::new(),
            severity: Severity::Mild,
            recommendations: vec!["No acute findings; routine follow-up as clinically indicated".into()],
        }
    }

    pub fn headline(&self) -> &'static str {
        if self.has_condition {
            "Pneumonia Detected"
        } else {
            "No Pneumonia Detected"
        }
    }

    pub fn confidence_label(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }

    /// Checks a result that arrived from outside the process (configuration files).
    pub fn validate(&self) -> TriageResult<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(TriageError::InvalidConfig(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if let Some(idx) = self
            .affected_regions
            .iter()
            .position(|rect| !rect.is_well_formed())
        {
            return Err(TriageError::InvalidConfig(format!(
                "affected region #{} has negative or non-finite extents",
                idx + 1
            )));
        }
        Ok(())
    }
}

/// Source of diagnoses. Real inference lives outside this crate.
pub trait Detector: Send {
    fn analyze(&self, patient: &PatientRecord, image: &ImageUpload) -> DetectionResult;
}

/// Frame the regions of a [`FixedDetector`] result are authored on.
pub const REFERENCE_FRAME: (u32, u32) = (400, 400);

/// Detector that always answers with a preconfigured result.
///
/// Stored regions are in [`REFERENCE_FRAME`] coordinates and are rescaled to
/// the upload's pixel size on every call. Uploads whose header cannot be read
/// get the regions unchanged.
#[derive(Debug, Clone)]
pub struct FixedDetector {
    result: DetectionResult,
}

impl FixedDetector {
    pub fn new(result: DetectionResult) -> Self {
        Self { result }
    }
}

impl Default for FixedDetector {
    fn default() -> Self {
        Self::new(DetectionResult::reference())
    }
}

impl Detector for FixedDetector {
    fn analyze(&self, _patient: &PatientRecord, image: &ImageUpload) -> DetectionResult {
        let mut result = self.result.clone();
        if let Some((width, height)) = image.dimensions() {
            let sx = width as f32 / REFERENCE_FRAME.0 as f32;
            let sy = height as f32 / REFERENCE_FRAME.1 as f32;
            for region in &mut result.affected_regions {
                *region = region.scaled(sx, sy);
            }
        }
        result
    }
}
