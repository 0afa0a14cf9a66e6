use crate::clinical::{DetectionResult, PatientRecord};
use crate::prelude::TriageResult;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const REPORT_PREFIX: &str = "pneumonia-analysis-";

/// Downloadable analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub patient: PatientRecord,
    pub analysis: DetectionResult,
    pub timestamp: String,
}

pub fn generate_report(
    patient: &PatientRecord,
    detection: &DetectionResult,
    timestamp: DateTime<Utc>,
) -> AnalysisReport {
    AnalysisReport {
        patient: patient.clone(),
        analysis: detection.clone(),
        timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// `pneumonia-analysis-<name>.json` with every whitespace run turned into one dash.
pub fn report_file_name(patient_name: &str) -> String {
    let mut slug = String::with_capacity(patient_name.len());
    let mut in_gap = false;
    for ch in patient_name.chars() {
        if ch.is_whitespace() {
            if !in_gap {
                slug.push('-');
            }
            in_gap = true;
        } else {
            slug.push(ch);
            in_gap = false;
        }
    }
    format!("{}{}.json", REPORT_PREFIX, slug)
}

impl AnalysisReport {
    pub fn file_name(&self) -> String {
        report_file_name(&self.patient.name)
    }

    pub fn to_bytes(&self) -> TriageResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> TriageResult<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_bytes()?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report() -> AnalysisReport {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        generate_report(
            &PatientRecord::new("John Q Smith", "45", "male"),
            &DetectionResult::reference(),
            at,
        )
    }

    #[test]
    fn file_name_collapses_whitespace() {
        assert_eq!(report().file_name(), "pneumonia-analysis-John-Q-Smith.json");
        assert_eq!(
            report_file_name("Ana \t  Maria"),
            "pneumonia-analysis-Ana-Maria.json"
        );
    }

    #[test]
    fn timestamp_is_iso_8601_utc() {
        assert_eq!(report().timestamp, "2024-01-15T09:30:00.000Z");
    }

    #[test]
    fn bytes_hold_pretty_json_with_all_sections() {
        let bytes = report().to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n  \"patient\": {"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["patient"]["name"], "John Q Smith");
        assert_eq!(value["analysis"]["hasCondition"], true);
        assert_eq!(value["analysis"]["recommendations"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn write_to_dir_persists_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = report().write_to_dir(dir.path()).unwrap();
        assert!(path.ends_with("pneumonia-analysis-John-Q-Smith.json"));
        let restored: AnalysisReport =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(restored, report());
    }
}
