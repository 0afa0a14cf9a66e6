use crate::clinical::patient::PatientRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    Pending,
    Diagnosed,
    Clear,
}

impl PatientStatus {
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Diagnosed => "Pneumonia",
            Self::Clear => "Clear",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub last_visit: NaiveDate,
    pub status: PatientStatus,
}

impl DirectoryEntry {
    pub fn to_record(&self) -> PatientRecord {
        PatientRecord::new(self.name.clone(), self.age.to_string(), self.gender.clone())
    }
}

/// Read-only patient roster shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientDirectory {
    entries: Vec<DirectoryEntry>,
}

impl PatientDirectory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Case-insensitive substring match on the patient name, in roster order.
    pub fn search(&self, query: &str) -> Vec<&DirectoryEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.name.to_lowercase().contains(&needle))
            .collect()
    }
}

impl Default for PatientDirectory {
    fn default() -> Self {
        let entry = |id: &str, name: &str, age, gender: &str, day, status| DirectoryEntry {
            id: id.into(),
            name: name.into(),
            age,
            gender: gender.into(),
            last_visit: NaiveDate::from_ymd_opt(2024, 1, day).unwrap_or_default(),
            status,
        };
        Self::new(vec![
            entry("1", "John Martinez", 45, "Male", 15, PatientStatus::Diagnosed),
            entry("2", "Sarah Johnson", 32, "Female", 14, PatientStatus::Clear),
            entry("3", "Robert Chen", 58, "Male", 13, PatientStatus::Pending),
            entry("4", "Maria Garcia", 28, "Female", 12, PatientStatus::Clear),
            entry("5", "David Wilson", 67, "Male", 11, PatientStatus::Diagnosed),
        ])
    }
}
