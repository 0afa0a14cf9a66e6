pub mod detection;
pub mod directory;
pub mod patient;

pub use detection::{DetectionResult, Detector, FixedDetector, Rect, Severity, REFERENCE_FRAME};
pub use directory::{DirectoryEntry, PatientDirectory, PatientStatus};
pub use patient::{Identity, ImageUpload, PatientRecord};
