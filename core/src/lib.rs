//! Core of the chest X-ray triage workstation.
//!
//! The modules cover the operator workflow (login, patient and image intake,
//! analysis), the annotated overlay and downloadable report, and the scripted
//! follow-up dialogue that accompanies every diagnosis.

pub mod annotation;
pub mod clinical;
pub mod dialogue;
pub mod prelude;
pub mod session;
pub mod telemetry;

pub use prelude::{EngineConfig, TriageError, TriageResult};
pub use session::{SessionController, SessionState};
