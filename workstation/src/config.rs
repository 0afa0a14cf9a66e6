use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use triagecore::clinical::{DetectionResult, PatientDirectory};
use triagecore::EngineConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkstationConfig {
    pub engine: EngineConfig,
    /// Result the bundled detector reports for every analysis.
    pub detection: DetectionResult,
    pub directory: PatientDirectory,
    pub report_dir: PathBuf,
    pub tick_ms: u64,
}

impl Default for WorkstationConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            detection: DetectionResult::reference(),
            directory: PatientDirectory::default(),
            report_dir: PathBuf::from("reports"),
            tick_ms: 100,
        }
    }
}

impl WorkstationConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workstation config {}", path_ref.display()))?;
        let config: WorkstationConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workstation config {}", path_ref.display()))?;
        config
            .validate()
            .with_context(|| format!("validating workstation config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Falls back to defaults when no file is given or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                warn!("config {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.engine.validate()?;
        self.detection.validate()?;
        if self.tick_ms == 0 {
            anyhow::bail!("tick_ms must be positive");
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
