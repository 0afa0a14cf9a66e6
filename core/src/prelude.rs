use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shared configuration for the annotation and dialogue layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub canvas: CanvasConfig,
    pub dialogue: DialogueConfig,
}

/// Logical size of the overlay canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
        }
    }
}

/// Pacing of scripted assistant messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub follow_up_delay_ms: u64,
    pub reply_delay_min_ms: u64,
    pub reply_delay_max_ms: u64,
    /// Fixes the reply jitter so sessions replay identically.
    pub seed: Option<u64>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            follow_up_delay_ms: 2000,
            reply_delay_min_ms: 1500,
            reply_delay_max_ms: 2500,
            seed: None,
        }
    }
}

impl DialogueConfig {
    pub fn follow_up_delay(&self) -> Duration {
        Duration::from_millis(self.follow_up_delay_ms)
    }

    pub fn reply_window(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.reply_delay_min_ms),
            Duration::from_millis(self.reply_delay_max_ms),
        )
    }
}

impl EngineConfig {
    pub fn validate(&self) -> TriageResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(TriageError::InvalidConfig(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        if self.dialogue.reply_delay_min_ms > self.dialogue.reply_delay_max_ms {
            return Err(TriageError::InvalidConfig(format!(
                "reply delay window is inverted ({}ms > {}ms)",
                self.dialogue.reply_delay_min_ms, self.dialogue.reply_delay_max_ms
            )));
        }
        Ok(())
    }
}

/// Common error type for the fallible edges of the core.
#[derive(thiserror::Error, Debug)]
pub enum TriageError {
    #[error("image decode failed: {0}")]
    ImageDecode(String),
    #[error("report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type TriageResult<T> = Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_pacing() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.canvas.width, 400);
        assert_eq!(cfg.dialogue.follow_up_delay(), Duration::from_millis(2000));
        assert_eq!(
            cfg.dialogue.reply_window(),
            (Duration::from_millis(1500), Duration::from_millis(2500))
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.dialogue.reply_delay_min_ms = 3000;
        assert!(matches!(cfg.validate(), Err(TriageError::InvalidConfig(_))));
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.canvas.height = 0;
        assert!(cfg.validate().is_err());
    }
}
