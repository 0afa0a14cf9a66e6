use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Counters accumulated across every analysis of a workstation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub analyses_opened: usize,
    pub operator_turns: usize,
    pub assistant_replies: usize,
    pub follow_ups: usize,
    pub cancelled: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut Metrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_analysis(&self) {
        self.update(|m| m.analyses_opened += 1);
    }

    pub fn record_operator_turn(&self) {
        self.update(|m| m.operator_turns += 1);
    }

    pub fn record_reply(&self) {
        self.update(|m| m.assistant_replies += 1);
    }

    pub fn record_follow_up(&self) {
        self.update(|m| m.follow_ups += 1);
    }

    pub fn record_cancelled(&self, count: usize) {
        self.update(|m| m.cancelled += count);
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
