use crate::prelude::DialogueConfig;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;

/// Supplies the simulated "thinking" delay for each assistant reply.
pub trait Pacer: Send {
    fn next_delay(&mut self) -> Duration;
}

/// Uniform draw from a closed millisecond window.
pub struct UniformPacer {
    min_ms: u64,
    max_ms: u64,
    rng: StdRng,
}

impl UniformPacer {
    pub fn new(min: Duration, max: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let min_ms = min.as_millis() as u64;
        let max_ms = (max.as_millis() as u64).max(min_ms);
        Self { min_ms, max_ms, rng }
    }

    pub fn from_config(config: &DialogueConfig) -> Self {
        let (min, max) = config.reply_window();
        Self::new(min, max, config.seed)
    }
}

impl Pacer for UniformPacer {
    fn next_delay(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.min_ms..=self.max_ms))
    }
}

/// Replays a fixed list of delays, then repeats the fallback.
pub struct ScriptedPacer {
    delays: VecDeque<Duration>,
    fallback: Duration,
}

impl ScriptedPacer {
    pub fn new(delays: impl IntoIterator<Item = Duration>, fallback: Duration) -> Self {
        Self {
            delays: delays.into_iter().collect(),
            fallback,
        }
    }
}

impl Pacer for ScriptedPacer {
    fn next_delay(&mut self) -> Duration {
        self.delays.pop_front().unwrap_or(self.fallback)
    }
}
