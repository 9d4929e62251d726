//! Virtual monotonic clock.

use std::time::{Duration, Instant};

/// Clock that only moves when told to.
///
/// All instants are offsets from one base captured at construction, so two
/// runs with the same advances see the same relative times.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    base: Instant,
    elapsed: Duration,
}

impl SimClock {
    /// Start a clock at zero elapsed time.
    #[must_use]
    pub fn new() -> Self {
        Self { base: Instant::now(), elapsed: Duration::ZERO }
    }

    /// Current virtual instant.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.base + self.elapsed
    }

    /// Time since the clock started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Move the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.elapsed += by;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
