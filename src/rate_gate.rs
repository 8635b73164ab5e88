//! Minimum-interval gate for outbound provider requests.
//!
//! One gate is shared by every oracle and assembler that talks to the same
//! provider, so at most one request starts per interval process-wide.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::traits::Clock;

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct RateGate {
    min_interval: Duration,
    clock: Arc<dyn Clock>,
    last_request: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("min_interval", &self.min_interval)
            .finish_non_exhaustive()
    }
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self::with_clock(min_interval, Arc::new(SystemClock))
    }

    pub fn with_clock(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            min_interval,
            clock,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Blocks until `min_interval` has passed since the previous acquire,
    /// then records the current time.
    ///
    /// The lock is held while sleeping, which serializes concurrent callers.
    pub fn acquire(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = *last {
            let elapsed = self.clock.now().saturating_duration_since(previous);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "rate gate waiting");
                self.clock.sleep(wait);
            }
        }

        *last = Some(self.clock.now());
    }
}
