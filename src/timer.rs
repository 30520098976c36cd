use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source for the round timer
pub trait Clock: Debug + Send {
    /// Time elapsed since some fixed origin.
    fn now(&self) -> Duration;
}

/// Production clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for tests. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saturates at `u64::MAX` milliseconds.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |ms| {
                Some(ms.saturating_add(by))
            });
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Elapsed-seconds source for a round. Display only until `stop`, whose
/// reading is what scoring uses.
#[derive(Debug)]
pub struct Timer {
    clock: Box<dyn Clock>,
    started_at: Option<Duration>,
    frozen_secs: Option<u64>,
}

impl Timer {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            started_at: None,
            frozen_secs: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(self.clock.now());
        self.frozen_secs = None;
    }

    /// Whole seconds since `start`, or the frozen value after `stop`.
    pub fn elapsed_seconds(&self) -> u64 {
        if let Some(secs) = self.frozen_secs {
            return secs;
        }
        match self.started_at {
            Some(start) => self.clock.now().saturating_sub(start).as_secs(),
            None => 0,
        }
    }

    /// Freeze the reading and return it. Stopping twice keeps the first value.
    pub fn stop(&mut self) -> u64 {
        let secs = self.elapsed_seconds();
        self.frozen_secs = Some(secs);
        secs
    }
}
