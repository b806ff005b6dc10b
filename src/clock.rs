use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" for staleness comparisons (spec.md §9: `track_timeout`
/// is measured against wall-clock, never against detection timestamps).
///
/// Generalized behind a trait — rather than calling `SystemTime::now()`
/// directly inside the manager — so the deterministic GC scenario
/// (spec.md §8 Scenario E: "create track at t=0 ... submit at t=31")
/// can be exercised without sleeping the test thread for 31 real
/// seconds. Production code uses [`SystemClock`]; tests use
/// [`ManualClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall-clock time in fractional seconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock predates the unix epoch")
            .as_secs_f64()
    }
}

/// A clock whose value is set explicitly, for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new(initial: f64) -> Self {
        let clock = Self::default();
        clock.set(initial);
        clock
    }

    pub fn set(&self, now: f64) {
        self.millis.store((now * 1000.0) as u64, Ordering::Relaxed);
    }

    pub fn advance(&self, delta: f64) {
        self.set(self.now() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.millis.load(Ordering::Relaxed) as f64 / 1000.0
    }
}

/// Lets a clock be shared between a manager and the test driving it
/// (e.g. `Arc<ManualClock>`), so the test can keep advancing time after
/// handing a handle to the manager.
impl<C: Clock> Clock for Arc<C> {
    fn now(&self) -> f64 {
        self.as_ref().now()
    }
}
