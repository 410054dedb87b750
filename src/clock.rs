//! An abstract monotonic clock.
//!
//! The search loop only ever needs to measure elapsed wall-clock time
//! against a budget; it must never depend on wall-clock UTC. Threading the
//! clock in as a dependency (rather than calling `Instant::now()` directly
//! from the search loop) keeps guard-rail tests deterministic.

use std::time::{Duration, Instant};

/// A source of monotonic instants.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The real, monotonic system clock.
#[derive(Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only advances when told to, for deterministic guard-rail
/// tests.
#[cfg(test)]
#[derive(Debug)]
pub struct FakeClock {
    base: Instant,
    offset: std::cell::Cell<Duration>,
}

#[cfg(test)]
impl FakeClock {
    pub fn new() -> Self {
        FakeClock {
            base: Instant::now(),
            offset: std::cell::Cell::new(Duration::from_millis(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

#[cfg(test)]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_only_advances_when_told() {
        let clock = FakeClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance(Duration::from_millis(5));
        assert!(clock.now() > t0);
    }
}
