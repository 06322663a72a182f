use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of record timestamps, in unix milliseconds
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// A clock that only moves when told to
///
/// With a non-zero `step` every reading advances the clock, which gives
/// strictly increasing timestamps without sleeping in tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    step: u64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self::ticking(start, 0)
    }

    pub fn ticking(start: u64, step: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
            step,
        }
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.fetch_add(self.step, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now(), 100);
        assert_eq!(clock.now(), 100);
        clock.advance(5);
        assert_eq!(clock.now(), 105);

        let ticking = ManualClock::ticking(10, 1);
        assert_eq!(ticking.now(), 10);
        assert_eq!(ticking.now(), 11);
    }

    #[test]
    fn test_system_clock_is_in_millis() {
        let now = SystemClock.now();
        // 2020-01-01 in milliseconds; a seconds reading would be far below
        assert!(now > 1_577_836_800_000);
        assert!(SystemClock.now() >= now);
    }
}
