//! Clock abstraction for deterministic time control.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for started-at stamps and timed-capture completion.
///
/// Production binds to the wall clock; tests inject a [`FakeClock`] that
/// only moves when told to.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug)]
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_clock_only_moves_on_demand() {
        let clock = FakeClock::default();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::milliseconds(500));
        assert_eq!(clock.now(), start + Duration::milliseconds(500));

        let later = start + Duration::seconds(10);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
