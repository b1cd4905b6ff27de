//! Clock adapters

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use crate::application::ports::Clock;

/// Real time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Hand-driven clock. Time only moves on `advance` or `sleep`,
/// and `sleep` returns immediately after advancing.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    origin_wall: DateTime<Local>,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Local::now())
    }

    /// Pin the wall clock, for predictable artifact names
    pub fn starting_at(wall: DateTime<Local>) -> Self {
        Self {
            origin: Instant::now(),
            origin_wall: wall,
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock();
        *offset += by;
    }

    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn wall(&self) -> DateTime<Local> {
        self.origin_wall
            + chrono::Duration::from_std(self.elapsed()).unwrap_or_else(|_| chrono::Duration::zero())
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_when_told() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);

        clock.advance(Duration::from_secs(332));
        assert_eq!(clock.now() - t0, Duration::from_secs(332));
    }

    #[test]
    fn manual_sleep_advances() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        clock.sleep(Duration::from_millis(50));
        assert_eq!(clock.now() - t0, Duration::from_millis(50));
    }

    #[test]
    fn manual_wall_tracks_offset() {
        let clock = ManualClock::new();
        let w0 = clock.wall();
        clock.advance(Duration::from_secs(60));
        assert_eq!((clock.wall() - w0).num_seconds(), 60);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
