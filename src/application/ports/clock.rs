//! Clock port interface

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// Port for reading time.
///
/// Monotonic time drives TTLs, elapsed time and grace periods; wall time
/// only stamps artifact names and history entries.
pub trait Clock: Send + Sync {
    /// Monotonic now
    fn now(&self) -> Instant;

    /// Local wall-clock now
    fn wall(&self) -> DateTime<Local>;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}
