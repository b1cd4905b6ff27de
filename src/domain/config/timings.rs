//! Interval, TTL and grace-period settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_TTL_MS: u64 = 500;
pub const DEFAULT_DEVICE_TTL_MS: u64 = 5_000;
pub const DEFAULT_MONITOR_ACTIVE_MS: u64 = 300;
pub const DEFAULT_MONITOR_IDLE_MS: u64 = 2_000;
pub const DEFAULT_START_GRACE_MS: u64 = 500;
pub const DEFAULT_STOP_GRACE_MS: u64 = 3_000;
pub const DEFAULT_SUPERVISE_MS: u64 = 100;
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// `[timings]` table as written in the config file, in milliseconds
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingsConfig {
    pub config_ttl: Option<u64>,
    pub device_ttl: Option<u64>,
    pub monitor_active_interval: Option<u64>,
    pub monitor_idle_interval: Option<u64>,
    pub start_grace: Option<u64>,
    pub stop_grace: Option<u64>,
    pub supervise_interval: Option<u64>,
    pub shutdown_timeout: Option<u64>,
    pub probe_timeout: Option<u64>,
    pub queue_capacity: Option<usize>,
}

impl TimingsConfig {
    pub fn defaults() -> Self {
        Self {
            config_ttl: Some(DEFAULT_CONFIG_TTL_MS),
            device_ttl: Some(DEFAULT_DEVICE_TTL_MS),
            monitor_active_interval: Some(DEFAULT_MONITOR_ACTIVE_MS),
            monitor_idle_interval: Some(DEFAULT_MONITOR_IDLE_MS),
            start_grace: Some(DEFAULT_START_GRACE_MS),
            stop_grace: Some(DEFAULT_STOP_GRACE_MS),
            supervise_interval: Some(DEFAULT_SUPERVISE_MS),
            shutdown_timeout: Some(DEFAULT_SHUTDOWN_TIMEOUT_MS),
            probe_timeout: Some(DEFAULT_PROBE_TIMEOUT_MS),
            queue_capacity: Some(DEFAULT_QUEUE_CAPACITY),
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            config_ttl: other.config_ttl.or(self.config_ttl),
            device_ttl: other.device_ttl.or(self.device_ttl),
            monitor_active_interval: other
                .monitor_active_interval
                .or(self.monitor_active_interval),
            monitor_idle_interval: other.monitor_idle_interval.or(self.monitor_idle_interval),
            start_grace: other.start_grace.or(self.start_grace),
            stop_grace: other.stop_grace.or(self.stop_grace),
            supervise_interval: other.supervise_interval.or(self.supervise_interval),
            shutdown_timeout: other.shutdown_timeout.or(self.shutdown_timeout),
            probe_timeout: other.probe_timeout.or(self.probe_timeout),
            queue_capacity: other.queue_capacity.or(self.queue_capacity),
        }
    }

    /// Resolve into concrete durations, falling back per field
    pub fn resolve(&self) -> Timings {
        let ms = |value: Option<u64>, default: u64| Duration::from_millis(value.unwrap_or(default));
        Timings {
            config_ttl: ms(self.config_ttl, DEFAULT_CONFIG_TTL_MS),
            device_ttl: ms(self.device_ttl, DEFAULT_DEVICE_TTL_MS),
            monitor_active_interval: ms(self.monitor_active_interval, DEFAULT_MONITOR_ACTIVE_MS),
            monitor_idle_interval: ms(self.monitor_idle_interval, DEFAULT_MONITOR_IDLE_MS),
            start_grace: ms(self.start_grace, DEFAULT_START_GRACE_MS),
            stop_grace: ms(self.stop_grace, DEFAULT_STOP_GRACE_MS),
            // a zero poll interval would spin the worker
            supervise_interval: ms(self.supervise_interval, DEFAULT_SUPERVISE_MS)
                .max(Duration::from_millis(1)),
            shutdown_timeout: ms(self.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT_MS),
            probe_timeout: ms(self.probe_timeout, DEFAULT_PROBE_TIMEOUT_MS),
            queue_capacity: self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY).max(1),
        }
    }
}

/// Resolved timing values used by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub config_ttl: Duration,
    pub device_ttl: Duration,
    pub monitor_active_interval: Duration,
    pub monitor_idle_interval: Duration,
    pub start_grace: Duration,
    pub stop_grace: Duration,
    pub supervise_interval: Duration,
    pub shutdown_timeout: Duration,
    pub probe_timeout: Duration,
    pub queue_capacity: usize,
}

impl Default for Timings {
    fn default() -> Self {
        TimingsConfig::defaults().resolve()
    }
}
