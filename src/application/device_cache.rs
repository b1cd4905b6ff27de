//! TTL-guarded cache of device validity probes

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::application::ports::{AudioDevice, Clock, DeviceProber};
use crate::domain::error::DeviceError;

#[derive(Debug, Clone, Copy)]
struct ValidationEntry {
    valid: bool,
    checked_at: Instant,
}

/// Caches one probe result per device id for `ttl`.
///
/// Probes run outside the entry lock so that `peek` stays non-blocking
/// while a slow probe is in flight.
pub struct DeviceValidationCache {
    prober: Arc<dyn DeviceProber>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<String, ValidationEntry>>,
    probe_lock: Mutex<()>,
}

impl DeviceValidationCache {
    pub fn new(prober: Arc<dyn DeviceProber>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            prober,
            clock,
            ttl,
            entries: Mutex::new(HashMap::new()),
            probe_lock: Mutex::new(()),
        }
    }

    /// Whether `device_id` is usable, probing only if the cached answer is stale.
    /// An empty id is never valid and never probed.
    pub fn is_valid(&self, device_id: &str) -> bool {
        if device_id.is_empty() {
            return false;
        }
        if let Some(valid) = self.peek(device_id) {
            return valid;
        }

        let _probe = self.probe_lock.lock();
        // Re-check: the previous holder may have just probed this id
        if let Some(valid) = self.peek(device_id) {
            return valid;
        }
        self.probe_and_store(device_id)
    }

    /// Fresh cached answer, without ever probing
    pub fn peek(&self, device_id: &str) -> Option<bool> {
        let now = self.clock.now();
        self.entries.lock()
            .get(device_id)
            .filter(|entry| now.saturating_duration_since(entry.checked_at) < self.ttl)
            .map(|entry| entry.valid)
    }

    pub fn invalidate(&self, device_id: &str) {
        self.entries.lock().remove(device_id);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Enumerate devices. Always goes to the prober.
    pub fn list_devices(&self) -> Result<Vec<AudioDevice>, DeviceError> {
        self.prober.list_devices()
    }

    fn probe_and_store(&self, device_id: &str) -> bool {
        let valid = match self.prober.probe(device_id) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(device_id, error = %e, "Device probe failed, treating as invalid");
                false
            }
        };
        debug!(device_id, valid, "Device probed");

        self.entries.lock().insert(
            device_id.to_string(),
            ValidationEntry {
                valid,
                checked_at: self.clock.now(),
            },
        );
        valid
    }
}
