//! Audio device port interface

use serde::{Deserialize, Serialize};

use crate::domain::error::DeviceError;

/// An input device the capture utility can open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Identifier passed to the capture utility, e.g. `plughw:1,0`
    pub id: String,
    /// Human-readable card name
    pub name: String,
}

/// Port for probing and enumerating audio input devices
pub trait DeviceProber: Send + Sync {
    /// Check whether `device_id` can currently be opened.
    ///
    /// # Returns
    /// `Ok(false)` when the device is reported missing, `Err` when the
    /// probe itself could not run
    fn probe(&self, device_id: &str) -> Result<bool, DeviceError>;

    /// List available capture devices
    fn list_devices(&self) -> Result<Vec<AudioDevice>, DeviceError>;
}
