//! ALSA device prober backed by `arecord`

use std::time::Duration;

use tracing::debug;

use crate::application::ports::{AudioDevice, DeviceProber};
use crate::domain::error::DeviceError;
use crate::infrastructure::process::run_with_timeout;

/// Markers `arecord` prints when it cannot open a PCM
const FAILURE_MARKERS: [&str; 2] = ["Invalid", "No such"];

/// Probes and lists capture devices with the `arecord` utility
pub struct AlsaDeviceProber {
    program: String,
    timeout: Duration,
}

impl AlsaDeviceProber {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Args that open the device, dump its parameters and capture
    /// one second to /dev/null so the probe terminates on its own.
    /// A device held by a running capture fails to open with "busy";
    /// that still counts as present.
    fn probe_args(device_id: &str) -> [&str; 10] {
        [
            "-D",
            device_id,
            "--dump-hw-params",
            "-d",
            "1",
            "-f",
            "cd",
            "-t",
            "raw",
            "/dev/null",
        ]
    }

    /// Only these markers mean the device is gone. The exit status is not
    /// consulted: a busy device exits non-zero but is still there.
    fn reports_failure(output: &str) -> bool {
        FAILURE_MARKERS.iter().any(|m| output.contains(m))
            || output.to_lowercase().contains("cannot find")
    }

    /// Parse `arecord -l` output into devices, one per card
    fn parse_listing(listing: &str) -> Vec<AudioDevice> {
        let mut devices: Vec<AudioDevice> = Vec::new();
        for device in listing.lines().filter_map(parse_card_line) {
            if !devices.iter().any(|d| d.id == device.id) {
                devices.push(device);
            }
        }
        devices
    }
}

impl Default for AlsaDeviceProber {
    fn default() -> Self {
        Self::new("arecord", Duration::from_secs(2))
    }
}

/// `card 1: Device [USB Audio], device 0: ...` becomes `plughw:1,0`
fn parse_card_line(line: &str) -> Option<AudioDevice> {
    let start = line.find("card ")?;
    let rest = &line[start..];
    let number = rest.split_whitespace().nth(1)?.trim_end_matches(':');
    let card: u32 = number.parse().ok()?;

    Some(AudioDevice {
        id: format!("plughw:{},0", card),
        name: rest.trim().to_string(),
    })
}

impl DeviceProber for AlsaDeviceProber {
    fn probe(&self, device_id: &str) -> Result<bool, DeviceError> {
        if device_id.trim().is_empty() {
            return Ok(false);
        }

        let output = run_with_timeout(&self.program, &Self::probe_args(device_id), self.timeout)
            .map_err(|e| DeviceError::ProbeFailed {
                device: device_id.to_string(),
                message: e.to_string(),
            })?
            .ok_or_else(|| DeviceError::ProbeFailed {
                device: device_id.to_string(),
                message: format!("no answer within {:?}", self.timeout),
            })?;

        let text = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let valid = !Self::reports_failure(&text);
        debug!(device_id, valid, exit = ?output.status.code(), "Probed audio device");
        Ok(valid)
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>, DeviceError> {
        let output = run_with_timeout(&self.program, &["-l"], self.timeout)
            .map_err(|e| DeviceError::ListFailed(e.to_string()))?
            .ok_or_else(|| DeviceError::ListFailed("arecord -l timed out".to_string()))?;

        if !output.status.success() {
            return Err(DeviceError::ListFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(Self::parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }
}
