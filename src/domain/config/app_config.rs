//! Application configuration value objects

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::timings::{Timings, TimingsConfig};

pub const DEFAULT_AUDIO_DEVICE: &str = "plughw:0,0";
pub const DEFAULT_CAPTURE_COMMAND: &str = "arecord";
pub const DEFAULT_MIN_FREE_MB: u64 = 100;
pub const DEFAULT_SCREEN_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RECORDING_SUBDIR: &str = "recordings";

/// Configuration as persisted on disk.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Empty string means no device selected
    pub audio_device: Option<String>,
    pub auto_record: Option<bool>,
    pub recording_dir: Option<String>,
    pub capture_command: Option<String>,
    pub jack_command: Option<String>,
    pub jack_file: Option<String>,
    pub min_free_mb: Option<u64>,
    /// UI-only, carried through untouched
    pub screen_timeout: Option<u64>,
    pub timings: Option<TimingsConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            audio_device: Some(DEFAULT_AUDIO_DEVICE.to_string()),
            auto_record: Some(true),
            recording_dir: Some(default_recording_dir().to_string_lossy().to_string()),
            capture_command: Some(DEFAULT_CAPTURE_COMMAND.to_string()),
            jack_command: None,
            jack_file: None,
            min_free_mb: Some(DEFAULT_MIN_FREE_MB),
            screen_timeout: Some(DEFAULT_SCREEN_TIMEOUT_SECS),
            timings: Some(TimingsConfig::defaults()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            audio_device: other.audio_device.or(self.audio_device),
            auto_record: other.auto_record.or(self.auto_record),
            recording_dir: other.recording_dir.or(self.recording_dir),
            capture_command: other.capture_command.or(self.capture_command),
            jack_command: other.jack_command.or(self.jack_command),
            jack_file: other.jack_file.or(self.jack_file),
            min_free_mb: other.min_free_mb.or(self.min_free_mb),
            screen_timeout: other.screen_timeout.or(self.screen_timeout),
            timings: match (self.timings, other.timings) {
                (Some(b), Some(o)) => Some(b.merge(o)),
                (b, o) => o.or(b),
            },
        }
    }

    /// Resolve into the snapshot served to the coordinator
    pub fn snapshot(&self) -> ConfigSnapshot {
        let jack_source = match (&self.jack_command, &self.jack_file) {
            (Some(cmd), _) if !cmd.trim().is_empty() => JackSource::Command(cmd.clone()),
            (_, Some(file)) if !file.trim().is_empty() => JackSource::File(PathBuf::from(file)),
            _ => JackSource::Disabled,
        };

        ConfigSnapshot {
            audio_device: self
                .audio_device
                .as_deref()
                .map(str::trim)
                .unwrap_or(DEFAULT_AUDIO_DEVICE)
                .to_string(),
            auto_record: self.auto_record.unwrap_or(true),
            recording_dir: self
                .recording_dir
                .as_deref()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_recording_dir),
            capture_command: self
                .capture_command
                .clone()
                .filter(|cmd| !cmd.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CAPTURE_COMMAND.to_string()),
            jack_source,
            min_free_mb: self.min_free_mb.unwrap_or(DEFAULT_MIN_FREE_MB),
            screen_timeout: self.screen_timeout.unwrap_or(DEFAULT_SCREEN_TIMEOUT_SECS),
            timings: self.timings.clone().unwrap_or_default().resolve(),
        }
    }
}

/// Where the monitor reads jack presence from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JackSource {
    /// Shell command; exit 0 means present, 1 absent
    Command(String),
    /// File holding `1`/`0` (sysfs-style)
    File(PathBuf),
    Disabled,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub audio_device: String,
    pub auto_record: bool,
    pub recording_dir: PathBuf,
    pub capture_command: String,
    pub jack_source: JackSource,
    pub min_free_mb: u64,
    pub screen_timeout: u64,
    pub timings: Timings,
}

impl ConfigSnapshot {
    pub fn has_device(&self) -> bool {
        !self.audio_device.is_empty()
    }

    pub fn min_free_bytes(&self) -> u64 {
        self.min_free_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        AppConfig::defaults().snapshot()
    }
}

/// `$HOME/recordings`, or `./recordings` without a home directory
pub fn default_recording_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_RECORDING_SUBDIR))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RECORDING_SUBDIR))
}
