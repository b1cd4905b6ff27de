//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Picorder - jack-aware audio recorder
#[derive(Parser, Debug)]
#[command(name = "picorder")]
#[command(version)]
#[command(about = "Audio recording coordinator with jack-triggered auto recording")]
#[command(long_about = None)]
pub struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/picorder/config.toml)
    #[arg(long, global = true, value_name = "PATH", env = "PICORDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run the recording daemon (control via: picorder daemon start/stop/status)
    #[arg(long)]
    pub daemon: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Send commands to running daemon
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
    /// List capture devices
    Devices,
    /// Browse saved recordings
    Library {
        #[command(subcommand)]
        action: Option<LibraryAction>,
    },
}

/// Daemon control actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DaemonAction {
    /// Start a manual recording
    Start {
        /// Capture device (defaults to the configured one)
        #[arg(short = 'd', long, value_name = "ID")]
        device: Option<String>,
    },
    /// Stop the current recording
    Stop,
    /// Show daemon status
    Status,
    /// Show recent recording state changes
    History,
    /// Enable or disable jack-triggered recording
    Auto {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Re-read the config file
    Reload,
    /// Stop recording and exit the daemon
    Shutdown,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Recording library actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LibraryAction {
    /// List recordings, newest first
    List,
    /// Delete one recording by file name
    Delete { name: String },
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "audio_device",
    "auto_record",
    "recording_dir",
    "capture_command",
    "jack_command",
    "jack_file",
    "min_free_mb",
    "screen_timeout",
    "timings.config_ttl",
    "timings.device_ttl",
    "timings.monitor_active_interval",
    "timings.monitor_idle_interval",
    "timings.start_grace",
    "timings.stop_grace",
    "timings.supervise_interval",
    "timings.shutdown_timeout",
    "timings.probe_timeout",
    "timings.queue_capacity",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
