//! CLI presenter for output formatting

use colored::*;

use crate::application::ports::AudioDevice;
use crate::application::RecordingEntry;
use crate::domain::recording::{RecordingState, RecordingStatus, TransitionRecord};

/// Presenter for CLI output formatting
#[derive(Debug, Default)]
pub struct Presenter;

impl Presenter {
    pub fn new() -> Self {
        Self
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output data to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print a daemon status snapshot
    pub fn daemon_status(&self, status: &RecordingStatus) {
        let headline = status.summary();
        let headline = match status.state {
            RecordingState::Recording => headline.red().bold(),
            RecordingState::Starting | RecordingState::Stopping => headline.yellow(),
            RecordingState::Error => headline.red(),
            RecordingState::Idle => headline.normal(),
        };
        eprintln!("{} {}", "●".cyan(), headline);

        self.key_value("state", status.state.as_str());
        self.key_value(
            "auto_record",
            if status.auto_record { "on" } else { "off" },
        );
        if let Some(device) = &status.device_id {
            self.key_value("device", device);
        }
        if let Some(path) = &status.output_path {
            self.key_value("output", &path.display().to_string());
        }
        if let Some(path) = &status.last_artifact {
            self.key_value("last_recording", &path.display().to_string());
        }
        if let Some(err) = &status.last_error {
            self.key_value("last_error", err);
        }
    }

    /// Oldest first, one transition per line
    pub fn history(&self, records: &[TransitionRecord]) {
        if records.is_empty() {
            self.info("No state changes yet");
            return;
        }
        for record in records {
            println!(
                "{}  {} -> {}  {}",
                record.at.format("%Y-%m-%d %H:%M:%S"),
                record.from.as_str(),
                record.to.as_str().cyan(),
                record.reason
            );
        }
    }

    pub fn devices(&self, devices: &[AudioDevice], configured: &str) {
        if devices.is_empty() {
            self.warn("No capture devices found");
            return;
        }
        for device in devices {
            let marker = if device.id == configured {
                "*".green().to_string()
            } else {
                " ".to_string()
            };
            println!("{} {:<12} {}", marker, device.id.cyan(), device.name);
        }
    }

    pub fn recordings(&self, entries: &[RecordingEntry]) {
        if entries.is_empty() {
            self.info("No recordings yet");
            return;
        }
        for entry in entries {
            let flag = if entry.complete {
                String::new()
            } else {
                format!(" {}", "(incomplete)".yellow())
            };
            println!(
                "{:>10}  {:>9}  {}{}",
                entry.duration_label(),
                format_size(entry.size_bytes),
                entry.name,
                flag
            );
        }
    }
}

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.1} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}
