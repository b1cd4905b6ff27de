//! Domain error types

use thiserror::Error;

/// Error when parsing an elapsed-time string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid elapsed time: \"{input}\". Expected format: <mm>m<ss>s or <hh>h<mm>m<ss>s (e.g., 05m32s, 01h02m03s)")]
pub struct ElapsedParseError {
    pub input: String,
}

/// Error when parsing a recording mode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid recording mode: \"{input}\". Valid modes are: manual, auto")]
pub struct InvalidModeError {
    pub input: String,
}

/// Audio device errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("No audio device selected")]
    NotConfigured,

    #[error("Audio device '{0}' is not available")]
    Invalid(String),

    #[error("Failed to probe audio device '{device}': {message}")]
    ProbeFailed { device: String, message: String },

    #[error("Failed to list audio devices: {0}")]
    ListFailed(String),
}

/// Capture process errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error("Capture utility '{0}' not found")]
    NotFound(String),

    #[error("Failed to start capture: {0}")]
    SpawnFailed(String),

    #[error("Capture exited before it was ready ({0})")]
    ExitedEarly(String),

    #[error("Capture exited unexpectedly ({0})")]
    Crashed(String),

    #[error("Failed to signal capture process: {0}")]
    SignalFailed(String),

    #[error("Failed to reap capture process: {0}")]
    WaitFailed(String),
}

/// Command queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Command queue is full")]
    Full,

    #[error("Command queue is closed")]
    Closed,
}

/// Recording storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Insufficient disk space: {free_mb} MB free, {required_mb} MB required")]
    InsufficientSpace { free_mb: u64, required_mb: u64 },

    #[error("Failed to prepare recording directory '{path}': {message}")]
    Directory { path: String, message: String },

    #[error("Failed to query free space: {0}")]
    QueryFailed(String),
}

/// Jack-presence detector errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JackError {
    #[error("Jack detector command failed: {0}")]
    CommandFailed(String),

    #[error("Failed to read jack state: {0}")]
    ReadFailed(String),

    #[error("Unrecognized jack state: \"{0}\"")]
    Unrecognized(String),
}

/// Recording library errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("Failed to read recording directory: {0}")]
    ReadFailed(String),

    #[error("Recording not found: {0}")]
    NotFound(String),

    #[error("Invalid recording name: \"{0}\"")]
    InvalidName(String),

    #[error("Recording still in progress: {0}")]
    InProgress(String),

    #[error("Failed to delete recording: {0}")]
    DeleteFailed(String),
}

/// Error when configuration fails
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    Missing(String),

    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Failure reason recorded against a recording attempt.
/// This is what ends up in the status snapshot's `last_error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_error_is_transparent() {
        let err = RecordingError::from(DeviceError::Invalid("plughw:1,0".to_string()));
        assert_eq!(err.to_string(), "Audio device 'plughw:1,0' is not available");
    }

    #[test]
    fn storage_error_mentions_sizes() {
        let err = StorageError::InsufficientSpace {
            free_mb: 42,
            required_mb: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("42 MB free"));
        assert!(msg.contains("100 MB required"));
    }
}
