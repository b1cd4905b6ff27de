//! Recording state machine values

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::error::InvalidModeError;

/// Recording states
///
/// State machine:
///   IDLE -> STARTING (start command accepted by the worker)
///   STARTING -> RECORDING (capture alive past the start grace)
///   STARTING -> STOPPING (stop while starting)
///   RECORDING -> STOPPING (stop command)
///   STARTING | RECORDING -> ERROR (capture died, spawn failed)
///   STOPPING -> IDLE (capture reaped, artifact renamed)
///   ERROR -> IDLE (failure recorded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Idle,
    Starting,
    Recording,
    Stopping,
    Error,
}

impl RecordingState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }

    /// Whether a capture session exists in this state
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Recording | Self::Stopping)
    }

    /// Check whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: RecordingState) -> bool {
        use RecordingState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Idle, Error)
                | (Starting, Recording)
                | (Starting, Stopping)
                | (Starting, Error)
                | (Recording, Stopping)
                | (Recording, Error)
                | (Stopping, Idle)
                | (Stopping, Error)
                | (Error, Idle)
        )
    }

    /// Validate a transition
    pub fn check_transition(
        &self,
        next: RecordingState,
    ) -> Result<(), InvalidStateTransition> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(InvalidStateTransition {
                from: *self,
                to: next,
            })
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: {from} -> {to}")]
pub struct InvalidStateTransition {
    pub from: RecordingState,
    pub to: RecordingState,
}

/// Who triggered a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    /// Explicit user command
    Manual,
    /// Jack insertion seen by the monitor
    Auto,
}

impl RecordingMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }

    /// Label used in the status summary
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Auto => "Auto",
        }
    }
}

impl fmt::Display for RecordingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordingMode {
    type Err = InvalidModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "auto" => Ok(Self::Auto),
            _ => Err(InvalidModeError {
                input: s.to_string(),
            }),
        }
    }
}

/// Last observed state of the input jack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JackState {
    Present,
    Absent,
    #[default]
    Unknown,
}

impl JackState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Unknown => "unknown",
        }
    }

    /// True only for an observed removal-to-insertion edge
    pub fn is_insertion_from(&self, previous: JackState) -> bool {
        previous == JackState::Absent && *self == JackState::Present
    }

    /// True only for an observed insertion-to-removal edge
    pub fn is_removal_from(&self, previous: JackState) -> bool {
        previous == JackState::Present && *self == JackState::Absent
    }
}

impl fmt::Display for JackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
