//! Read-only recording status snapshot

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{Elapsed, RecordingMode, RecordingState};

/// Point-in-time view of the recorder, safe to hand to any thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingStatus {
    pub state: RecordingState,
    pub elapsed_seconds: u64,
    pub mode: Option<RecordingMode>,
    pub device_id: Option<String>,
    pub output_path: Option<PathBuf>,
    pub last_error: Option<String>,
    pub last_artifact: Option<PathBuf>,
    pub auto_record: bool,
}

impl RecordingStatus {
    pub fn idle(auto_record: bool) -> Self {
        Self {
            state: RecordingState::Idle,
            elapsed_seconds: 0,
            mode: None,
            device_id: None,
            output_path: None,
            last_error: None,
            last_artifact: None,
            auto_record,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn elapsed(&self) -> Elapsed {
        Elapsed::from_secs(self.elapsed_seconds)
    }

    /// One-line rendering: `Manual: 05:32`, `Starting…`, `Not Recording`
    pub fn summary(&self) -> String {
        match self.state {
            RecordingState::Recording => {
                let label = self.mode.map(|m| m.label()).unwrap_or("Recording");
                format!("{}: {}", label, self.elapsed().clock())
            }
            RecordingState::Starting => "Starting…".to_string(),
            RecordingState::Stopping => "Stopping…".to_string(),
            RecordingState::Idle | RecordingState::Error => "Not Recording".to_string(),
        }
    }
}

/// One entry of the recent state-change log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: RecordingState,
    pub to: RecordingState,
    pub reason: String,
    pub at: DateTime<Local>,
}
