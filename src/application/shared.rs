//! Status shared between the manager and the worker

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::domain::error::RecordingError;
use crate::domain::recording::{
    Elapsed, RecordingMode, RecordingState, RecordingStatus, TransitionRecord,
};

pub const HISTORY_LIMIT: usize = 20;

/// Effect a queued command will have once the worker gets to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Intent {
    Record,
    Halt,
}

/// Everything guarded by the status lock.
///
/// Only the worker changes `state`. Producers only touch the
/// queued-intent bookkeeping, and only while pushing.
#[derive(Debug, Default)]
pub(crate) struct SharedStatus {
    pub state: RecordingState,
    pub mode: Option<RecordingMode>,
    pub device_id: Option<String>,
    pub started_at: Option<Instant>,
    pub output_path: Option<PathBuf>,
    pub last_error: Option<RecordingError>,
    pub last_artifact: Option<PathBuf>,
    queued: usize,
    queued_tail: Option<Intent>,
    history: VecDeque<TransitionRecord>,
}

impl SharedStatus {
    /// Move to `to`, logging and recording the change.
    /// Illegal transitions are logged and applied anyway so the worker can
    /// always get back to idle.
    pub fn transition(&mut self, to: RecordingState, reason: &str, at: DateTime<Local>) {
        let from = self.state;
        if let Err(e) = from.check_transition(to) {
            warn!(error = %e, reason, "Forcing state transition");
        } else {
            info!(from = %from, to = %to, reason, "Recording state changed");
        }

        self.state = to;
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            from,
            to,
            reason: reason.to_string(),
            at,
        });
    }

    /// Drop the session fields after it ends
    pub fn clear_session(&mut self) {
        self.mode = None;
        self.device_id = None;
        self.started_at = None;
        self.output_path = None;
    }

    /// State the recorder will be in once every queued command has run
    pub fn projected_recording(&self) -> bool {
        match self.queued_tail {
            Some(Intent::Record) => true,
            Some(Intent::Halt) => false,
            None => self.state.is_active(),
        }
    }

    pub fn note_enqueued(&mut self, intent: Intent) {
        self.queued += 1;
        self.queued_tail = Some(intent);
    }

    pub fn note_dequeued(&mut self) {
        self.queued = self.queued.saturating_sub(1);
        if self.queued == 0 {
            self.queued_tail = None;
        }
    }

    pub fn snapshot(&self, now: Instant, auto_record: bool) -> RecordingStatus {
        let elapsed = match (self.state, self.started_at) {
            (RecordingState::Recording | RecordingState::Stopping, Some(started)) => {
                Elapsed::from_duration(now.saturating_duration_since(started))
            }
            _ => Elapsed::ZERO,
        };

        RecordingStatus {
            state: self.state,
            elapsed_seconds: elapsed.as_secs(),
            mode: self.mode,
            device_id: self.device_id.clone(),
            output_path: self.output_path.clone(),
            last_error: self.last_error.as_ref().map(ToString::to_string),
            last_artifact: self.last_artifact.clone(),
            auto_record,
        }
    }

    pub fn history(&self) -> Vec<TransitionRecord> {
        self.history.iter().cloned().collect()
    }
}
