//! Recording artifact file names
//!
//! A capture writes to `recording_<YYYYMMDD>_<HHMMSS>.wav` while it runs.
//! Once the session ends the file is renamed to carry its length:
//! `recording_20240101_120000_05m32s.wav`. A session that ended because the
//! capture died gets an `_incomplete` suffix after the length.

use std::fmt;

use chrono::NaiveDateTime;

use super::Elapsed;

pub const FILE_PREFIX: &str = "recording_";
pub const FILE_EXTENSION: &str = "wav";
const INCOMPLETE_SUFFIX: &str = "_incomplete";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_LEN: usize = 15;

/// How far a recording got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// Capture still writing, no length yet
    InProgress,
    /// Stopped on request
    Complete(Elapsed),
    /// Capture exited on its own
    Incomplete(Elapsed),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactName {
    pub started: NaiveDateTime,
    pub status: ArtifactStatus,
}

impl ArtifactName {
    pub fn in_progress(started: NaiveDateTime) -> Self {
        Self {
            started,
            status: ArtifactStatus::InProgress,
        }
    }

    pub fn complete(started: NaiveDateTime, elapsed: Elapsed) -> Self {
        Self {
            started,
            status: ArtifactStatus::Complete(elapsed),
        }
    }

    pub fn incomplete(started: NaiveDateTime, elapsed: Elapsed) -> Self {
        Self {
            started,
            status: ArtifactStatus::Incomplete(elapsed),
        }
    }

    /// Recorded length, if the session has ended
    pub fn elapsed(&self) -> Option<Elapsed> {
        match self.status {
            ArtifactStatus::InProgress => None,
            ArtifactStatus::Complete(e) | ArtifactStatus::Incomplete(e) => Some(e),
        }
    }

    pub fn file_name(&self) -> String {
        let stamp = self.started.format(TIMESTAMP_FORMAT);
        match self.status {
            ArtifactStatus::InProgress => format!("{FILE_PREFIX}{stamp}.{FILE_EXTENSION}"),
            ArtifactStatus::Complete(e) => format!("{FILE_PREFIX}{stamp}_{e}.{FILE_EXTENSION}"),
            ArtifactStatus::Incomplete(e) => {
                format!("{FILE_PREFIX}{stamp}_{e}{INCOMPLETE_SUFFIX}.{FILE_EXTENSION}")
            }
        }
    }

    /// Parse a file name produced by [`ArtifactName::file_name`].
    /// Returns `None` for anything else.
    pub fn parse(file_name: &str) -> Option<Self> {
        let rest = file_name.strip_prefix(FILE_PREFIX)?;
        let rest = rest.strip_suffix(FILE_EXTENSION)?.strip_suffix('.')?;

        let stamp = rest.get(..TIMESTAMP_LEN)?;
        let started = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        let tail = &rest[TIMESTAMP_LEN..];

        if tail.is_empty() {
            return Some(Self::in_progress(started));
        }

        let tail = tail.strip_prefix('_')?;
        match tail.strip_suffix(INCOMPLETE_SUFFIX) {
            Some(length) => Some(Self::incomplete(started, length.parse().ok()?)),
            None => Some(Self::complete(started, tail.parse().ok()?)),
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
