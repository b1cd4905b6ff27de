//! File-backed jack detector (sysfs or GPIO value files)

use std::fs;
use std::path::PathBuf;

use crate::application::ports::JackDetector;
use crate::domain::error::JackError;
use crate::domain::recording::JackState;

pub struct FileJackDetector {
    path: PathBuf,
}

impl FileJackDetector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(content: &str) -> Result<JackState, JackError> {
        match content.trim().to_ascii_lowercase().as_str() {
            "1" | "on" | "yes" | "true" | "present" | "inserted" => Ok(JackState::Present),
            "0" | "off" | "no" | "false" | "absent" | "removed" => Ok(JackState::Absent),
            other => Err(JackError::Unrecognized(other.to_string())),
        }
    }
}

impl JackDetector for FileJackDetector {
    fn poll(&self) -> Result<JackState, JackError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| JackError::ReadFailed(format!("{}: {}", self.path.display(), e)))?;
        Self::parse(&content)
    }
}
