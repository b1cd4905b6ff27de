//! Jack-presence detector adapters
//!
//! The source is picked from config: a shell command, a value file,
//! or nothing (auto recording never triggers).

mod command;
mod file;

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::JackDetector;
use crate::domain::config::JackSource;
use crate::domain::error::JackError;
use crate::domain::recording::JackState;

pub use command::CommandJackDetector;
pub use file::FileJackDetector;

/// Detector used when no jack source is configured
pub struct NoJackDetector;

impl JackDetector for NoJackDetector {
    fn poll(&self) -> Result<JackState, JackError> {
        Ok(JackState::Unknown)
    }
}

/// Build the detector for a configured source
pub fn create_jack_detector(source: &JackSource, timeout: Duration) -> Arc<dyn JackDetector> {
    match source {
        JackSource::Command(script) => Arc::new(CommandJackDetector::new(script.clone(), timeout)),
        JackSource::File(path) => Arc::new(FileJackDetector::new(path.clone())),
        JackSource::Disabled => Arc::new(NoJackDetector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_source_reports_unknown() {
        let detector = create_jack_detector(&JackSource::Disabled, Duration::from_secs(1));
        assert_eq!(detector.poll(), Ok(JackState::Unknown));
    }

    #[test]
    fn command_source_runs_script() {
        let detector = create_jack_detector(
            &JackSource::Command("exit 1".to_string()),
            Duration::from_secs(5),
        );
        assert_eq!(detector.poll(), Ok(JackState::Absent));
    }
}
