//! Shell-command jack detector

use std::time::Duration;

use crate::application::ports::JackDetector;
use crate::domain::error::JackError;
use crate::domain::recording::JackState;
use crate::infrastructure::process::run_shell;

/// Runs a user-supplied shell snippet: exit 0 means inserted, 1 removed
pub struct CommandJackDetector {
    script: String,
    timeout: Duration,
}

impl CommandJackDetector {
    pub fn new(script: impl Into<String>, timeout: Duration) -> Self {
        Self {
            script: script.into(),
            timeout,
        }
    }
}

impl JackDetector for CommandJackDetector {
    fn poll(&self) -> Result<JackState, JackError> {
        let output = run_shell(&self.script, self.timeout)
            .map_err(|e| JackError::CommandFailed(e.to_string()))?
            .ok_or_else(|| JackError::CommandFailed("timed out".to_string()))?;

        match output.status.code() {
            Some(0) => Ok(JackState::Present),
            Some(1) => Ok(JackState::Absent),
            Some(code) => Err(JackError::CommandFailed(format!(
                "exit code {}: {}",
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            None => Err(JackError::CommandFailed("terminated by signal".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(script: &str) -> CommandJackDetector {
        CommandJackDetector::new(script, Duration::from_secs(5))
    }

    #[test]
    fn exit_codes_map_to_states() {
        assert_eq!(detector("exit 0").poll(), Ok(JackState::Present));
        assert_eq!(detector("exit 1").poll(), Ok(JackState::Absent));
    }

    #[test]
    fn other_exit_codes_are_errors() {
        assert!(matches!(
            detector("echo broken >&2; exit 3").poll(),
            Err(JackError::CommandFailed(msg)) if msg.contains("broken")
        ));
    }

    #[test]
    fn slow_command_is_an_error() {
        let detector = CommandJackDetector::new("sleep 5", Duration::from_millis(50));
        assert!(detector.poll().is_err());
    }
}
