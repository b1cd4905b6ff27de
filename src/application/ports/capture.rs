//! Capture process port interfaces

use std::fmt;
use std::path::Path;

use crate::domain::error::ProcessError;

/// How a capture process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitOutcome {
    pub code: Option<i32>,
    pub signal: Option<i32>,
    /// True if the process had to be killed after the grace period
    pub forced: bool,
}

impl ExitOutcome {
    pub fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn signal(signal: i32) -> Self {
        Self {
            signal: Some(signal),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {}", code)?,
            (None, Some(signal)) => write!(f, "signal {}", signal)?,
            (None, None) => write!(f, "unknown exit")?,
        }
        if self.forced {
            write!(f, ", killed")?;
        }
        Ok(())
    }
}

/// A running capture child
pub trait CaptureProcess: Send {
    /// OS process id
    fn id(&self) -> u32;

    /// Non-blocking exit check; reaps the child if it has exited
    fn try_wait(&mut self) -> Result<Option<ExitOutcome>, ProcessError>;

    /// Ask the child to finish writing and exit
    fn terminate(&mut self) -> Result<(), ProcessError>;

    /// Forced termination
    fn kill(&mut self) -> Result<(), ProcessError>;

    /// Block until the child exits and reap it
    fn wait(&mut self) -> Result<ExitOutcome, ProcessError>;
}

/// Port for starting the external capture utility
pub trait CaptureLauncher: Send + Sync {
    /// Start capturing from `device_id` into `output_path`.
    ///
    /// # Returns
    /// A handle to the running child, or the spawn failure
    fn spawn(
        &self,
        device_id: &str,
        output_path: &Path,
    ) -> Result<Box<dyn CaptureProcess>, ProcessError>;
}
