//! Owned capture child with guaranteed terminate-then-reap

use std::time::Duration;

use tracing::{debug, warn};

use crate::application::ports::{CaptureProcess, Clock, ExitOutcome};
use crate::domain::error::ProcessError;

/// Interval between exit checks while waiting out the stop grace
pub const TERMINATE_POLL: Duration = Duration::from_millis(50);

/// Sole owner of one capture child.
///
/// Dropping a guard whose child has not been reaped kills and reaps it.
pub struct ProcessGuard {
    process: Option<Box<dyn CaptureProcess>>,
    pid: u32,
    exit: Option<ExitOutcome>,
}

impl ProcessGuard {
    pub fn new(process: Box<dyn CaptureProcess>) -> Self {
        let pid = process.id();
        Self {
            process: Some(process),
            pid,
            exit: None,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Exit outcome once the child has been reaped
    pub fn exit(&self) -> Option<ExitOutcome> {
        self.exit
    }

    /// Non-blocking liveness check. `Some` once the child has exited.
    pub fn poll(&mut self) -> Result<Option<ExitOutcome>, ProcessError> {
        let Some(process) = self.process.as_mut() else {
            return Ok(self.exit);
        };
        let exit = process.try_wait()?;
        if let Some(outcome) = exit {
            self.reaped(outcome);
        }
        Ok(exit)
    }

    /// Terminate, wait up to `grace`, then kill. Always reaps.
    pub fn shutdown(
        &mut self,
        grace: Duration,
        clock: &dyn Clock,
    ) -> Result<ExitOutcome, ProcessError> {
        let pid = self.pid;
        let Some(process) = self.process.as_mut() else {
            return Ok(self.exit.unwrap_or_default());
        };

        if let Err(e) = process.terminate() {
            // The child may have exited between polls
            debug!(pid, error = %e, "Terminate signal not delivered");
        }

        let deadline = clock.now() + grace;
        loop {
            match process.try_wait() {
                Ok(Some(outcome)) => {
                    self.reaped(outcome);
                    return Ok(outcome);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(pid, error = %e, "Exit check failed, forcing kill");
                    break;
                }
            }
            let now = clock.now();
            if now >= deadline {
                warn!(pid, grace_ms = grace.as_millis() as u64, "Capture ignored terminate, killing");
                break;
            }
            clock.sleep(TERMINATE_POLL.min(deadline - now));
        }

        if let Err(e) = process.kill() {
            debug!(pid, error = %e, "Kill signal not delivered");
        }
        let mut outcome = process.wait()?;
        outcome.forced = true;
        self.reaped(outcome);
        Ok(outcome)
    }

    fn reaped(&mut self, outcome: ExitOutcome) {
        self.process = None;
        self.exit = Some(outcome);
        debug!(pid = self.pid, exit = %outcome, "Capture reaped");
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut process) = self.process.take() {
            warn!(pid = self.pid, "Capture still running on release, killing");
            let _ = process.kill();
            let _ = process.wait();
        }
    }
}
