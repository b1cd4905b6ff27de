//! arecord-based capture adapter

use std::io::{BufRead, BufReader};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::debug;

use crate::application::ports::{CaptureLauncher, CaptureProcess, ExitOutcome};
use crate::domain::error::ProcessError;

/// Starts `arecord` writing CD-quality WAV
pub struct ArecordLauncher {
    program: String,
}

impl ArecordLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Build arecord args for a capture
    fn build_args(device_id: &str, output_path: &Path) -> Vec<String> {
        vec![
            "-D".to_string(),
            device_id.to_string(),
            "-f".to_string(),
            "cd".to_string(), // 16-bit little endian, 44.1kHz, stereo
            "-t".to_string(),
            "wav".to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }
}

impl Default for ArecordLauncher {
    fn default() -> Self {
        Self::new("arecord")
    }
}

impl CaptureLauncher for ArecordLauncher {
    fn spawn(
        &self,
        device_id: &str,
        output_path: &Path,
    ) -> Result<Box<dyn CaptureProcess>, ProcessError> {
        let mut child = Command::new(&self.program)
            .args(Self::build_args(device_id, output_path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProcessError::NotFound(self.program.clone())
                } else {
                    ProcessError::SpawnFailed(e.to_string())
                }
            })?;

        // Overrun warnings would otherwise fill the pipe and stall the capture
        if let Some(stderr) = child.stderr.take() {
            let pid = child.id();
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    debug!(pid, "arecord: {}", line);
                }
            });
        }

        Ok(Box::new(ArecordProcess { child }))
    }
}

/// A running arecord child
pub struct ArecordProcess {
    child: Child,
}

impl ArecordProcess {
    fn send_signal(&self, sig: Signal) -> Result<(), ProcessError> {
        signal::kill(Pid::from_raw(self.child.id() as i32), sig)
            .map_err(|e| ProcessError::SignalFailed(format!("{}: {}", sig, e)))
    }
}

fn outcome(status: ExitStatus) -> ExitOutcome {
    ExitOutcome {
        code: status.code(),
        signal: status.signal(),
        forced: false,
    }
}

impl CaptureProcess for ArecordProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn try_wait(&mut self) -> Result<Option<ExitOutcome>, ProcessError> {
        self.child
            .try_wait()
            .map(|status| status.map(outcome))
            .map_err(|e| ProcessError::WaitFailed(e.to_string()))
    }

    /// SIGTERM lets arecord patch the WAV header before exiting
    fn terminate(&mut self) -> Result<(), ProcessError> {
        self.send_signal(Signal::SIGTERM)
    }

    fn kill(&mut self) -> Result<(), ProcessError> {
        self.child
            .kill()
            .map_err(|e| ProcessError::SignalFailed(e.to_string()))
    }

    fn wait(&mut self) -> Result<ExitOutcome, ProcessError> {
        self.child
            .wait()
            .map(outcome)
            .map_err(|e| ProcessError::WaitFailed(e.to_string()))
    }
}
