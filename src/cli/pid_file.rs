//! PID file guarding against two daemons

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tracing::warn;

/// Default PID file location
pub const DEFAULT_PID_PATH: &str = "/tmp/picorder.pid";

/// PID file errors
#[derive(Debug, thiserror::Error)]
pub enum PidFileError {
    #[error("Another daemon is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("Failed to write PID file: {0}")]
    WriteFailed(String),
}

/// Held for the daemon's lifetime; the file is removed on drop
pub struct PidFile {
    path: PathBuf,
    owned: bool,
}

impl PidFile {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_PID_PATH)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID of a live daemon recorded in the file. Stale files are removed.
    pub fn running_pid(&self) -> Option<u32> {
        let pid: u32 = fs::read_to_string(&self.path).ok()?.trim().parse().ok()?;

        // Null signal: existence check only
        match kill(Pid::from_raw(pid as i32), None) {
            Ok(()) | Err(Errno::EPERM) => Some(pid),
            Err(_) => {
                let _ = fs::remove_file(&self.path);
                None
            }
        }
    }

    /// Write our PID, failing if another daemon holds the file
    pub fn acquire(&mut self) -> Result<(), PidFileError> {
        if let Some(pid) = self.running_pid() {
            if pid != process::id() {
                return Err(PidFileError::AlreadyRunning(pid));
            }
        }

        fs::write(&self.path, process::id().to_string())
            .map_err(|e| PidFileError::WriteFailed(e.to_string()))?;
        self.owned = true;
        Ok(())
    }

    pub fn release(&mut self) {
        if !self.owned {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove PID file");
            }
        }
        self.owned = false;
    }
}

impl Default for PidFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        self.release();
    }
}
