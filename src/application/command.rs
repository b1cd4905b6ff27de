//! Recording commands and their acknowledgements

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use thiserror::Error;

use crate::domain::error::{DeviceError, RecordingError};
use crate::domain::recording::{Elapsed, RecordingMode};

/// What the worker reports back after handling a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Capture spawned; the session is `Starting` or `Recording`
    Started { output_path: PathBuf },
    AlreadyRecording,
    /// Session ended; `artifact` is the renamed file if one was kept
    Stopped {
        artifact: Option<PathBuf>,
        elapsed: Elapsed,
    },
    NotRecording,
    Failed(RecordingError),
    ShutDown,
}

/// Optional acknowledgement channel attached to a command
#[derive(Debug, Default)]
pub struct Reply(Option<Sender<CommandOutcome>>);

impl Reply {
    /// No one is waiting
    pub fn none() -> Self {
        Self(None)
    }

    pub fn channel() -> (Self, Receipt) {
        let (tx, rx) = mpsc::channel();
        (Self(Some(tx)), Receipt { rx })
    }

    pub fn send(self, outcome: CommandOutcome) {
        if let Some(tx) = self.0 {
            // The issuer may have stopped waiting
            let _ = tx.send(outcome);
        }
    }
}

/// Issuer's side of a [`Reply`]
#[derive(Debug)]
pub struct Receipt {
    rx: Receiver<CommandOutcome>,
}

impl Receipt {
    /// Wait for the worker to handle the command.
    /// `None` on timeout or if the command was dropped unhandled.
    pub fn wait(&self, timeout: Duration) -> Option<CommandOutcome> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[derive(Debug)]
pub enum Command {
    Start {
        mode: RecordingMode,
        device_id: String,
        reply: Reply,
    },
    Stop {
        reply: Reply,
    },
    Shutdown {
        reply: Reply,
    },
}

impl Command {
    pub fn start(mode: RecordingMode, device_id: impl Into<String>) -> (Self, Receipt) {
        let (reply, receipt) = Reply::channel();
        let command = Self::Start {
            mode,
            device_id: device_id.into(),
            reply,
        };
        (command, receipt)
    }

    pub fn stop() -> (Self, Receipt) {
        let (reply, receipt) = Reply::channel();
        (Self::Stop { reply }, receipt)
    }

    pub fn shutdown() -> (Self, Receipt) {
        let (reply, receipt) = Reply::channel();
        (Self::Shutdown { reply }, receipt)
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Start {
                mode, device_id, ..
            } => CommandKind::Start {
                mode: *mode,
                device_id: device_id.clone(),
            },
            Self::Stop { .. } => CommandKind::Stop,
            Self::Shutdown { .. } => CommandKind::Shutdown,
        }
    }

    /// Answer without executing
    pub fn reject(self, outcome: CommandOutcome) {
        match self {
            Self::Start { reply, .. } | Self::Stop { reply } | Self::Shutdown { reply } => {
                reply.send(outcome)
            }
        }
    }
}

/// Command without its reply channel, for inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Start {
        mode: RecordingMode,
        device_id: String,
    },
    Stop,
    Shutdown,
}

/// Why the manager refused to enqueue a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("device invalid: {0}")]
    DeviceInvalid(DeviceError),

    #[error("auto-record disabled")]
    AutoRecordDisabled,

    #[error("queue full")]
    QueueFull,

    #[error("shutting down")]
    ShuttingDown,
}

/// Result of `RecordingManager::start`/`stop`
#[derive(Debug)]
pub enum Submission {
    Accepted(Receipt),
    Rejected(RejectReason),
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn receipt(self) -> Option<Receipt> {
        match self {
            Self::Accepted(receipt) => Some(receipt),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectReason> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_reaches_receipt() {
        let (command, receipt) = Command::stop();
        command.reject(CommandOutcome::NotRecording);
        assert_eq!(
            receipt.wait(Duration::from_millis(10)),
            Some(CommandOutcome::NotRecording)
        );
    }

    #[test]
    fn dropped_command_yields_none() {
        let (command, receipt) = Command::stop();
        drop(command);
        assert_eq!(receipt.wait(Duration::from_millis(10)), None);
    }

    #[test]
    fn send_without_listener_is_silent() {
        Reply::none().send(CommandOutcome::ShutDown);
        let (reply, receipt) = Reply::channel();
        drop(receipt);
        reply.send(CommandOutcome::ShutDown);
    }

    #[test]
    fn kind_strips_reply() {
        let (command, _receipt) = Command::start(RecordingMode::Auto, "plughw:1,0");
        assert_eq!(
            command.kind(),
            CommandKind::Start {
                mode: RecordingMode::Auto,
                device_id: "plughw:1,0".to_string()
            }
        );
    }

    #[test]
    fn reject_reason_messages() {
        assert_eq!(RejectReason::AlreadyRecording.to_string(), "already recording");
        assert_eq!(
            RejectReason::DeviceInvalid(DeviceError::NotConfigured).to_string(),
            "device invalid: No audio device selected"
        );
    }
}
