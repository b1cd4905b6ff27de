//! Thread-safe façade over the recording worker
//!
//! Producers (the control socket, the auto-record monitor) call `start`,
//! `stop` and `status` from any thread. None of these block on the worker:
//! commands go through the bounded queue, status is copied out under the
//! status lock.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::application::auto_record::AutoRecordFlag;
use crate::application::command::{
    Command, CommandKind, CommandOutcome, RejectReason, Submission,
};
use crate::application::device_cache::DeviceValidationCache;
use crate::application::ports::Clock;
use crate::application::queue::CommandQueue;
use crate::application::shared::{Intent, SharedStatus};
use crate::application::worker::{RecordingWorker, WorkerPorts, WorkerSettings};
use crate::domain::config::ConfigSnapshot;
use crate::domain::error::{DeviceError, QueueError};
use crate::domain::recording::{RecordingMode, RecordingStatus, TransitionRecord};

/// Manager tunables
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub worker: WorkerSettings,
    pub queue_capacity: usize,
    pub shutdown_timeout: Duration,
}

impl ManagerSettings {
    pub fn from_config(config: &ConfigSnapshot) -> Self {
        let timings = &config.timings;
        Self {
            worker: WorkerSettings {
                recording_dir: config.recording_dir.clone(),
                min_free_bytes: config.min_free_bytes(),
                start_grace: timings.start_grace,
                stop_grace: timings.stop_grace,
                supervise_interval: timings.supervise_interval,
            },
            queue_capacity: timings.queue_capacity,
            shutdown_timeout: timings.shutdown_timeout,
        }
    }

    pub fn recording_dir(&self) -> &PathBuf {
        &self.worker.recording_dir
    }
}

pub struct RecordingManager {
    queue: Arc<CommandQueue>,
    shared: Arc<Mutex<SharedStatus>>,
    devices: Arc<DeviceValidationCache>,
    auto_record: Arc<AutoRecordFlag>,
    clock: Arc<dyn Clock>,
    shutdown_timeout: Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RecordingManager {
    /// Build the manager and its worker without starting the worker thread.
    /// The caller runs the worker (or drives it by hand).
    pub fn new(
        ports: WorkerPorts,
        auto_record: Arc<AutoRecordFlag>,
        settings: ManagerSettings,
    ) -> (Self, RecordingWorker) {
        let queue = Arc::new(CommandQueue::new(settings.queue_capacity));
        let shared = Arc::new(Mutex::new(SharedStatus::default()));

        let manager = Self {
            queue: Arc::clone(&queue),
            shared: Arc::clone(&shared),
            devices: Arc::clone(&ports.devices),
            auto_record,
            clock: Arc::clone(&ports.clock),
            shutdown_timeout: settings.shutdown_timeout,
            worker: Mutex::new(None),
        };
        let worker = RecordingWorker::new(queue, shared, ports, settings.worker);
        (manager, worker)
    }

    /// Build the manager and run its worker on a dedicated thread
    pub fn spawn(
        ports: WorkerPorts,
        auto_record: Arc<AutoRecordFlag>,
        settings: ManagerSettings,
    ) -> std::io::Result<Arc<Self>> {
        let (manager, worker) = Self::new(ports, auto_record, settings);
        let handle = thread::Builder::new()
            .name("recording-worker".to_string())
            .spawn(move || worker.run())?;
        *manager.worker.lock() = Some(handle);
        Ok(Arc::new(manager))
    }

    /// Request a recording. Never blocks on the worker.
    pub fn start(&self, mode: RecordingMode, device_id: &str) -> Submission {
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Submission::Rejected(RejectReason::DeviceInvalid(DeviceError::NotConfigured));
        }
        if mode == RecordingMode::Auto && !self.auto_record.is_enabled() {
            return Submission::Rejected(RejectReason::AutoRecordDisabled);
        }
        if self.devices.peek(device_id) == Some(false) {
            return Submission::Rejected(RejectReason::DeviceInvalid(DeviceError::Invalid(
                device_id.to_string(),
            )));
        }

        let (command, receipt) = Command::start(mode, device_id);
        let mut shared = self.shared.lock();
        if shared.projected_recording() {
            return Submission::Rejected(RejectReason::AlreadyRecording);
        }
        match self.enqueue(&mut shared, command, Intent::Record) {
            Ok(()) => {
                info!(%mode, device_id, "Start accepted");
                Submission::Accepted(receipt)
            }
            Err(reason) => Submission::Rejected(reason),
        }
    }

    /// Request the active recording to stop. Never blocks on the worker.
    pub fn stop(&self) -> Submission {
        let (command, receipt) = Command::stop();
        let mut shared = self.shared.lock();
        if !shared.projected_recording() {
            return Submission::Rejected(RejectReason::NotRecording);
        }
        match self.enqueue(&mut shared, command, Intent::Halt) {
            Ok(()) => {
                info!("Stop accepted");
                Submission::Accepted(receipt)
            }
            Err(reason) => Submission::Rejected(reason),
        }
    }

    /// Copy of the current status
    pub fn status(&self) -> RecordingStatus {
        let auto_record = self.auto_record.is_enabled();
        let now = self.clock.now();
        self.shared.lock().snapshot(now, auto_record)
    }

    /// Last state transitions, oldest first
    pub fn history(&self) -> Vec<TransitionRecord> {
        self.shared.lock().history()
    }

    /// Commands queued but not yet taken by the worker
    pub fn pending_commands(&self) -> Vec<CommandKind> {
        self.queue.kinds()
    }

    pub fn auto_record(&self) -> &Arc<AutoRecordFlag> {
        &self.auto_record
    }

    /// Toggle auto-record. Turning it off stops an active auto session.
    pub fn set_auto_record(&self, enabled: bool) -> Option<Submission> {
        if enabled {
            self.auto_record.enable();
            return None;
        }
        self.auto_record.disable();
        self.stop_auto_session()
    }

    /// Stop the current session if the monitor started it
    pub fn stop_auto_session(&self) -> Option<Submission> {
        let status = self.status();
        if status.is_active() && status.mode == Some(RecordingMode::Auto) {
            Some(self.stop())
        } else {
            None
        }
    }

    /// Stop any recording and end the worker, waiting at most the
    /// configured shutdown timeout. Returns true if the worker confirmed.
    pub fn shutdown(&self) -> bool {
        let deadline = Instant::now() + self.shutdown_timeout;
        let (command, receipt) = Command::shutdown();

        let confirmed = match self.queue.push_blocking(command, self.shutdown_timeout) {
            Ok(()) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                matches!(receipt.wait(remaining), Some(CommandOutcome::ShutDown))
            }
            Err((QueueError::Closed, _)) => {
                info!("Recording worker already shut down");
                true
            }
            Err((QueueError::Full, _)) => false,
        };

        let handle = self.worker.lock().take();
        match (confirmed, handle) {
            (true, Some(handle)) => {
                if handle.join().is_err() {
                    warn!("Recording worker panicked");
                }
            }
            (false, Some(_)) => {
                warn!(
                    timeout_ms = self.shutdown_timeout.as_millis() as u64,
                    "Recording worker did not stop in time, detaching"
                );
            }
            (_, None) => {}
        }
        confirmed
    }

    #[cfg(test)]
    pub(crate) fn queue(&self) -> &Arc<CommandQueue> {
        &self.queue
    }

    fn enqueue(
        &self,
        shared: &mut SharedStatus,
        command: Command,
        intent: Intent,
    ) -> Result<(), RejectReason> {
        match self.queue.push(command) {
            Ok(()) => {
                shared.note_enqueued(intent);
                Ok(())
            }
            Err((QueueError::Full, _)) => {
                warn!(capacity = self.queue.capacity(), "Command queue full, rejecting");
                Err(RejectReason::QueueFull)
            }
            Err((QueueError::Closed, _)) => Err(RejectReason::ShuttingDown),
        }
    }
}
