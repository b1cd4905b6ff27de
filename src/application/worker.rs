//! The single consumer of recording commands
//!
//! The worker is the only code that spawns, supervises or terminates the
//! capture child. It takes the status lock only to apply a transition,
//! never across process I/O.

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::application::command::{Command, CommandOutcome};
use crate::application::device_cache::DeviceValidationCache;
use crate::application::ports::{CaptureLauncher, Clock, StorageProbe};
use crate::application::process_guard::ProcessGuard;
use crate::application::queue::{CommandQueue, Popped};
use crate::application::shared::SharedStatus;
use crate::domain::error::{DeviceError, ProcessError, RecordingError, StorageError};
use crate::domain::recording::{ArtifactName, Elapsed, RecordingMode, RecordingState};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Worker tunables
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub recording_dir: PathBuf,
    pub min_free_bytes: u64,
    pub start_grace: Duration,
    pub stop_grace: Duration,
    pub supervise_interval: Duration,
}

/// Collaborators the worker drives
#[derive(Clone)]
pub struct WorkerPorts {
    pub launcher: Arc<dyn CaptureLauncher>,
    pub devices: Arc<DeviceValidationCache>,
    pub storage: Arc<dyn StorageProbe>,
    pub clock: Arc<dyn Clock>,
}

/// The live capture, owned by the worker until it ends
struct RecordingSession {
    started_wall: DateTime<Local>,
    started_at: Instant,
    device_id: String,
    output_path: PathBuf,
    mode: RecordingMode,
    process: ProcessGuard,
}

/// How a session ended, for the rename
enum Ending {
    Requested,
    Crashed,
}

pub struct RecordingWorker {
    queue: Arc<CommandQueue>,
    shared: Arc<Mutex<SharedStatus>>,
    ports: WorkerPorts,
    settings: WorkerSettings,
    session: Option<RecordingSession>,
}

impl RecordingWorker {
    pub(crate) fn new(
        queue: Arc<CommandQueue>,
        shared: Arc<Mutex<SharedStatus>>,
        ports: WorkerPorts,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            shared,
            ports,
            settings,
            session: None,
        }
    }

    /// Consume commands until `Shutdown` or queue close
    pub fn run(mut self) {
        info!("Recording worker started");
        let wait = self.settings.supervise_interval;
        while self.step(wait).is_continue() {}
        info!("Recording worker stopped");
    }

    /// Wait up to `wait` for one command, handle it, then supervise the child
    pub fn step(&mut self, wait: Duration) -> ControlFlow<()> {
        match self.queue.pop_timeout(wait) {
            Popped::Command(command) => {
                if self.handle(command).is_break() {
                    return ControlFlow::Break(());
                }
            }
            Popped::TimedOut => {}
            Popped::Closed => {
                self.end_session("queue closed", false);
                return ControlFlow::Break(());
            }
        }
        self.supervise();
        ControlFlow::Continue(())
    }

    /// Handle one command. `Break` ends the loop.
    pub fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Start {
                mode,
                device_id,
                reply,
            } => {
                reply.send(self.start(mode, &device_id));
                ControlFlow::Continue(())
            }
            Command::Stop { reply } => {
                reply.send(self.stop());
                ControlFlow::Continue(())
            }
            Command::Shutdown { reply } => {
                self.shutdown();
                reply.send(CommandOutcome::ShutDown);
                ControlFlow::Break(())
            }
        }
    }

    /// Check on the running child: promote past the start grace, or
    /// finalize a crash
    pub fn supervise(&mut self) {
        if self.session.is_none() {
            return;
        }
        match self.unexpected_exit() {
            None => self.promote_if_ready(),
            Some(err) => self.abandon_session(err),
        }
    }

    /// Error for a child that ended without being asked to. `None` while it runs.
    fn unexpected_exit(&mut self) -> Option<ProcessError> {
        let polled = self.session.as_mut()?.process.poll();
        match polled {
            Ok(None) => None,
            Ok(Some(exit)) => {
                let starting = self.shared.lock().state == RecordingState::Starting;
                if starting {
                    Some(ProcessError::ExitedEarly(exit.to_string()))
                } else {
                    Some(ProcessError::Crashed(exit.to_string()))
                }
            }
            Err(e) => {
                error!(error = %e, "Lost track of capture process");
                Some(e)
            }
        }
    }

    fn start(&mut self, mode: RecordingMode, device_id: &str) -> CommandOutcome {
        {
            let mut shared = self.shared.lock();
            shared.note_dequeued();
            if self.session.is_some() || shared.state.is_active() {
                debug!(%mode, device_id, "Start ignored, already recording");
                return CommandOutcome::AlreadyRecording;
            }
            shared.mode = Some(mode);
            shared.device_id = Some(device_id.to_string());
            shared.last_error = None;
            shared.transition(
                RecordingState::Starting,
                &format!("{} start", mode),
                self.ports.clock.wall(),
            );
        }

        match self.launch(mode, device_id) {
            Ok(output_path) => {
                info!(%mode, device_id, path = %output_path.display(), "Capture started");
                self.promote_if_ready();
                CommandOutcome::Started { output_path }
            }
            Err(e) => {
                error!(%mode, device_id, error = %e, "Failed to start recording");
                self.fail(e.clone(), None);
                CommandOutcome::Failed(e)
            }
        }
    }

    fn launch(&mut self, mode: RecordingMode, device_id: &str) -> Result<PathBuf, RecordingError> {
        if device_id.is_empty() {
            return Err(DeviceError::NotConfigured.into());
        }
        if !self.ports.devices.is_valid(device_id) {
            return Err(DeviceError::Invalid(device_id.to_string()).into());
        }

        let dir = &self.settings.recording_dir;
        fs::create_dir_all(dir).map_err(|e| StorageError::Directory {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
        self.check_free_space(dir)?;

        let started_wall = self.ports.clock.wall();
        let output_path = dir.join(ArtifactName::in_progress(started_wall.naive_local()).file_name());

        let process = self.ports.launcher.spawn(device_id, &output_path)?;
        let process = ProcessGuard::new(process);
        let started_at = self.ports.clock.now();
        debug!(pid = process.pid(), "Capture spawned");

        {
            let mut shared = self.shared.lock();
            shared.started_at = Some(started_at);
            shared.output_path = Some(output_path.clone());
        }
        self.session = Some(RecordingSession {
            started_wall,
            started_at,
            device_id: device_id.to_string(),
            output_path: output_path.clone(),
            mode,
            process,
        });
        Ok(output_path)
    }

    fn check_free_space(&self, dir: &Path) -> Result<(), StorageError> {
        let free = self.ports.storage.free_bytes(dir)?;
        if free < self.settings.min_free_bytes {
            return Err(StorageError::InsufficientSpace {
                free_mb: free / BYTES_PER_MB,
                required_mb: self.settings.min_free_bytes / BYTES_PER_MB,
            });
        }
        Ok(())
    }

    fn promote_if_ready(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let now = self.ports.clock.now();
        if now.saturating_duration_since(session.started_at) < self.settings.start_grace {
            return;
        }

        let mut shared = self.shared.lock();
        if shared.state == RecordingState::Starting {
            shared.transition(RecordingState::Recording, "capture running", self.ports.clock.wall());
        }
    }

    fn stop(&mut self) -> CommandOutcome {
        // A crash not yet seen by `supervise` must not pass for a clean stop
        if let Some(err) = self.unexpected_exit() {
            self.shared.lock().note_dequeued();
            self.abandon_session(err.clone());
            return CommandOutcome::Failed(err.into());
        }
        match self.end_session("stop requested", true) {
            Some((artifact, elapsed)) => CommandOutcome::Stopped { artifact, elapsed },
            None => {
                debug!("Stop ignored, not recording");
                CommandOutcome::NotRecording
            }
        }
    }

    fn shutdown(&mut self) {
        info!("Shutdown requested");
        if let Some(err) = self.unexpected_exit() {
            self.abandon_session(err);
        }
        self.end_session("shutdown", false);
        for pending in self.queue.close_and_drain() {
            pending.reject(CommandOutcome::ShutDown);
        }
    }

    /// Stop the active session, if any, and finalize its file.
    /// `dequeued` settles the queue bookkeeping in the same critical section.
    fn end_session(&mut self, reason: &str, dequeued: bool) -> Option<(Option<PathBuf>, Elapsed)> {
        let mut session = {
            let mut shared = self.shared.lock();
            if dequeued {
                shared.note_dequeued();
            }
            let session = self.session.take()?;
            shared.transition(RecordingState::Stopping, reason, self.ports.clock.wall());
            session
        };

        let exit = session
            .process
            .shutdown(self.settings.stop_grace, self.ports.clock.as_ref());
        let elapsed = self.elapsed_since(session.started_at);
        let artifact = self.finalize(&session, elapsed, Ending::Requested);

        let mut shared = self.shared.lock();
        match exit {
            Ok(outcome) => {
                info!(
                    mode = %session.mode,
                    device_id = %session.device_id,
                    %elapsed,
                    exit = %outcome,
                    "Recording stopped"
                );
            }
            Err(e) => {
                warn!(error = %e, "Capture did not shut down cleanly");
                shared.last_error = Some(e.into());
            }
        }
        shared.last_artifact = artifact.clone();
        shared.clear_session();
        shared.transition(RecordingState::Idle, "stopped", self.ports.clock.wall());

        Some((artifact, elapsed))
    }

    /// The child exited on its own: keep what it wrote, then record the error
    fn abandon_session(&mut self, err: ProcessError) {
        let Some(session) = self.session.take() else {
            return;
        };
        let elapsed = self.elapsed_since(session.started_at);
        warn!(pid = session.process.pid(), %elapsed, error = %err, "Capture ended unexpectedly");

        let artifact = self.finalize(&session, elapsed, Ending::Crashed);
        drop(session);
        self.fail(err.into(), artifact);
    }

    /// Record a failure, pass through `Error`, land on `Idle`
    fn fail(&mut self, err: RecordingError, artifact: Option<PathBuf>) {
        let wall = self.ports.clock.wall();
        let mut shared = self.shared.lock();
        let reason = err.to_string();
        shared.last_error = Some(err);
        if artifact.is_some() {
            shared.last_artifact = artifact;
        }
        shared.clear_session();
        shared.transition(RecordingState::Error, &reason, wall);
        shared.transition(RecordingState::Idle, "error recorded", wall);
    }

    fn elapsed_since(&self, started_at: Instant) -> Elapsed {
        Elapsed::from_duration(self.ports.clock.now().saturating_duration_since(started_at))
    }

    /// Rename the output to embed its length. Empty crash files are removed.
    fn finalize(&self, session: &RecordingSession, elapsed: Elapsed, ending: Ending) -> Option<PathBuf> {
        let path = &session.output_path;
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Capture left no output file");
                return None;
            }
        };

        let started = session.started_wall.naive_local();
        let name = match ending {
            Ending::Requested => ArtifactName::complete(started, elapsed),
            Ending::Crashed if size == 0 => {
                if let Err(e) = fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "Failed to remove empty recording");
                }
                return None;
            }
            Ending::Crashed => ArtifactName::incomplete(started, elapsed),
        };

        let target = path.with_file_name(name.file_name());
        match fs::rename(path, &target) {
            Ok(()) => {
                info!(path = %target.display(), bytes = size, "Recording saved");
                Some(target)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to rename recording, keeping original name");
                Some(path.clone())
            }
        }
    }
}
