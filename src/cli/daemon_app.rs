//! Daemon app runner
//!
//! Wires the recording core (manager, worker, monitor, caches) to its
//! adapters, then serves the control socket and OS signals until asked
//! to shut down.

use std::process::ExitCode;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::application::ports::{Clock, ConfigStore};
use crate::application::{
    AutoRecordFlag, AutoRecordMonitor, CancelToken, CommandOutcome, ConfigCache,
    DeviceValidationCache, ManagerSettings, RecordingManager, Submission, WorkerPorts,
};
use crate::domain::recording::RecordingMode;
use crate::infrastructure::{
    create_jack_detector, AlsaDeviceProber, ArecordLauncher, StatvfsProbe, SystemClock,
};

use super::app::{load_snapshot, EXIT_ERROR, EXIT_SUCCESS};
use super::pid_file::PidFile;
use super::presenter::Presenter;
use super::signals::{DaemonSignal, DaemonSignalHandler};
use super::socket::{
    ControlHandler, ControlReply, ControlRequest, DaemonSocketServer, SocketPath,
};

/// How long a control client waits for the worker to act on start/stop
const ACK_SLACK: Duration = Duration::from_secs(1);

/// Everything a control request can touch
struct DaemonContext {
    manager: Arc<RecordingManager>,
    config: Arc<ConfigCache>,
    devices: Arc<DeviceValidationCache>,
    signals: mpsc::Sender<DaemonSignal>,
    start_wait: Duration,
    stop_wait: Duration,
}

impl DaemonContext {
    fn handle(&self, request: ControlRequest) -> ControlReply {
        match request {
            ControlRequest::Start { device } => {
                let device = device.unwrap_or_else(|| self.config.get().audio_device);
                let submission = self.manager.start(RecordingMode::Manual, &device);
                self.acknowledge(submission, self.start_wait)
            }
            ControlRequest::Stop => {
                let submission = self.manager.stop();
                self.acknowledge(submission, self.stop_wait)
            }
            ControlRequest::Status => ControlReply::Status(Box::new(self.manager.status())),
            ControlRequest::History => ControlReply::History(self.manager.history()),
            ControlRequest::Auto(enabled) => self.set_auto(enabled),
            ControlRequest::Reload => self.forward(DaemonSignal::Reload),
            ControlRequest::Shutdown => self.forward(DaemonSignal::Shutdown),
        }
    }

    /// Wait briefly for the worker so the client hears about failures
    fn acknowledge(&self, submission: Submission, wait: Duration) -> ControlReply {
        let receipt = match submission {
            Submission::Accepted(receipt) => receipt,
            Submission::Rejected(reason) => return ControlReply::Rejected(reason.to_string()),
        };
        match receipt.wait(wait) {
            Some(CommandOutcome::Started { output_path }) => {
                ControlReply::ok_with(format!("recording to {}", output_path.display()))
            }
            Some(CommandOutcome::Stopped {
                artifact: Some(path),
                elapsed,
            }) => ControlReply::ok_with(format!("saved {} ({})", path.display(), elapsed)),
            Some(CommandOutcome::Stopped { artifact: None, .. }) => {
                ControlReply::ok_with("stopped, nothing saved")
            }
            Some(CommandOutcome::AlreadyRecording) => {
                ControlReply::Rejected("already recording".to_string())
            }
            Some(CommandOutcome::NotRecording) => {
                ControlReply::Rejected("not recording".to_string())
            }
            Some(CommandOutcome::Failed(e)) => ControlReply::Error(e.to_string()),
            Some(CommandOutcome::ShutDown) => ControlReply::Rejected("shutting down".to_string()),
            None => ControlReply::ok_with("queued"),
        }
    }

    fn set_auto(&self, enabled: bool) -> ControlReply {
        if enabled {
            // A stale negative answer would disable it again on the next tick
            self.devices.invalidate(&self.config.get().audio_device);
        }
        let stop = self.manager.set_auto_record(enabled);
        if let Err(e) = self.config.set_auto_record(enabled) {
            error!(error = %e, "Failed to persist auto-record setting");
            return ControlReply::Error(e.to_string());
        }
        match stop {
            Some(Submission::Accepted(_)) => ControlReply::ok_with("auto recording stopped"),
            _ => ControlReply::ok(),
        }
    }

    fn forward(&self, signal: DaemonSignal) -> ControlReply {
        // Runs on a blocking thread, never inside the async executor
        match self.signals.blocking_send(signal) {
            Ok(()) => ControlReply::ok(),
            Err(_) => ControlReply::Error("daemon is shutting down".to_string()),
        }
    }
}

/// Run daemon mode
pub async fn run_daemon(store: Arc<dyn ConfigStore>) -> ExitCode {
    let presenter = Presenter::new();

    let mut pid_file = PidFile::new();
    if let Err(e) = pid_file.acquire() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    if !store.exists() {
        warn!(path = %store.path().display(), "No config file, using defaults");
    }
    let snapshot = load_snapshot(store.as_ref());
    let timings = snapshot.timings.clone();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let config = Arc::new(ConfigCache::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        timings.config_ttl,
    ));
    let prober = Arc::new(AlsaDeviceProber::new(
        snapshot.capture_command.clone(),
        timings.probe_timeout,
    ));
    let devices = Arc::new(DeviceValidationCache::new(
        prober,
        Arc::clone(&clock),
        timings.device_ttl,
    ));

    let ports = WorkerPorts {
        launcher: Arc::new(ArecordLauncher::new(snapshot.capture_command.clone())),
        devices: Arc::clone(&devices),
        storage: Arc::new(StatvfsProbe),
        clock: Arc::clone(&clock),
    };
    let settings = ManagerSettings::from_config(&snapshot);
    let flag = Arc::new(AutoRecordFlag::new(snapshot.auto_record));
    let manager = match RecordingManager::spawn(ports, flag, settings) {
        Ok(manager) => manager,
        Err(e) => {
            presenter.error(&format!("Failed to start recording worker: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let monitor = Arc::new(AutoRecordMonitor::new(
        Arc::clone(&manager),
        create_jack_detector(&snapshot.jack_source, timings.probe_timeout),
        Arc::clone(&devices),
        Arc::clone(&config),
        timings.monitor_active_interval,
        timings.monitor_idle_interval,
    ));
    let cancel = monitor.cancel_token();
    let monitor_handle = match monitor.spawn() {
        Ok(handle) => handle,
        Err(e) => {
            presenter.error(&format!("Failed to start auto-record monitor: {}", e));
            shutdown_core(Arc::clone(&manager), cancel, None).await;
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let (mut signals, signal_tx) = match DaemonSignalHandler::new() {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            shutdown_core(manager, cancel, Some(monitor_handle)).await;
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let socket_path = SocketPath::new();
    let mut socket_server = DaemonSocketServer::new(socket_path.clone());
    if let Err(e) = socket_server.bind() {
        presenter.error(&format!("Failed to bind socket: {}", e));
        shutdown_core(manager, cancel, Some(monitor_handle)).await;
        return ExitCode::from(EXIT_ERROR);
    }

    let context = Arc::new(DaemonContext {
        manager: Arc::clone(&manager),
        config: Arc::clone(&config),
        devices: Arc::clone(&devices),
        signals: signal_tx,
        start_wait: timings.probe_timeout + timings.start_grace + ACK_SLACK,
        stop_wait: timings.stop_grace + ACK_SLACK,
    });
    let handler: ControlHandler = Arc::new(move |request| context.handle(request));
    let server_task = tokio::spawn(async move {
        if let Err(e) = socket_server.run(handler).await {
            error!(error = %e, "Control socket stopped");
        }
        // Dropping the server removes the socket file
    });

    info!(
        pid = std::process::id(),
        socket = %socket_path.path().display(),
        device = %snapshot.audio_device,
        auto_record = snapshot.auto_record,
        "Daemon started"
    );
    presenter.success(&format!(
        "Daemon started | PID: {} | Socket: {}",
        std::process::id(),
        socket_path.path().display()
    ));

    while let Some(signal) = signals.recv().await {
        match signal {
            DaemonSignal::Reload => reload(&config, &devices, &manager),
            DaemonSignal::Shutdown => break,
        }
    }

    info!("Shutting down");
    server_task.abort();
    let _ = server_task.await;
    let clean = shutdown_core(manager, cancel, Some(monitor_handle)).await;
    pid_file.release();

    if clean {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

fn reload(config: &ConfigCache, devices: &DeviceValidationCache, manager: &RecordingManager) {
    let snapshot = config.reload();
    devices.clear();
    if snapshot.auto_record != manager.auto_record().is_enabled() {
        manager.set_auto_record(snapshot.auto_record);
    }
    match config.last_error() {
        Some(e) => warn!(error = %e, "Config reload failed, keeping previous values"),
        None => info!(
            device = %snapshot.audio_device,
            auto_record = snapshot.auto_record,
            "Config reloaded"
        ),
    }
}

/// Stop the monitor, then the worker. Both block, so run off the executor.
async fn shutdown_core(
    manager: Arc<RecordingManager>,
    cancel: CancelToken,
    monitor: Option<JoinHandle<()>>,
) -> bool {
    let result = tokio::task::spawn_blocking(move || {
        cancel.cancel();
        if let Some(handle) = monitor {
            if handle.join().is_err() {
                warn!("Auto-record monitor panicked");
            }
        }
        manager.shutdown()
    })
    .await;

    match result {
        Ok(true) => true,
        Ok(false) => {
            warn!("Recording worker did not confirm shutdown");
            false
        }
        Err(e) => {
            error!(error = %e, "Shutdown task failed");
            false
        }
    }
}
