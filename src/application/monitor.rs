//! Background loop that turns jack insertion into auto recordings

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::application::config_cache::ConfigCache;
use crate::application::device_cache::DeviceValidationCache;
use crate::application::manager::RecordingManager;
use crate::application::ports::JackDetector;
use crate::domain::recording::{JackState, RecordingMode, RecordingState};

/// Cooperative cancellation shared between the monitor and its owner
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, wake) = &*self.inner;
        *flag.lock() = true;
        wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Sleep up to `timeout`, returning early (with true) on cancel
    pub fn wait(&self, timeout: Duration) -> bool {
        let (flag, wake) = &*self.inner;
        let mut cancelled = flag.lock();
        wake.wait_while_for(&mut cancelled, |cancelled| !*cancelled, timeout);
        *cancelled
    }
}

/// Something the monitor asked the manager to do during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorAction {
    StartRequested { device_id: String },
    StopRequested,
    AutoRecordDisabled { device_id: String },
    /// The manager refused; carries the reason
    Refused(String),
}

/// Outcome of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub jack: JackState,
    pub actions: Vec<MonitorAction>,
    /// How long to wait before the next tick
    pub next_interval: Duration,
}

pub struct AutoRecordMonitor {
    manager: Arc<RecordingManager>,
    detector: Arc<dyn JackDetector>,
    devices: Arc<DeviceValidationCache>,
    config: Arc<ConfigCache>,
    active_interval: Duration,
    idle_interval: Duration,
    cancel: CancelToken,
}

impl AutoRecordMonitor {
    pub fn new(
        manager: Arc<RecordingManager>,
        detector: Arc<dyn JackDetector>,
        devices: Arc<DeviceValidationCache>,
        config: Arc<ConfigCache>,
        active_interval: Duration,
        idle_interval: Duration,
    ) -> Self {
        Self {
            manager,
            detector,
            devices,
            config,
            active_interval,
            idle_interval,
            cancel: CancelToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Poll until cancelled. Cancellation is seen within one interval.
    pub fn run(&self) {
        info!("Auto-record monitor started");
        while !self.cancel.is_cancelled() {
            let report = self.tick();
            if self.cancel.wait(report.next_interval) {
                break;
            }
        }
        info!("Auto-record monitor stopped");
    }

    /// Run on a dedicated thread
    pub fn spawn(self: Arc<Self>) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("auto-record-monitor".to_string())
            .spawn(move || self.run())
    }

    /// One poll of the jack and the configured device
    pub fn tick(&self) -> TickReport {
        let flag = self.manager.auto_record();
        // A failed poll keeps the last reading so the next one still sees the edge
        let jack = match self.detector.poll() {
            Ok(state) => state,
            Err(e) => {
                let last = flag.last_jack();
                debug!(error = %e, keeping = %last, "Jack poll failed");
                last
            }
        };
        let previous = flag.record_jack(jack);
        if previous != jack {
            info!(from = %previous, to = %jack, "Jack state changed");
        }

        let mut actions = Vec::new();
        let config = self.config.get();
        let device_id = config.audio_device.as_str();
        let status = self.manager.status();
        let auto_active = status.is_active() && status.mode == Some(RecordingMode::Auto);

        if flag.is_enabled() {
            if !self.devices.is_valid(device_id) {
                self.disable_for_invalid_device(device_id, &mut actions);
            } else if jack.is_insertion_from(previous) && status.state == RecordingState::Idle {
                self.request_start(device_id, &mut actions);
            }
        }

        let stop_issued = actions.contains(&MonitorAction::StopRequested);
        if jack.is_removal_from(previous) && auto_active && !stop_issued {
            self.request_stop(&mut actions);
        }

        let started = actions
            .iter()
            .any(|a| matches!(a, MonitorAction::StartRequested { .. }));
        let next_interval = if started || self.manager.status().is_active() {
            self.active_interval
        } else {
            self.idle_interval
        };

        TickReport {
            jack,
            actions,
            next_interval,
        }
    }

    fn disable_for_invalid_device(&self, device_id: &str, actions: &mut Vec<MonitorAction>) {
        if !self.manager.auto_record().disable() {
            return;
        }
        warn!(device_id, "Configured device unavailable, auto-record disabled");
        actions.push(MonitorAction::AutoRecordDisabled {
            device_id: device_id.to_string(),
        });

        if let Err(e) = self.config.set_auto_record(false) {
            error!(error = %e, "Failed to persist auto-record setting");
        }
        if let Some(submission) = self.manager.stop_auto_session() {
            match submission.rejection() {
                None => actions.push(MonitorAction::StopRequested),
                Some(reason) => actions.push(MonitorAction::Refused(reason.to_string())),
            }
        }
    }

    fn request_start(&self, device_id: &str, actions: &mut Vec<MonitorAction>) {
        let submission = self.manager.start(RecordingMode::Auto, device_id);
        match submission.rejection() {
            None => {
                info!(device_id, "Jack inserted, starting auto recording");
                actions.push(MonitorAction::StartRequested {
                    device_id: device_id.to_string(),
                });
            }
            Some(reason) => {
                warn!(device_id, %reason, "Auto start refused");
                actions.push(MonitorAction::Refused(reason.to_string()));
            }
        }
    }

    fn request_stop(&self, actions: &mut Vec<MonitorAction>) {
        let submission = self.manager.stop();
        match submission.rejection() {
            None => {
                info!("Jack removed, stopping auto recording");
                actions.push(MonitorAction::StopRequested);
            }
            Some(reason) => {
                warn!(%reason, "Auto stop refused");
                actions.push(MonitorAction::Refused(reason.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::auto_record::AutoRecordFlag;
    use crate::application::command::CommandKind;
    use crate::application::manager::ManagerSettings;
    use crate::application::queue::Popped;
    use crate::application::test_support::{
        FakeConfigStore, FakeLauncher, FakeProber, FakeStorage, ScriptedJack,
    };
    use crate::application::worker::{RecordingWorker, WorkerPorts};
    use crate::domain::config::{AppConfig, ConfigSnapshot};
    use crate::domain::error::JackError;
    use crate::infrastructure::clock::ManualClock;
    use std::time::Instant;
    use tempfile::TempDir;

    struct Rig {
        monitor: AutoRecordMonitor,
        manager: Arc<RecordingManager>,
        worker: RecordingWorker,
        jack: Arc<ScriptedJack>,
        prober: Arc<FakeProber>,
        store: Arc<FakeConfigStore>,
        clock: Arc<ManualClock>,
        _dir: TempDir,
    }

    fn rig(readings: Vec<Result<JackState, JackError>>) -> Rig {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new());
        let prober = Arc::new(FakeProber::valid());
        let devices = Arc::new(DeviceValidationCache::new(
            prober.clone(),
            clock.clone(),
            Duration::from_secs(5),
        ));
        let store = Arc::new(FakeConfigStore::with(AppConfig {
            audio_device: Some("dev0".to_string()),
            ..Default::default()
        }));
        let config = Arc::new(ConfigCache::new(
            store.clone(),
            clock.clone(),
            Duration::from_millis(500),
        ));
        let mut snapshot = ConfigSnapshot::default();
        snapshot.recording_dir = dir.path().to_path_buf();
        let (manager, worker) = RecordingManager::new(
            WorkerPorts {
                launcher: Arc::new(FakeLauncher::new()),
                devices: devices.clone(),
                storage: Arc::new(FakeStorage::plenty()),
                clock: clock.clone(),
            },
            Arc::new(AutoRecordFlag::new(true)),
            ManagerSettings::from_config(&snapshot),
        );
        let manager = Arc::new(manager);
        let jack = Arc::new(ScriptedJack::new(readings));
        let monitor = AutoRecordMonitor::new(
            manager.clone(),
            jack.clone(),
            devices,
            config,
            Duration::from_millis(300),
            Duration::from_secs(2),
        );
        Rig {
            monitor,
            manager,
            worker,
            jack,
            prober,
            store,
            clock,
            _dir: dir,
        }
    }

    fn drain(rig: &mut Rig) {
        while let Popped::Command(command) =
            rig.manager.queue().pop_timeout(Duration::from_millis(1))
        {
            let _ = rig.worker.handle(command);
        }
    }

    #[test]
    fn insertion_queues_auto_start_and_shortens_interval() {
        let rig = rig(vec![Ok(JackState::Absent), Ok(JackState::Present)]);

        let first = rig.monitor.tick();
        assert!(first.actions.is_empty());
        assert_eq!(first.next_interval, Duration::from_secs(2));

        let second = rig.monitor.tick();
        assert_eq!(
            second.actions,
            vec![MonitorAction::StartRequested {
                device_id: "dev0".to_string()
            }]
        );
        assert!(second.next_interval <= Duration::from_millis(300));
        assert_eq!(
            rig.manager.pending_commands(),
            vec![CommandKind::Start {
                mode: RecordingMode::Auto,
                device_id: "dev0".to_string()
            }]
        );
    }

    #[test]
    fn unknown_to_present_is_not_an_insertion() {
        let rig = rig(vec![Ok(JackState::Present)]);
        let report = rig.monitor.tick();
        assert!(report.actions.is_empty());
        assert!(rig.manager.pending_commands().is_empty());
    }

    #[test]
    fn detector_failure_keeps_last_reading() {
        let rig = rig(vec![
            Ok(JackState::Absent),
            Err(JackError::CommandFailed("boom".to_string())),
        ]);
        rig.monitor.tick();
        let report = rig.monitor.tick();
        assert_eq!(report.jack, JackState::Absent);
        assert!(report.actions.is_empty());
        assert_eq!(rig.manager.auto_record().last_jack(), JackState::Absent);
    }

    #[test]
    fn insertion_survives_a_failed_poll() {
        let rig = rig(vec![
            Ok(JackState::Absent),
            Err(JackError::CommandFailed("timed out".to_string())),
            Ok(JackState::Present),
        ]);
        rig.monitor.tick();
        rig.monitor.tick();
        let report = rig.monitor.tick();
        assert_eq!(
            report.actions,
            vec![MonitorAction::StartRequested {
                device_id: "dev0".to_string()
            }]
        );
    }

    #[test]
    fn removal_survives_a_failed_poll() {
        let mut rig = rig(vec![Ok(JackState::Absent), Ok(JackState::Present)]);
        rig.monitor.tick();
        rig.monitor.tick();
        drain(&mut rig);
        assert!(rig.manager.status().is_active());

        rig.jack
            .push(Err(JackError::CommandFailed("timed out".to_string())));
        assert!(rig.monitor.tick().actions.is_empty());

        rig.jack.push(Ok(JackState::Absent));
        let report = rig.monitor.tick();
        assert_eq!(report.actions, vec![MonitorAction::StopRequested]);
        assert_eq!(rig.manager.pending_commands(), vec![CommandKind::Stop]);
    }

    #[test]
    fn removal_stops_auto_session() {
        let mut rig = rig(vec![Ok(JackState::Absent), Ok(JackState::Present)]);
        rig.monitor.tick();
        rig.monitor.tick();
        drain(&mut rig);
        assert!(rig.manager.status().is_active());

        rig.jack.push(Ok(JackState::Absent));
        let report = rig.monitor.tick();
        assert_eq!(report.actions, vec![MonitorAction::StopRequested]);
        assert_eq!(rig.manager.pending_commands(), vec![CommandKind::Stop]);
    }

    #[test]
    fn removal_leaves_manual_session() {
        let mut rig = rig(vec![Ok(JackState::Present)]);
        rig.monitor.tick();
        rig.manager.start(RecordingMode::Manual, "dev0");
        drain(&mut rig);

        rig.jack.push(Ok(JackState::Absent));
        assert!(rig.monitor.tick().actions.is_empty());
        assert!(rig.manager.pending_commands().is_empty());
    }

    #[test]
    fn invalid_device_disables_flag_and_persists() {
        let rig = rig(vec![Ok(JackState::Absent)]);
        rig.prober.set(Ok(false));

        let report = rig.monitor.tick();

        assert_eq!(
            report.actions,
            vec![MonitorAction::AutoRecordDisabled {
                device_id: "dev0".to_string()
            }]
        );
        assert!(!rig.manager.auto_record().is_enabled());
        let saved = rig.store.saved.lock().last().cloned().unwrap();
        assert_eq!(saved.auto_record, Some(false));
    }

    #[test]
    fn flag_is_never_rearmed_automatically() {
        let rig = rig(vec![Ok(JackState::Absent)]);
        rig.prober.set(Ok(false));
        rig.monitor.tick();

        rig.prober.set(Ok(true));
        rig.clock.advance(Duration::from_secs(10));
        rig.jack.push(Ok(JackState::Present));
        let report = rig.monitor.tick();

        assert!(report.actions.is_empty());
        assert!(!rig.manager.auto_record().is_enabled());
    }

    #[test]
    fn cancel_wakes_waiting_loop() {
        let rig = rig(vec![Ok(JackState::Absent)]);
        let token = rig.monitor.cancel_token();
        let monitor = Arc::new(rig.monitor);
        let handle = Arc::clone(&monitor).spawn().unwrap();

        let begun = Instant::now();
        token.cancel();
        handle.join().unwrap();
        assert!(begun.elapsed() < Duration::from_secs(2));
    }
}
