//! In-memory port implementations for unit tests

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::application::ports::{
    AudioDevice, CaptureLauncher, CaptureProcess, ConfigStore, DeviceProber, ExitOutcome,
    JackDetector, StorageProbe,
};
use crate::domain::config::AppConfig;
use crate::domain::error::{ConfigError, DeviceError, JackError, ProcessError, StorageError};
use crate::domain::recording::JackState;

pub struct FakeConfigStore {
    pub config: Mutex<Result<AppConfig, ConfigError>>,
    pub saved: Mutex<Vec<AppConfig>>,
    pub loads: AtomicUsize,
}

impl FakeConfigStore {
    pub fn with(config: AppConfig) -> Self {
        Self {
            config: Mutex::new(Ok(config)),
            saved: Mutex::new(Vec::new()),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, config: Result<AppConfig, ConfigError>) {
        *self.config.lock() = config;
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ConfigStore for FakeConfigStore {
    fn load(&self) -> Result<AppConfig, ConfigError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.config.lock().clone()
    }

    fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.saved.lock().push(config.clone());
        *self.config.lock() = Ok(config.clone());
        Ok(())
    }

    fn path(&self) -> PathBuf {
        PathBuf::from("/fake/config.toml")
    }

    fn exists(&self) -> bool {
        true
    }
}

pub struct FakeProber {
    pub valid: Mutex<Result<bool, DeviceError>>,
    pub probes: AtomicUsize,
}

impl FakeProber {
    pub fn valid() -> Self {
        Self {
            valid: Mutex::new(Ok(true)),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, valid: Result<bool, DeviceError>) {
        *self.valid.lock() = valid;
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl DeviceProber for FakeProber {
    fn probe(&self, _device_id: &str) -> Result<bool, DeviceError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.valid.lock().clone()
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>, DeviceError> {
        Ok(vec![AudioDevice {
            id: "plughw:1,0".to_string(),
            name: "USB Audio".to_string(),
        }])
    }
}

/// Observable state of one fake child
#[derive(Debug, Default)]
pub struct FakeChild {
    pub exit: Option<ExitOutcome>,
    pub terminated: bool,
    pub killed: bool,
    /// Keep running after SIGTERM
    pub stubborn: bool,
}

pub struct FakeProcess {
    pid: u32,
    child: Arc<Mutex<FakeChild>>,
}

impl CaptureProcess for FakeProcess {
    fn id(&self) -> u32 {
        self.pid
    }

    fn try_wait(&mut self) -> Result<Option<ExitOutcome>, ProcessError> {
        Ok(self.child.lock().exit)
    }

    fn terminate(&mut self) -> Result<(), ProcessError> {
        let mut child = self.child.lock();
        child.terminated = true;
        if !child.stubborn && child.exit.is_none() {
            child.exit = Some(ExitOutcome::signal(15));
        }
        Ok(())
    }

    fn kill(&mut self) -> Result<(), ProcessError> {
        let mut child = self.child.lock();
        child.killed = true;
        if child.exit.is_none() {
            child.exit = Some(ExitOutcome::signal(9));
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<ExitOutcome, ProcessError> {
        let mut child = self.child.lock();
        Ok(*child.exit.get_or_insert(ExitOutcome::signal(9)))
    }
}

/// Launcher that writes `bytes` to the output file and hands out fake children
pub struct FakeLauncher {
    pub bytes: usize,
    pub fail_with: Mutex<Option<ProcessError>>,
    pub stubborn: bool,
    pub spawns: Mutex<Vec<(String, PathBuf)>>,
    pub children: Mutex<Vec<Arc<Mutex<FakeChild>>>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            bytes: 44,
            fail_with: Mutex::new(None),
            stubborn: false,
            spawns: Mutex::new(Vec::new()),
            children: Mutex::new(Vec::new()),
        }
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns.lock().len()
    }

    pub fn last_child(&self) -> Option<Arc<Mutex<FakeChild>>> {
        self.children.lock().last().cloned()
    }

    /// Make the most recent child exit on its own
    pub fn crash_last(&self, exit: ExitOutcome) {
        if let Some(child) = self.last_child() {
            child.lock().exit = Some(exit);
        }
    }
}

impl CaptureLauncher for FakeLauncher {
    fn spawn(
        &self,
        device_id: &str,
        output_path: &Path,
    ) -> Result<Box<dyn CaptureProcess>, ProcessError> {
        if let Some(err) = self.fail_with.lock().clone() {
            return Err(err);
        }
        fs::write(output_path, vec![0u8; self.bytes])
            .map_err(|e| ProcessError::SpawnFailed(e.to_string()))?;

        let child = Arc::new(Mutex::new(FakeChild {
            stubborn: self.stubborn,
            ..FakeChild::default()
        }));
        let mut spawns = self.spawns.lock();
        spawns.push((device_id.to_string(), output_path.to_path_buf()));
        self.children.lock().push(Arc::clone(&child));

        Ok(Box::new(FakeProcess {
            pid: 1000 + spawns.len() as u32,
            child,
        }))
    }
}

pub struct FakeStorage {
    pub free: Mutex<Result<u64, StorageError>>,
}

impl FakeStorage {
    pub fn plenty() -> Self {
        Self {
            free: Mutex::new(Ok(u64::MAX / 2)),
        }
    }

    pub fn with_free(bytes: u64) -> Self {
        Self {
            free: Mutex::new(Ok(bytes)),
        }
    }
}

impl StorageProbe for FakeStorage {
    fn free_bytes(&self, _path: &Path) -> Result<u64, StorageError> {
        self.free.lock().clone()
    }
}

/// Replays a scripted sequence, repeating the last reading
pub struct ScriptedJack {
    readings: Mutex<VecDeque<Result<JackState, JackError>>>,
    last: Mutex<Result<JackState, JackError>>,
}

impl ScriptedJack {
    pub fn new(readings: Vec<Result<JackState, JackError>>) -> Self {
        Self {
            readings: Mutex::new(readings.into()),
            last: Mutex::new(Ok(JackState::Unknown)),
        }
    }

    pub fn push(&self, reading: Result<JackState, JackError>) {
        self.readings.lock().push_back(reading);
    }
}

impl JackDetector for ScriptedJack {
    fn poll(&self) -> Result<JackState, JackError> {
        let mut last = self.last.lock();
        if let Some(next) = self.readings.lock().pop_front() {
            *last = next;
        }
        last.clone()
    }
}
