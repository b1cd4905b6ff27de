//! Process-wide auto-record flag

use parking_lot::Mutex;
use tracing::info;

use crate::domain::recording::JackState;

#[derive(Debug)]
struct FlagState {
    enabled: bool,
    last_jack: JackState,
}

/// Whether jack insertion may start a recording, plus the last jack reading.
/// Re-enabling is always an explicit user action.
#[derive(Debug)]
pub struct AutoRecordFlag {
    inner: Mutex<FlagState>,
}

impl AutoRecordFlag {
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: Mutex::new(FlagState {
                enabled,
                last_jack: JackState::Unknown,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    pub fn enable(&self) {
        let mut inner = self.inner.lock();
        if !inner.enabled {
            info!("Auto-record enabled");
        }
        inner.enabled = true;
    }

    /// Returns true if the flag was set
    pub fn disable(&self) -> bool {
        let mut inner = self.inner.lock();
        let was = inner.enabled;
        if was {
            info!("Auto-record disabled");
        }
        inner.enabled = false;
        was
    }

    pub fn last_jack(&self) -> JackState {
        self.inner.lock().last_jack
    }

    /// Store a new jack reading, returning the previous one
    pub fn record_jack(&self, state: JackState) -> JackState {
        std::mem::replace(&mut self.inner.lock().last_jack, state)
    }
}

impl Default for AutoRecordFlag {
    fn default() -> Self {
        Self::new(true)
    }
}
