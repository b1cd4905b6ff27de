//! Application layer - Recording coordination and port interfaces
//!
//! Contains the command queue, the worker that owns the capture child,
//! the manager façade, the auto-record monitor and the TTL caches, plus
//! trait definitions for external system interactions.

pub mod auto_record;
pub mod command;
pub mod config_cache;
pub mod device_cache;
pub mod library;
pub mod manager;
pub mod monitor;
pub mod ports;
pub mod process_guard;
pub mod queue;
mod shared;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export coordinator types
pub use auto_record::AutoRecordFlag;
pub use command::{Command, CommandKind, CommandOutcome, Receipt, RejectReason, Submission};
pub use config_cache::ConfigCache;
pub use device_cache::DeviceValidationCache;
pub use library::{RecordingEntry, RecordingLibrary};
pub use manager::{ManagerSettings, RecordingManager};
pub use monitor::{AutoRecordMonitor, CancelToken, MonitorAction, TickReport};
pub use process_guard::ProcessGuard;
pub use queue::{CommandQueue, Popped};
pub use shared::HISTORY_LIMIT;
pub use worker::{RecordingWorker, WorkerPorts, WorkerSettings};
