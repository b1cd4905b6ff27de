//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod clock;
pub mod config;
pub mod device;
pub mod jack;
pub mod storage;

// Re-export common types
pub use capture::{CaptureLauncher, CaptureProcess, ExitOutcome};
pub use clock::Clock;
pub use config::ConfigStore;
pub use device::{AudioDevice, DeviceProber};
pub use jack::JackDetector;
pub use storage::StorageProbe;
