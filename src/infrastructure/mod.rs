//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like `arecord`, the filesystem
//! and jack-sense sources.

pub mod clock;
pub mod config;
pub mod device;
pub mod jack;
pub mod process;
pub mod recording;
pub mod storage;

// Re-export adapters
pub use clock::{ManualClock, SystemClock};
pub use config::XdgConfigStore;
pub use device::AlsaDeviceProber;
pub use jack::{create_jack_detector, CommandJackDetector, FileJackDetector, NoJackDetector};
pub use recording::ArecordLauncher;
pub use storage::StatvfsProbe;
