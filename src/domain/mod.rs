//! Domain layer - Core recording values
//!
//! Contains value objects, the recording state machine, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod recording;

// Re-export common types
pub use config::{AppConfig, ConfigSnapshot, JackSource, Timings};
pub use error::*;
pub use recording::{
    ArtifactName, Elapsed, JackState, RecordingMode, RecordingState, RecordingStatus,
    TransitionRecord,
};
