//! Capture infrastructure module
//!
//! Recording runs in an external `arecord` child writing WAV straight
//! to the recording directory.

mod arecord;

pub use arecord::{ArecordLauncher, ArecordProcess};
