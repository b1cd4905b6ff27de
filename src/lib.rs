//! Picorder - jack-triggered audio recording coordinator
//!
//! This crate coordinates an external capture utility (`arecord`) for a
//! small touchscreen recorder: manual start/stop, automatic recording
//! when an input jack is inserted, and a thread-safe status view for the
//! UI.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Recording states, artifact naming, config values and errors
//! - **Application**: Command queue, worker, manager, monitor, TTL caches and port traits
//! - **Infrastructure**: Adapter implementations (arecord, ALSA probing, jack sources, statvfs)
//! - **CLI**: Daemon runner, control socket, argument parsing and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
