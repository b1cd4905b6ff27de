//! Configuration domain module

pub mod app_config;
pub mod timings;

pub use app_config::{AppConfig, ConfigSnapshot, JackSource};
pub use timings::{Timings, TimingsConfig};
