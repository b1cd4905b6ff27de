//! Audio device adapters

mod alsa;

pub use alsa::AlsaDeviceProber;
