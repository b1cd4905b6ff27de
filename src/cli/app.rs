//! Shared CLI plumbing: exit codes, logging setup and config loading

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, ConfigSnapshot};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

const DEFAULT_LOG_FILTER: &str = "picorder=info";

/// Install the tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // A second install (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Defaults merged with the config file; an unreadable file falls back to defaults
pub fn load_snapshot(store: &dyn ConfigStore) -> ConfigSnapshot {
    let file = store.load().unwrap_or_else(|e| {
        warn!(path = %store.path().display(), error = %e, "Using default config");
        AppConfig::empty()
    });
    AppConfig::defaults().merge(file).snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::XdgConfigStore;

    #[test]
    fn snapshot_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("missing.toml"));
        assert_eq!(load_snapshot(&store), ConfigSnapshot::default());
    }

    #[test]
    fn snapshot_applies_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "audio_device = \"plughw:3,0\"\nauto_record = false\n").unwrap();

        let snapshot = load_snapshot(&XdgConfigStore::with_path(path));
        assert_eq!(snapshot.audio_device, "plughw:3,0");
        assert!(!snapshot.auto_record);
    }
}
