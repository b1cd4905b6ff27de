//! TTL-guarded read-through cache over the config store
//!
//! The UI and the monitor both read configuration many times per second.
//! Reads inside the TTL window are answered from memory; storage is
//! consulted at most once per window unless a reload is forced.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::application::ports::{Clock, ConfigStore};
use crate::domain::config::{AppConfig, ConfigSnapshot};
use crate::domain::error::ConfigError;

struct CacheEntry {
    value: ConfigSnapshot,
    fetched_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entry: Option<CacheEntry>,
    last_good: Option<ConfigSnapshot>,
    last_error: Option<ConfigError>,
}

pub struct ConfigCache {
    store: Arc<dyn ConfigStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    state: Mutex<CacheState>,
    /// Serializes storage reads so concurrent misses collapse into one
    reload: Mutex<()>,
}

impl ConfigCache {
    pub fn new(store: Arc<dyn ConfigStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            state: Mutex::new(CacheState::default()),
            reload: Mutex::new(()),
        }
    }

    /// Current snapshot. Never fails: on a storage error the last good
    /// snapshot is returned, or the defaults if there never was one.
    pub fn get(&self) -> ConfigSnapshot {
        self.read(false)
    }

    /// Re-read storage regardless of freshness
    pub fn reload(&self) -> ConfigSnapshot {
        self.read(true)
    }

    pub fn read(&self, force_reload: bool) -> ConfigSnapshot {
        if !force_reload {
            if let Some(value) = self.fresh() {
                return value;
            }
        }

        let _reload = self.reload.lock();

        // Another thread may have refreshed while we waited
        if !force_reload {
            if let Some(value) = self.fresh() {
                return value;
            }
        }

        let result = self.load_snapshot();
        let fetched_at = self.clock.now();

        let mut state = self.state.lock();
        let value = match result {
            Ok(value) => {
                debug!(device = %value.audio_device, auto_record = value.auto_record, "Config loaded");
                state.last_good = Some(value.clone());
                state.last_error = None;
                value
            }
            Err(e) => {
                let fallback = state.last_good.clone().unwrap_or_default();
                warn!(error = %e, "Config unreadable, using fallback snapshot");
                state.last_error = Some(e);
                fallback
            }
        };
        state.entry = Some(CacheEntry {
            value: value.clone(),
            fetched_at,
        });
        value
    }

    /// Read-modify-write the persisted config, then drop the cached entry
    pub fn update<F>(&self, apply: F) -> Result<ConfigSnapshot, ConfigError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let _reload = self.reload.lock();

        let mut config = self.store.load()?;
        apply(&mut config);
        self.store.save(&config)?;
        info!(path = %self.store.path().display(), "Config saved");

        self.invalidate();
        Ok(AppConfig::defaults().merge(config).snapshot())
    }

    /// Persist the auto-record flag
    pub fn set_auto_record(&self, enabled: bool) -> Result<(), ConfigError> {
        self.update(|config| config.auto_record = Some(enabled))
            .map(|_| ())
    }

    pub fn invalidate(&self) {
        self.state.lock().entry = None;
    }

    /// Error from the most recent storage read, if it failed
    pub fn last_error(&self) -> Option<ConfigError> {
        self.state.lock().last_error.clone()
    }

    fn fresh(&self) -> Option<ConfigSnapshot> {
        let now = self.clock.now();
        let state = self.state.lock();
        state
            .entry
            .as_ref()
            .filter(|entry| now.saturating_duration_since(entry.fetched_at) < self.ttl)
            .map(|entry| entry.value.clone())
    }

    fn load_snapshot(&self) -> Result<ConfigSnapshot, ConfigError> {
        if !self.store.exists() {
            return Err(ConfigError::Missing(
                self.store.path().to_string_lossy().to_string(),
            ));
        }
        let config = self.store.load()?;
        Ok(AppConfig::defaults().merge(config).snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeConfigStore;
    use crate::infrastructure::clock::ManualClock;

    fn cache_with(config: AppConfig) -> (ConfigCache, Arc<FakeConfigStore>, Arc<ManualClock>) {
        let store = Arc::new(FakeConfigStore::with(config));
        let clock = Arc::new(ManualClock::new());
        let cache = ConfigCache::new(store.clone(), clock.clone(), Duration::from_millis(500));
        (cache, store, clock)
    }

    fn device(id: &str) -> AppConfig {
        AppConfig {
            audio_device: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn reads_within_ttl_hit_memory() {
        let (cache, store, clock) = cache_with(device("plughw:1,0"));

        let first = cache.get();
        clock.advance(Duration::from_millis(400));
        let second = cache.get();

        assert_eq!(first, second);
        assert_eq!(store.loads(), 1);
    }

    #[test]
    fn read_after_ttl_refreshes() {
        let (cache, store, clock) = cache_with(device("plughw:1,0"));

        cache.get();
        store.set(Ok(device("plughw:2,0")));
        clock.advance(Duration::from_millis(600));

        assert_eq!(cache.get().audio_device, "plughw:2,0");
        assert_eq!(store.loads(), 2);
    }

    #[test]
    fn force_reload_always_reads() {
        let (cache, store, _clock) = cache_with(device("plughw:1,0"));

        cache.get();
        store.set(Ok(device("plughw:2,0")));

        assert_eq!(cache.reload().audio_device, "plughw:2,0");
        assert_eq!(store.loads(), 2);
    }

    #[test]
    fn failure_keeps_last_good() {
        let (cache, store, clock) = cache_with(device("plughw:1,0"));

        cache.get();
        store.set(Err(ConfigError::ParseError("bad toml".to_string())));
        clock.advance(Duration::from_secs(1));

        let snapshot = cache.get();
        assert_eq!(snapshot.audio_device, "plughw:1,0");
        assert!(matches!(cache.last_error(), Some(ConfigError::ParseError(_))));
    }

    #[test]
    fn failure_without_history_uses_defaults() {
        let (cache, store, _clock) = cache_with(AppConfig::empty());
        store.set(Err(ConfigError::ReadError("denied".to_string())));

        assert_eq!(cache.get(), ConfigSnapshot::default());
        assert!(cache.last_error().is_some());
    }

    #[test]
    fn failed_read_is_cached_for_the_window() {
        let (cache, store, _clock) = cache_with(AppConfig::empty());
        store.set(Err(ConfigError::ReadError("denied".to_string())));

        cache.get();
        cache.get();
        assert_eq!(store.loads(), 1);
    }

    #[test]
    fn success_clears_error() {
        let (cache, store, _clock) = cache_with(AppConfig::empty());
        store.set(Err(ConfigError::ReadError("denied".to_string())));
        cache.get();

        store.set(Ok(AppConfig::empty()));
        cache.reload();
        assert!(cache.last_error().is_none());
    }

    #[test]
    fn update_persists_and_invalidates() {
        let (cache, store, _clock) = cache_with(device("plughw:1,0"));
        assert!(cache.get().auto_record);

        cache.set_auto_record(false).unwrap();

        let saved = store.saved.lock().last().cloned().unwrap();
        assert_eq!(saved.auto_record, Some(false));
        assert_eq!(saved.audio_device, Some("plughw:1,0".to_string()));
        assert!(!cache.get().auto_record);
    }
}
