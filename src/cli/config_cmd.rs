//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, TimingsConfig};
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub fn handle_config_command(
    action: ConfigAction,
    store: &dyn ConfigStore,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => {
            store.init()?;
            presenter.success(&format!(
                "Config file created at: {}",
                store.path().display()
            ));
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            check_key(&key)?;
            let mut config = store.load()?;
            set_value(&mut config, &key, &value)?;
            store.save(&config)?;
            presenter.success(&format!("{} = {}", key, value));
            Ok(())
        }
        ConfigAction::Get { key } => {
            check_key(&key)?;
            let config = store.load()?;
            presenter.output(get_value(&config, &key).as_deref().unwrap_or(NOT_SET));
            Ok(())
        }
        ConfigAction::List => {
            let config = store.load()?;
            for key in VALID_CONFIG_KEYS {
                presenter.key_value(key, get_value(&config, key).as_deref().unwrap_or(NOT_SET));
            }
            Ok(())
        }
        ConfigAction::Path => {
            presenter.output(&store.path().to_string_lossy());
            Ok(())
        }
    }
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

/// Read one key from a file-level config
pub fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    if let Some(field) = key.strip_prefix("timings.") {
        let timings = config.timings.as_ref()?;
        return timing_field(timings, field).map(|v| v.to_string());
    }

    match key {
        "audio_device" => config.audio_device.clone(),
        "auto_record" => config.auto_record.map(|b| b.to_string()),
        "recording_dir" => config.recording_dir.clone(),
        "capture_command" => config.capture_command.clone(),
        "jack_command" => config.jack_command.clone(),
        "jack_file" => config.jack_file.clone(),
        "min_free_mb" => config.min_free_mb.map(|n| n.to_string()),
        "screen_timeout" => config.screen_timeout.map(|n| n.to_string()),
        _ => None,
    }
}

/// Validate and write one key into a file-level config
pub fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    if let Some(field) = key.strip_prefix("timings.") {
        let number = parse_number(key, value)?;
        let timings = config.timings.get_or_insert_with(TimingsConfig::default);
        return set_timing_field(timings, field, number).ok_or_else(|| unknown(key));
    }

    match key {
        "audio_device" => config.audio_device = Some(value.trim().to_string()),
        "auto_record" => {
            config.auto_record = Some(parse_bool(value).ok_or_else(|| {
                ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must be 'true' or 'false'".to_string(),
                }
            })?)
        }
        "recording_dir" => config.recording_dir = Some(non_empty(key, value)?),
        "capture_command" => config.capture_command = Some(non_empty(key, value)?),
        "jack_command" => config.jack_command = Some(value.to_string()),
        "jack_file" => config.jack_file = Some(value.to_string()),
        "min_free_mb" => config.min_free_mb = Some(parse_number(key, value)?),
        "screen_timeout" => config.screen_timeout = Some(parse_number(key, value)?),
        _ => return Err(unknown(key)),
    }
    Ok(())
}

fn timing_field(t: &TimingsConfig, field: &str) -> Option<u64> {
    match field {
        "config_ttl" => t.config_ttl,
        "device_ttl" => t.device_ttl,
        "monitor_active_interval" => t.monitor_active_interval,
        "monitor_idle_interval" => t.monitor_idle_interval,
        "start_grace" => t.start_grace,
        "stop_grace" => t.stop_grace,
        "supervise_interval" => t.supervise_interval,
        "shutdown_timeout" => t.shutdown_timeout,
        "probe_timeout" => t.probe_timeout,
        "queue_capacity" => t.queue_capacity.map(|n| n as u64),
        _ => None,
    }
}

fn set_timing_field(t: &mut TimingsConfig, field: &str, value: u64) -> Option<()> {
    let slot = match field {
        "config_ttl" => &mut t.config_ttl,
        "device_ttl" => &mut t.device_ttl,
        "monitor_active_interval" => &mut t.monitor_active_interval,
        "monitor_idle_interval" => &mut t.monitor_idle_interval,
        "start_grace" => &mut t.start_grace,
        "stop_grace" => &mut t.stop_grace,
        "supervise_interval" => &mut t.supervise_interval,
        "shutdown_timeout" => &mut t.shutdown_timeout,
        "probe_timeout" => &mut t.probe_timeout,
        "queue_capacity" => {
            t.queue_capacity = Some(value as usize);
            return Some(());
        }
        _ => return None,
    };
    *slot = Some(value);
    Some(())
}

fn unknown(key: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: "Unknown key".to_string(),
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: "Value must not be empty".to_string(),
        });
    }
    Ok(value.to_string())
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::ValidationError {
            key: key.to_string(),
            message: "Value must be a non-negative integer".to_string(),
        })
}

/// Parse a boolean value
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn set_then_get_plain_keys() {
        let mut config = AppConfig::empty();
        set_value(&mut config, "audio_device", " plughw:1,0 ").unwrap();
        set_value(&mut config, "auto_record", "no").unwrap();
        set_value(&mut config, "min_free_mb", "250").unwrap();

        assert_eq!(get_value(&config, "audio_device").as_deref(), Some("plughw:1,0"));
        assert_eq!(get_value(&config, "auto_record").as_deref(), Some("false"));
        assert_eq!(get_value(&config, "min_free_mb").as_deref(), Some("250"));
        assert_eq!(get_value(&config, "jack_file"), None);
    }

    #[test]
    fn empty_device_is_allowed() {
        let mut config = AppConfig::empty();
        set_value(&mut config, "audio_device", "").unwrap();
        assert_eq!(config.audio_device.as_deref(), Some(""));
    }

    #[test]
    fn timing_keys_create_table() {
        let mut config = AppConfig::empty();
        set_value(&mut config, "timings.device_ttl", "1500").unwrap();
        set_value(&mut config, "timings.queue_capacity", "8").unwrap();

        assert_eq!(get_value(&config, "timings.device_ttl").as_deref(), Some("1500"));
        assert_eq!(get_value(&config, "timings.queue_capacity").as_deref(), Some("8"));
        assert_eq!(get_value(&config, "timings.stop_grace"), None);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = AppConfig::empty();
        assert!(set_value(&mut config, "auto_record", "maybe").is_err());
        assert!(set_value(&mut config, "min_free_mb", "-1").is_err());
        assert!(set_value(&mut config, "recording_dir", "  ").is_err());
        assert!(set_value(&mut config, "timings.bogus", "1").is_err());
    }

    #[test]
    fn every_listed_key_is_settable() {
        let mut config = AppConfig::empty();
        for key in VALID_CONFIG_KEYS {
            let value = match *key {
                "auto_record" => "true",
                k if k.starts_with("timings.") || k.ends_with("_mb") || k == "screen_timeout" => {
                    "5"
                }
                _ => "x",
            };
            set_value(&mut config, key, value).unwrap();
            assert!(get_value(&config, key).is_some(), "{} not readable", key);
        }
    }
}
