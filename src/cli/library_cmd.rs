//! `devices` and `library` command handlers

use crate::application::ports::DeviceProber;
use crate::application::RecordingLibrary;
use crate::domain::config::ConfigSnapshot;
use crate::infrastructure::AlsaDeviceProber;

use super::args::LibraryAction;
use super::presenter::Presenter;

/// List capture devices, marking the configured one
pub fn handle_devices_command(
    config: &ConfigSnapshot,
    presenter: &Presenter,
) -> Result<(), String> {
    let prober = AlsaDeviceProber::new(config.capture_command.clone(), config.timings.probe_timeout);
    let devices = prober.list_devices().map_err(|e| e.to_string())?;
    presenter.devices(&devices, &config.audio_device);
    if !config.has_device() {
        presenter.warn("No device configured. Set one with: picorder config set audio_device <ID>");
    }
    Ok(())
}

/// Handle library subcommand (defaults to `list`)
pub fn handle_library_command(
    action: Option<LibraryAction>,
    config: &ConfigSnapshot,
    presenter: &Presenter,
) -> Result<(), String> {
    let library = RecordingLibrary::new(config.recording_dir.clone());

    match action.unwrap_or(LibraryAction::List) {
        LibraryAction::List => {
            let entries = library.list().map_err(|e| e.to_string())?;
            presenter.recordings(&entries);
        }
        LibraryAction::Delete { name } => {
            let path = library.delete(&name).map_err(|e| e.to_string())?;
            presenter.success(&format!("Deleted {}", path.display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> ConfigSnapshot {
        ConfigSnapshot {
            recording_dir: dir.to_path_buf(),
            ..ConfigSnapshot::default()
        }
    }

    #[test]
    fn delete_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = handle_library_command(
            Some(LibraryAction::Delete {
                name: "recording_20240101_120000.wav".to_string(),
            }),
            &config_in(dir.path()),
            &Presenter::new(),
        )
        .unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn delete_removes_recording() {
        let dir = tempfile::tempdir().unwrap();
        let name = "recording_20240101_120000_00m05s.wav";
        std::fs::write(dir.path().join(name), b"RIFF").unwrap();

        handle_library_command(
            Some(LibraryAction::Delete {
                name: name.to_string(),
            }),
            &config_in(dir.path()),
            &Presenter::new(),
        )
        .unwrap();
        assert!(!dir.path().join(name).exists());
    }
}
