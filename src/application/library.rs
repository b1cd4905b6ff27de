//! Saved recordings on disk

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDateTime;
use tracing::info;

use crate::domain::error::LibraryError;
use crate::domain::recording::artifact::{FILE_EXTENSION, FILE_PREFIX};
use crate::domain::recording::{ArtifactName, ArtifactStatus, Elapsed};

/// One file in the recording directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingEntry {
    pub path: PathBuf,
    pub name: String,
    pub started: Option<NaiveDateTime>,
    pub duration: Option<Elapsed>,
    /// False for crash-finalized and still-running captures
    pub complete: bool,
    pub size_bytes: u64,
    modified: Option<SystemTime>,
}

pub struct RecordingLibrary {
    dir: PathBuf,
}

impl RecordingLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Recordings newest first. A missing directory is an empty library.
    pub fn list(&self) -> Result<Vec<RecordingEntry>, LibraryError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LibraryError::ReadFailed(e.to_string())),
        };

        let mut entries: Vec<RecordingEntry> = read_dir
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if !is_recording_file(&name) {
                    return None;
                }
                let meta = entry.metadata().ok().filter(|m| m.is_file())?;
                Some(Self::entry(entry.path(), name, &meta))
            })
            .collect();

        // Parsed start time first (newest first), then unparseable names by mtime
        entries.sort_by(|a, b| match (a.started, b.started) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.modified.cmp(&a.modified),
        });
        Ok(entries)
    }

    /// Remove one finished recording by file name
    pub fn delete(&self, name: &str) -> Result<PathBuf, LibraryError> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name == "."
            || name == ".."
            || !is_recording_file(name)
        {
            return Err(LibraryError::InvalidName(name.to_string()));
        }

        // The live capture is still writing to it; it gets renamed when it ends
        let parsed = ArtifactName::parse(name);
        if parsed.is_some_and(|p| p.status == ArtifactStatus::InProgress) {
            return Err(LibraryError::InProgress(name.to_string()));
        }

        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(LibraryError::NotFound(name.to_string()));
        }
        fs::remove_file(&path).map_err(|e| LibraryError::DeleteFailed(e.to_string()))?;
        info!(path = %path.display(), "Recording deleted");
        Ok(path)
    }

    fn entry(path: PathBuf, name: String, meta: &fs::Metadata) -> RecordingEntry {
        let parsed = ArtifactName::parse(&name);
        RecordingEntry {
            path,
            started: parsed.map(|p| p.started),
            duration: parsed.and_then(|p| p.elapsed()),
            complete: matches!(parsed.map(|p| p.status), Some(ArtifactStatus::Complete(_))),
            size_bytes: meta.len(),
            modified: meta.modified().ok(),
            name,
        }
    }
}

impl RecordingEntry {
    /// Human-readable length, `-` when unknown
    pub fn duration_label(&self) -> String {
        self.duration
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

fn is_recording_file(name: &str) -> bool {
    name.starts_with(FILE_PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == FILE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str, bytes: usize) {
        fs::write(dir.join(name), vec![0u8; bytes]).unwrap();
    }

    #[test]
    fn missing_dir_is_empty() {
        let library = RecordingLibrary::new("/nonexistent/picorder/recordings");
        assert!(library.list().unwrap().is_empty());
    }

    #[test]
    fn lists_newest_first_and_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "recording_20240101_120000_05m32s.wav", 10);
        touch(dir.path(), "recording_20240102_090000_00m07s_incomplete.wav", 5);
        touch(dir.path(), "notes.txt", 1);
        touch(dir.path(), "recording_odd.wav", 1);

        let entries = RecordingLibrary::new(dir.path()).list().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "recording_20240102_090000_00m07s_incomplete.wav",
                "recording_20240101_120000_05m32s.wav",
                "recording_odd.wav",
            ]
        );
        assert!(!entries[0].complete);
        assert!(entries[1].complete);
        assert_eq!(entries[1].duration, Some(Elapsed::from_secs(332)));
        assert_eq!(entries[1].size_bytes, 10);
        assert_eq!(entries[2].duration_label(), "-");
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "recording_20240101_120000_05m32s.wav", 10);
        let library = RecordingLibrary::new(dir.path());

        library.delete("recording_20240101_120000_05m32s.wav").unwrap();
        assert!(library.list().unwrap().is_empty());
    }

    #[test]
    fn delete_rejects_paths() {
        let library = RecordingLibrary::new("/tmp");
        assert!(matches!(
            library.delete("../recording_x.wav"),
            Err(LibraryError::InvalidName(_))
        ));
        assert!(matches!(
            library.delete("passwd"),
            Err(LibraryError::InvalidName(_))
        ));
    }

    #[test]
    fn delete_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let library = RecordingLibrary::new(dir.path());
        assert!(matches!(
            library.delete("recording_20240101_120000_00m05s.wav"),
            Err(LibraryError::NotFound(_))
        ));
    }

    #[test]
    fn delete_refuses_capture_in_progress() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "recording_20240101_120000.wav", 10);
        let library = RecordingLibrary::new(dir.path());

        assert_eq!(
            library.delete("recording_20240101_120000.wav"),
            Err(LibraryError::InProgress(
                "recording_20240101_120000.wav".to_string()
            ))
        );
        assert!(dir.path().join("recording_20240101_120000.wav").exists());
    }
}
