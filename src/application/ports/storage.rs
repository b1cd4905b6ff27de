//! Storage port interface

use std::path::Path;

use crate::domain::error::StorageError;

/// Port for querying free space on the recording filesystem
pub trait StorageProbe: Send + Sync {
    /// Bytes available to unprivileged writers at `path`
    fn free_bytes(&self, path: &Path) -> Result<u64, StorageError>;
}
