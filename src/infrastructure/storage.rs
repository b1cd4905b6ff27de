//! Free-space probe via statvfs

use std::path::Path;

use nix::sys::statvfs::statvfs;

use crate::application::ports::StorageProbe;
use crate::domain::error::StorageError;

#[derive(Debug, Default, Clone, Copy)]
pub struct StatvfsProbe;

impl StorageProbe for StatvfsProbe {
    fn free_bytes(&self, path: &Path) -> Result<u64, StorageError> {
        let stat = statvfs(path)
            .map_err(|e| StorageError::QueryFailed(format!("{}: {}", path.display(), e)))?;
        // f_bavail counts blocks of f_frsize available to unprivileged users
        Ok((stat.blocks_available() as u64).saturating_mul(stat.fragment_size() as u64))
    }
}
