//! Placeholder store used when no filesystem is configured.

use std::path::Path;

use super::{DirEntry, Lookup, Metadata, Reader, Store, StoreError, StoreResult};

/// A store that fails every operation with [`StoreError::Unconfigured`].
///
/// Reads fail too; an unconfigured namespace never pretends a file is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl Store for Unconfigured {
    fn stat(&self, _path: &Path) -> Lookup<Metadata> {
        Lookup::Failed(StoreError::Unconfigured)
    }

    fn open_read(&self, _path: &Path) -> Lookup<Reader> {
        Lookup::Failed(StoreError::Unconfigured)
    }

    fn read_dir(&self, _path: &Path) -> Lookup<Vec<DirEntry>> {
        Lookup::Failed(StoreError::Unconfigured)
    }

    fn write(&self, _path: &Path, _data: &[u8]) -> StoreResult<()> {
        Err(StoreError::Unconfigured)
    }

    fn remove(&self, _path: &Path) -> StoreResult<()> {
        Err(StoreError::Unconfigured)
    }

    fn create_dir_all(&self, _path: &Path) -> StoreResult<()> {
        Err(StoreError::Unconfigured)
    }

    fn rename(&self, _from: &Path, _to: &Path) -> StoreResult<()> {
        Err(StoreError::Unconfigured)
    }
}
