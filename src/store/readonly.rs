//! Read-only store wrapper.

use std::path::Path;

use super::{DirEntry, Lookup, Metadata, Reader, Store, StoreError, StoreResult};

/// Wraps a store and rejects every mutating call with [`StoreError::ReadOnly`].
///
/// Reads are forwarded unchanged. The wrapped store's own write support
/// is irrelevant: nothing is forwarded.
#[derive(Debug, Clone)]
pub struct ReadOnly<S> {
    inner: S,
}

impl<S: Store> ReadOnly<S> {
    /// Wrap `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Access the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Store> Store for ReadOnly<S> {
    fn stat(&self, path: &Path) -> Lookup<Metadata> {
        self.inner.stat(path)
    }

    fn open_read(&self, path: &Path) -> Lookup<Reader> {
        self.inner.open_read(path)
    }

    fn read_dir(&self, path: &Path) -> Lookup<Vec<DirEntry>> {
        self.inner.read_dir(path)
    }

    fn write(&self, _path: &Path, _data: &[u8]) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }

    fn remove(&self, _path: &Path) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }

    fn create_dir_all(&self, _path: &Path) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }

    fn rename(&self, _from: &Path, _to: &Path) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }
}
