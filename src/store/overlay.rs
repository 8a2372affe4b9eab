//! Copy-on-write overlay of two stores.

use std::path::Path;

use tracing::trace;

use super::{DirEntry, Lookup, Metadata, Reader, SharedStore, Store, StoreError, StoreResult};

/// Two stores resolved upper-first.
///
/// Reads consult the upper store and fall through to the lower store only
/// when the upper reports [`Lookup::NotFound`]. A failure in the upper store
/// is returned as is.
///
/// Precedence is per path: a directory present in the upper store is listed
/// from the upper store alone, entries of the lower directory are not merged.
///
/// Writes land in the upper store. The lower store is never modified, so
/// removing or renaming a path that only the lower store has fails with
/// [`StoreError::LowerLayer`].
#[derive(Clone)]
pub struct Overlay {
    upper: SharedStore,
    lower: SharedStore,
}

impl Overlay {
    /// Compose `upper` over `lower`.
    pub fn new(upper: SharedStore, lower: SharedStore) -> Self {
        Self { upper, lower }
    }

    /// The store consulted first.
    pub fn upper(&self) -> &SharedStore {
        &self.upper
    }

    /// The fallback store.
    pub fn lower(&self) -> &SharedStore {
        &self.lower
    }

    fn fall_through<T>(
        &self,
        op: &str,
        path: &Path,
        f: impl Fn(&SharedStore) -> Lookup<T>,
    ) -> Lookup<T> {
        f(&self.upper).or_fallback(|| {
            trace!(op, path = %path.display(), "overlay: not in upper layer, trying lower");
            f(&self.lower)
        })
    }

    /// Make sure the parent of `path` exists in the upper store before writing.
    fn prepare_parent(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent()
            && self.upper.stat(parent).is_not_found()
        {
            self.upper.create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Require `path` to be in the upper store for a destructive operation.
    fn require_upper(&self, path: &Path) -> StoreResult<()> {
        if self.upper.exists(path)? {
            return Ok(());
        }
        if self.lower.exists(path)? {
            Err(StoreError::LowerLayer(path.to_path_buf()))
        } else {
            Err(StoreError::NotFound(path.to_path_buf()))
        }
    }
}

impl std::fmt::Debug for Overlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overlay").finish_non_exhaustive()
    }
}

impl Store for Overlay {
    fn stat(&self, path: &Path) -> Lookup<Metadata> {
        self.fall_through("stat", path, |store| store.stat(path))
    }

    fn open_read(&self, path: &Path) -> Lookup<Reader> {
        self.fall_through("open_read", path, |store| store.open_read(path))
    }

    fn read_dir(&self, path: &Path) -> Lookup<Vec<DirEntry>> {
        self.fall_through("read_dir", path, |store| store.read_dir(path))
    }

    fn write(&self, path: &Path, data: &[u8]) -> StoreResult<()> {
        self.prepare_parent(path)?;
        self.upper.write(path, data)
    }

    fn remove(&self, path: &Path) -> StoreResult<()> {
        self.require_upper(path)?;
        self.upper.remove(path)
    }

    fn create_dir_all(&self, path: &Path) -> StoreResult<()> {
        self.upper.create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> StoreResult<()> {
        self.require_upper(from)?;
        self.prepare_parent(to)?;
        self.upper.rename(from, to)
    }
}
