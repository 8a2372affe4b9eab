//! Composite store construction.
//!
//! Picks the single store that backs every file accessor:
//!
//! | working dir | content root | effective store                          |
//! |-------------|--------------|------------------------------------------|
//! | absent      | any          | [`Unconfigured`]                         |
//! | present     | absent       | `ReadOnly(working dir)`                  |
//! | present     | present      | `ReadOnly(Overlay(content, working dir))` |
//!
//! The choice is made once. An [`EffectiveStore`] never changes which stores
//! it consults.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::store::{
    DirEntry, Lookup, Metadata, Overlay, ReadOnly, Reader, SharedStore, Store, StoreResult,
    Unconfigured,
};

/// Which composition an [`EffectiveStore`] was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// No working directory; every call fails.
    Unconfigured,
    /// The working directory alone, read-only.
    WorkingDir,
    /// Content root over the working directory, read-only.
    ContentOverWorkingDir,
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconfigured => f.write_str("unconfigured"),
            Self::WorkingDir => f.write_str("working-dir"),
            Self::ContentOverWorkingDir => f.write_str("content-over-working-dir"),
        }
    }
}

/// The store selected by [`build`].
///
/// Cheap to clone; clones share the same underlying stores.
#[derive(Clone)]
pub struct EffectiveStore {
    inner: SharedStore,
    layout: Layout,
}

impl EffectiveStore {
    /// The composition this store was built with.
    pub fn layout(&self) -> Layout {
        self.layout
    }
}

impl std::fmt::Debug for EffectiveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectiveStore")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Build the effective store from the configured roots.
///
/// The working directory is required; without it the result fails every
/// operation. When a content root is given it shadows the working directory
/// path by path. The result is read-only in every case.
pub fn build(working_dir: Option<SharedStore>, content: Option<SharedStore>) -> EffectiveStore {
    let (inner, layout) = match (working_dir, content) {
        (None, _) => (Arc::new(Unconfigured) as SharedStore, Layout::Unconfigured),
        (Some(wd), None) => (
            Arc::new(ReadOnly::new(wd)) as SharedStore,
            Layout::WorkingDir,
        ),
        (Some(wd), Some(content)) => (
            Arc::new(ReadOnly::new(Overlay::new(content, wd))) as SharedStore,
            Layout::ContentOverWorkingDir,
        ),
    };
    debug!(%layout, "built effective store");
    EffectiveStore { inner, layout }
}

impl Store for EffectiveStore {
    fn stat(&self, path: &Path) -> Lookup<Metadata> {
        self.inner.stat(path)
    }

    fn open_read(&self, path: &Path) -> Lookup<Reader> {
        self.inner.open_read(path)
    }

    fn read_dir(&self, path: &Path) -> Lookup<Vec<DirEntry>> {
        self.inner.read_dir(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> StoreResult<()> {
        self.inner.write(path, data)
    }

    fn remove(&self, path: &Path) -> StoreResult<()> {
        self.inner.remove(path)
    }

    fn create_dir_all(&self, path: &Path) -> StoreResult<()> {
        self.inner.create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> StoreResult<()> {
        self.inner.rename(from, to)
    }
}
