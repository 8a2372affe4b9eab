//! Backing stores and the layers composed on top of them.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Store Composition                     │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  ReadOnly ──► Overlay ──┬─► upper (content root)         │
//! │                         │     Found / Failed ─► return   │
//! │                         │     NotFound ─┐                │
//! │                         │               ▼                │
//! │                         └─► lower (working dir)          │
//! │                                                          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Concrete stores:
//!
//! - [`OsStore`]: a directory on disk used as root
//! - [`MemStore`]: an in-memory tree, handy for tests and generated content
//!
//! Layers:
//!
//! - [`Overlay`]: upper-then-lower resolution
//! - [`ReadOnly`]: rejects every mutating call
//! - [`Unconfigured`]: fails everything

mod error;
mod lookup;
mod mem;
mod os;
mod overlay;
mod readonly;
mod unconfigured;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

pub use error::{StoreError, StoreResult};
pub use lookup::Lookup;
pub use mem::MemStore;
pub use os::OsStore;
pub use overlay::Overlay;
pub use readonly::ReadOnly;
pub use unconfigured::Unconfigured;

/// A reference-counted store handle. Stores are injected, never owned by their consumers.
pub type SharedStore = Arc<dyn Store>;

/// Boxed byte stream returned by [`Store::open_read`].
pub type Reader = Box<dyn Read + Send>;

// =============================================================================
// Metadata
// =============================================================================

/// Result of [`Store::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Size in bytes (0 for directories in [`MemStore`]).
    pub size: u64,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Last modification time, if the store tracks one.
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Metadata for a regular file.
    pub fn file(size: u64, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            size,
            is_dir: false,
            modified,
        }
    }

    /// Metadata for a directory.
    pub fn dir(modified: Option<DateTime<Utc>>) -> Self {
        Self {
            size: 0,
            is_dir: true,
            modified,
        }
    }
}

// =============================================================================
// DirEntry
// =============================================================================

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name (last path component only).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Last modification time, if known.
    pub modified: Option<DateTime<Utc>>,
}

impl DirEntry {
    /// Build an entry from a name and its metadata.
    pub fn new(name: impl Into<String>, meta: Metadata) -> Self {
        Self {
            name: name.into(),
            size: meta.size,
            is_dir: meta.is_dir,
            modified: meta.modified,
        }
    }

    /// Convert to a JSON value for the templating layer.
    ///
    /// Keys: `name`, `size`, `isDir`, `modTime` (RFC 3339 or `null`).
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "size": self.size,
            "isDir": self.is_dir,
            "modTime": self.modified.map(|t| t.to_rfc3339()),
        })
    }
}

// =============================================================================
// Store Trait
// =============================================================================

/// Capability set over a real or virtual filesystem.
///
/// Read operations return a [`Lookup`] so that callers can tell "absent"
/// from "failed" without inspecting error kinds. Mutating operations return
/// a plain [`StoreResult`].
///
/// Implementations must be safe for concurrent read access.
pub trait Store: Send + Sync {
    /// Stat a path.
    fn stat(&self, path: &Path) -> Lookup<Metadata>;

    /// Open a file for reading.
    fn open_read(&self, path: &Path) -> Lookup<Reader>;

    /// List a directory, ordered by name.
    fn read_dir(&self, path: &Path) -> Lookup<Vec<DirEntry>>;

    /// Create or truncate a file with `data`.
    fn write(&self, path: &Path, data: &[u8]) -> StoreResult<()>;

    /// Remove a file or an empty directory.
    fn remove(&self, path: &Path) -> StoreResult<()>;

    /// Create a directory and all missing parents.
    fn create_dir_all(&self, path: &Path) -> StoreResult<()>;

    /// Rename a file or directory.
    fn rename(&self, from: &Path, to: &Path) -> StoreResult<()>;

    /// Check whether a path exists.
    ///
    /// Absence is `Ok(false)`; any other stat failure is returned as an error.
    fn exists(&self, path: &Path) -> StoreResult<bool> {
        self.stat(path).into_option().map(|meta| meta.is_some())
    }

    /// Read a whole file into memory.
    fn read(&self, path: &Path) -> Lookup<Vec<u8>> {
        self.open_read(path).and_then(|mut reader| {
            let mut buf = Vec::new();
            match reader.read_to_end(&mut buf) {
                Ok(_) => Lookup::Found(buf),
                Err(err) => Lookup::Failed(StoreError::from_io(err, path)),
            }
        })
    }
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn stat(&self, path: &Path) -> Lookup<Metadata> {
        (**self).stat(path)
    }

    fn open_read(&self, path: &Path) -> Lookup<Reader> {
        (**self).open_read(path)
    }

    fn read_dir(&self, path: &Path) -> Lookup<Vec<DirEntry>> {
        (**self).read_dir(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> StoreResult<()> {
        (**self).write(path, data)
    }

    fn remove(&self, path: &Path) -> StoreResult<()> {
        (**self).remove(path)
    }

    fn create_dir_all(&self, path: &Path) -> StoreResult<()> {
        (**self).create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> StoreResult<()> {
        (**self).rename(from, to)
    }

    fn exists(&self, path: &Path) -> StoreResult<bool> {
        (**self).exists(path)
    }

    fn read(&self, path: &Path) -> Lookup<Vec<u8>> {
        (**self).read(path)
    }
}
