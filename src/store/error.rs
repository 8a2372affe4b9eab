//! Error types for backing store operations.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by a [`Store`](super::Store).
///
/// `NotFound` is kept as a variant so mutating calls can report it, but read
/// operations surface absence through [`Lookup::NotFound`](super::Lookup)
/// instead. Overlays rely on that split to decide whether to fall through.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The path does not exist in the store.
    #[error("{}: file does not exist", .0.display())]
    NotFound(PathBuf),

    /// A file operation was attempted on a directory.
    #[error("{}: is a directory", .0.display())]
    IsDirectory(PathBuf),

    /// A directory operation was attempted on a file.
    #[error("{}: not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The path escapes the store's root.
    #[error("{}: path escapes the store root", .0.display())]
    OutsideRoot(PathBuf),

    /// A mutating operation was attempted on a read-only store.
    #[error("read-only filesystem")]
    ReadOnly,

    /// No filesystem was configured behind this store.
    #[error("no filesystem configured")]
    Unconfigured,

    /// A mutating operation targeted a path that only exists in an overlay's lower layer.
    #[error("{}: path only exists in the lower layer", .0.display())]
    LowerLayer(PathBuf),

    /// Any other I/O failure from the underlying resource.
    #[error("{}: {source}", .path.display())]
    Io {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Map an I/O error, turning `ErrorKind::NotFound` into [`StoreError::NotFound`].
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::IsADirectory => Self::IsDirectory(path.to_path_buf()),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path.to_path_buf()),
            io::ErrorKind::ReadOnlyFilesystem => Self::ReadOnly,
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Check whether this error means "absent" rather than "failed".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
