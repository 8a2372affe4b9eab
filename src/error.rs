//! Error type for the template accessors.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;
use crate::value::CoerceError;

/// Coarse classification of an [`OsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing, empty or uncoercible argument.
    InvalidArgument,
    /// Path absent from every consulted layer.
    NotFound,
    /// File exceeds the size limit.
    TooLarge,
    /// A mutating call hit a read-only store.
    ReadOnlyViolation,
    /// No filesystem configured.
    Unconfigured,
    /// Any other backing store failure.
    Underlying,
}

/// Error returned by [`Namespace`](crate::Namespace) accessors.
///
/// # Example
///
/// ```ignore
/// match ns.read_file(&json!("/data/site.json")) {
///     Ok(text) => render(&text),
///     Err(OsError::TooLarge { size, limit, .. }) => {
///         eprintln!("{size} bytes over the {limit} byte limit");
///     }
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum OsError {
    /// The argument was empty or could not be coerced to text.
    #[error("{0}")]
    InvalidArgument(String),

    /// The path does not exist.
    #[error("file {} does not exist", .path.display())]
    NotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The file is larger than the configured limit.
    #[error("file {} is too big ({size} bytes, limit {limit})", .path.display())]
    TooLarge {
        /// Requested path.
        path: PathBuf,
        /// Size reported by stat.
        size: u64,
        /// Limit in effect.
        limit: u64,
    },

    /// A mutating operation was rejected.
    #[error("read-only filesystem")]
    ReadOnlyViolation,

    /// No filesystem is configured.
    #[error("no filesystem configured")]
    Unconfigured,

    /// The backing store failed.
    #[error("failed to access {}: {source}", .path.display())]
    Underlying {
        /// Path the failing operation was applied to.
        path: PathBuf,
        /// Store error.
        #[source]
        source: StoreError,
    },
}

impl OsError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Classify a store error raised while accessing `path`.
    ///
    /// Absence, read-only and unconfigured errors get their own kinds.
    /// Everything else is wrapped with the path for context.
    pub fn from_store(path: impl Into<PathBuf>, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound { path: path.into() },
            StoreError::ReadOnly => Self::ReadOnlyViolation,
            StoreError::Unconfigured => Self::Unconfigured,
            source => Self::Underlying {
                path: path.into(),
                source,
            },
        }
    }

    /// Wrap a store error with `path`, keeping it as [`ErrorKind::Underlying`]
    /// whatever its cause.
    pub fn underlying(path: impl Into<PathBuf>, source: StoreError) -> Self {
        Self::Underlying {
            path: path.into(),
            source,
        }
    }

    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::ReadOnlyViolation => ErrorKind::ReadOnlyViolation,
            Self::Unconfigured => ErrorKind::Unconfigured,
            Self::Underlying { .. } => ErrorKind::Underlying,
        }
    }
}

impl From<CoerceError> for OsError {
    fn from(err: CoerceError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
