//! Three-outcome result for store reads.

use std::path::Path;

use super::error::{StoreError, StoreResult};

/// Outcome of a read operation against a store.
///
/// Absence and failure are separate outcomes: an overlay continues its search
/// on [`Lookup::NotFound`] and stops on [`Lookup::Failed`].
#[derive(Debug)]
pub enum Lookup<T> {
    /// The path exists and the operation succeeded.
    Found(T),
    /// The path does not exist in this store.
    NotFound,
    /// The operation failed for a reason other than absence.
    Failed(StoreError),
}

impl<T> Lookup<T> {
    /// Try `fallback` only if this lookup reported absence.
    ///
    /// `Found` and `Failed` are returned unchanged.
    pub fn or_fallback(self, fallback: impl FnOnce() -> Lookup<T>) -> Lookup<T> {
        match self {
            Self::NotFound => fallback(),
            other => other,
        }
    }

    /// Map the found value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
            Self::Failed(err) => Lookup::Failed(err),
        }
    }

    /// Chain another lookup on the found value.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Lookup<U>) -> Lookup<U> {
        match self {
            Self::Found(value) => f(value),
            Self::NotFound => Lookup::NotFound,
            Self::Failed(err) => Lookup::Failed(err),
        }
    }

    /// Check if the lookup found a value.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Check if the lookup reported absence.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Collapse into a `Result`, naming `path` in the `NotFound` error.
    pub fn into_result(self, path: &Path) -> StoreResult<T> {
        match self {
            Self::Found(value) => Ok(value),
            Self::NotFound => Err(StoreError::NotFound(path.to_path_buf())),
            Self::Failed(err) => Err(err),
        }
    }

    /// Collapse into `Ok(Some(_))`, `Ok(None)` or `Err(_)`.
    pub fn into_option(self) -> StoreResult<Option<T>> {
        match self {
            Self::Found(value) => Ok(Some(value)),
            Self::NotFound => Ok(None),
            Self::Failed(err) => Err(err),
        }
    }
}

impl<T> From<StoreResult<T>> for Lookup<T> {
    fn from(result: StoreResult<T>) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(err) if err.is_not_found() => Self::NotFound,
            Err(err) => Self::Failed(err),
        }
    }
}
