//! Store backed by a directory on disk.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use super::{DirEntry, Lookup, Metadata, Reader, Store, StoreError, StoreResult};

/// A store rooted at a directory of the real filesystem.
///
/// Both `/a.txt` and `a.txt` resolve to `<base>/a.txt`. Paths whose `..`
/// components would climb above the base are rejected with
/// [`StoreError::OutsideRoot`].
#[derive(Debug, Clone)]
pub struct OsStore {
    base: PathBuf,
}

impl OsStore {
    /// Create a store rooted at `base`.
    ///
    /// The directory is not checked here; a missing base shows up as
    /// `NotFound` on first access.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The directory this store is rooted at.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a store path to a path on disk.
    fn resolve(&self, path: &Path) -> StoreResult<PathBuf> {
        let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part),
                Component::ParentDir => {
                    if parts.pop().is_none() {
                        return Err(StoreError::OutsideRoot(path.to_path_buf()));
                    }
                }
                Component::RootDir | Component::CurDir => {}
                Component::Prefix(_) => return Err(StoreError::OutsideRoot(path.to_path_buf())),
            }
        }
        let mut resolved = self.base.clone();
        resolved.extend(parts);
        Ok(resolved)
    }
}

fn metadata_of(meta: &fs::Metadata) -> Metadata {
    let modified = meta.modified().ok().map(DateTime::<Utc>::from);
    if meta.is_dir() {
        Metadata::dir(modified)
    } else {
        Metadata::file(meta.len(), modified)
    }
}

/// Map an I/O error from a read.
///
/// `ENOTDIR` means a file stands where a parent directory belongs, so the
/// path itself is absent.
fn read_error(err: io::Error, path: &Path) -> StoreError {
    if err.kind() == io::ErrorKind::NotADirectory {
        return StoreError::NotFound(path.to_path_buf());
    }
    StoreError::from_io(err, path)
}

/// Collect a directory listing, sorted by name.
fn collect_entries(iter: fs::ReadDir, path: &Path) -> StoreResult<Vec<DirEntry>> {
    let map_err = |e| StoreError::from_io(e, path);
    let mut entries = Vec::new();
    for entry in iter {
        let entry = entry.map_err(map_err)?;
        let meta = entry.metadata().map_err(map_err)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push(DirEntry::new(name, metadata_of(&meta)));
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn failed<T>(err: StoreError) -> Lookup<T> {
    Lookup::from(Err(err))
}

impl Store for OsStore {
    fn stat(&self, path: &Path) -> Lookup<Metadata> {
        let full = match self.resolve(path) {
            Ok(full) => full,
            Err(err) => return Lookup::Failed(err),
        };
        fs::metadata(&full)
            .map(|meta| metadata_of(&meta))
            .map_err(|e| read_error(e, path))
            .into()
    }

    fn open_read(&self, path: &Path) -> Lookup<Reader> {
        let full = match self.resolve(path) {
            Ok(full) => full,
            Err(err) => return Lookup::Failed(err),
        };
        let map_err = |e| read_error(e, path);
        fs::metadata(&full)
            .map_err(map_err)
            .and_then(|meta| {
                if meta.is_dir() {
                    Err(StoreError::IsDirectory(path.to_path_buf()))
                } else {
                    fs::File::open(&full)
                        .map(|file| Box::new(file) as Reader)
                        .map_err(map_err)
                }
            })
            .into()
    }

    fn read_dir(&self, path: &Path) -> Lookup<Vec<DirEntry>> {
        let full = match self.resolve(path) {
            Ok(full) => full,
            Err(err) => return Lookup::Failed(err),
        };
        let iter = match fs::read_dir(&full) {
            Ok(iter) => iter,
            // Only a listing of the file itself is NotADirectory; ENOTDIR
            // raised by an ancestor means the path is absent.
            Err(err) if err.kind() == io::ErrorKind::NotADirectory => {
                return match fs::metadata(&full) {
                    Ok(meta) if !meta.is_dir() => {
                        failed(StoreError::NotADirectory(path.to_path_buf()))
                    }
                    Ok(_) => failed(StoreError::from_io(err, path)),
                    Err(e) => failed(read_error(e, path)),
                };
            }
            Err(err) => return failed(StoreError::from_io(err, path)),
        };

        collect_entries(iter, path).into()
    }

    fn write(&self, path: &Path, data: &[u8]) -> StoreResult<()> {
        let full = self.resolve(path)?;
        fs::write(&full, data).map_err(|e| StoreError::from_io(e, path))
    }

    fn remove(&self, path: &Path) -> StoreResult<()> {
        let full = self.resolve(path)?;
        let map_err = |e| StoreError::from_io(e, path);
        let meta = fs::symlink_metadata(&full).map_err(map_err)?;
        if meta.is_dir() {
            fs::remove_dir(&full).map_err(map_err)
        } else {
            fs::remove_file(&full).map_err(map_err)
        }
    }

    fn create_dir_all(&self, path: &Path) -> StoreResult<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|e| StoreError::from_io(e, path))
    }

    fn rename(&self, from: &Path, to: &Path) -> StoreResult<()> {
        let src = self.resolve(from)?;
        let dst = self.resolve(to)?;
        fs::rename(&src, &dst).map_err(|e| StoreError::from_io(e, from))
    }
}
