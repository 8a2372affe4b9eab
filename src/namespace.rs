//! The `os` template namespace.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Accessor Routing                       │
//! ├────────────────────────────────────────────────────────────┤
//! │                                                            │
//! │  getenv(key)       ──► Environment                         │
//! │                                                            │
//! │  read_file(path)   ──┐                                     │
//! │                      ├─► EffectiveStore (content ▸ workdir)│
//! │  file_exists(path) ──┘                                     │
//! │                                                            │
//! │  read_dir(path)    ──► working dir only (read-only)        │
//! │                                                            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! `read_dir` does not see the content root. Directory listings always
//! reflect the working directory, even where the content root shadows it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::config;
use crate::env::{Environment, ProcessEnv, SharedEnvironment};
use crate::error::OsError;
use crate::resolver::{self, EffectiveStore, Layout};
use crate::store::{DirEntry, OsStore, ReadOnly, SharedStore, Store, Unconfigured};
use crate::value::to_text;

/// Template functions of the `os` namespace.
///
/// Built once with [`Namespace::builder`], then shared freely: every accessor
/// takes `&self` and the stores behind it are never reconfigured.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use tpl_os::Namespace;
/// use tpl_os::store::MemStore;
///
/// let content = MemStore::new();
/// content.insert("/a.txt", "X").unwrap();
/// let workdir = MemStore::new();
/// workdir.insert("/a.txt", "Y").unwrap();
/// workdir.insert("/b.txt", "Z").unwrap();
///
/// let ns = Namespace::builder()
///     .with_working_dir(Arc::new(workdir))
///     .with_content(Arc::new(content))
///     .build();
///
/// assert_eq!(ns.read_file(&json!("/a.txt")).unwrap(), "X");
/// assert_eq!(ns.read_file(&json!("/b.txt")).unwrap(), "Z");
/// assert!(!ns.file_exists(&json!("/c.txt")).unwrap());
/// ```
#[derive(Clone)]
pub struct Namespace {
    read_fs: EffectiveStore,
    dir_fs: SharedStore,
    env: SharedEnvironment,
    max_file_size: u64,
}

impl Namespace {
    /// Create a builder.
    pub fn builder() -> NamespaceBuilder {
        NamespaceBuilder::new()
    }

    /// The store behind `read_file` and `file_exists`.
    pub fn store(&self) -> &EffectiveStore {
        &self.read_fs
    }

    /// The composition chosen at build time.
    pub fn layout(&self) -> Layout {
        self.read_fs.layout()
    }

    /// Size limit applied by [`Namespace::read_file`].
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Look up an environment variable.
    ///
    /// Unset variables, empty values and keys that cannot be coerced to text
    /// all yield `""`. This accessor never fails.
    pub fn getenv(&self, key: &Value) -> String {
        match to_text(key) {
            Ok(key) => self.env.var(&key).unwrap_or_default(),
            Err(_) => String::new(),
        }
    }

    /// Read a file through the content/working-dir overlay.
    ///
    /// The file is stat'ed first and rejected when its size exceeds
    /// [`Namespace::max_file_size`]. A file that grows between the stat and
    /// the read is returned in full.
    pub fn read_file(&self, filename: &Value) -> Result<String, OsError> {
        let filename = to_text(filename)?;
        read_file(&self.read_fs, &filename, self.max_file_size)
    }

    /// List a directory of the working directory.
    ///
    /// Any failure, absence included, is wrapped with the path as
    /// [`OsError::Underlying`].
    pub fn read_dir(&self, path: &Value) -> Result<Vec<DirEntry>, OsError> {
        let path = PathBuf::from(to_text(path)?);
        self.dir_fs
            .read_dir(&path)
            .into_result(&path)
            .map_err(|err| {
                debug!(path = %path.display(), error = %err, "read_dir failed");
                OsError::underlying(path, err)
            })
    }

    /// Check whether a path exists in the content/working-dir overlay.
    ///
    /// Absence is `Ok(false)`. Other stat failures are returned as errors.
    pub fn file_exists(&self, path: &Value) -> Result<bool, OsError> {
        let path = to_text(path)?;
        if path.is_empty() {
            return Err(OsError::invalid_argument("file_exists needs a path to a file"));
        }
        let path = Path::new(&path);
        self.read_fs
            .exists(path)
            .map_err(|err| OsError::from_store(path, err))
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("layout", &self.layout())
            .field("max_file_size", &self.max_file_size)
            .finish_non_exhaustive()
    }
}

/// Read `filename` from `store` as text, rejecting files over `limit` bytes.
fn read_file(store: &impl Store, filename: &str, limit: u64) -> Result<String, OsError> {
    if filename.is_empty() {
        return Err(OsError::invalid_argument("read_file needs a filename"));
    }
    let path = Path::new(filename);
    let to_os_error = |err| OsError::from_store(path, err);

    let meta = store.stat(path).into_result(path).map_err(to_os_error)?;
    if meta.size > limit {
        debug!(path = filename, size = meta.size, limit, "read_file: file too big");
        return Err(OsError::TooLarge {
            path: path.to_path_buf(),
            size: meta.size,
            limit,
        });
    }

    let bytes = store.read(path).into_result(path).map_err(to_os_error)?;
    Ok(decode_text(&bytes))
}

/// Decode bytes as UTF-8, replacing invalid sequences.
fn decode_text(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).into_owned()
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Namespace`].
///
/// Without a working directory every file accessor fails with
/// [`OsError::Unconfigured`] (or a wrapped unconfigured error for `read_dir`).
#[derive(Default)]
pub struct NamespaceBuilder {
    working_dir: Option<SharedStore>,
    content: Option<SharedStore>,
    env: Option<SharedEnvironment>,
    max_file_size: Option<u64>,
}

impl NamespaceBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working-directory store (the fallback layer, and the only
    /// layer `read_dir` sees).
    pub fn with_working_dir(mut self, store: SharedStore) -> Self {
        self.working_dir = Some(store);
        self
    }

    /// Use a directory on disk as the working directory.
    pub fn with_working_dir_path(self, path: impl Into<PathBuf>) -> Self {
        self.with_working_dir(Arc::new(OsStore::new(path)))
    }

    /// Set the content store, which shadows the working directory.
    pub fn with_content(mut self, store: SharedStore) -> Self {
        self.content = Some(store);
        self
    }

    /// Use a directory on disk as the content root.
    pub fn with_content_path(self, path: impl Into<PathBuf>) -> Self {
        self.with_content(Arc::new(OsStore::new(path)))
    }

    /// Set the environment `getenv` reads from.
    ///
    /// Default: [`ProcessEnv`].
    pub fn with_environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Some(Arc::new(env));
        self
    }

    /// Override the `read_file` size limit for this namespace.
    ///
    /// Default: [`config::get`]`().max_file_size`.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Build the namespace.
    pub fn build(self) -> Namespace {
        let dir_fs: SharedStore = match &self.working_dir {
            Some(wd) => Arc::new(ReadOnly::new(wd.clone())),
            None => Arc::new(Unconfigured),
        };
        Namespace {
            read_fs: resolver::build(self.working_dir, self.content),
            dir_fs,
            env: self.env.unwrap_or_else(|| Arc::new(ProcessEnv)),
            max_file_size: self
                .max_file_size
                .unwrap_or_else(|| config::get().max_file_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::error::ErrorKind;
    use crate::store::{Lookup, Metadata, MemStore, Reader, StoreError, StoreResult};
    use rayon::prelude::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn mem(files: &[(&str, &str)]) -> Arc<MemStore> {
        let store = MemStore::new();
        for (path, content) in files {
            store.insert(path, content).unwrap();
        }
        Arc::new(store)
    }

    /// Content root has `/a.txt`; working dir has `/a.txt` and `/b.txt`.
    fn layered() -> Namespace {
        Namespace::builder()
            .with_working_dir(mem(&[("/a.txt", "Y"), ("/b.txt", "Z")]))
            .with_content(mem(&[("/a.txt", "X")]))
            .with_environment(MapEnv::new())
            .build()
    }

    #[test]
    fn test_scenario() {
        let ns = layered();
        assert_eq!(ns.layout(), Layout::ContentOverWorkingDir);
        assert_eq!(ns.read_file(&json!("/a.txt")).unwrap(), "X");
        assert_eq!(ns.read_file(&json!("/b.txt")).unwrap(), "Z");
        assert!(!ns.file_exists(&json!("/c.txt")).unwrap());
        assert!(ns.file_exists(&json!("/b.txt")).unwrap());
    }

    #[test]
    fn test_read_file_missing() {
        let err = layered().read_file(&json!("/c.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_empty_path_is_invalid() {
        let ns = layered();
        assert_eq!(ns.read_file(&json!("")).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(ns.file_exists(&json!("")).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(ns.read_file(&Value::Null).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_uncoercible_path_is_invalid() {
        let ns = layered();
        for arg in [json!(["/a.txt"]), json!({"path": "/a.txt"})] {
            assert_eq!(ns.read_file(&arg).unwrap_err().kind(), ErrorKind::InvalidArgument);
            assert_eq!(ns.file_exists(&arg).unwrap_err().kind(), ErrorKind::InvalidArgument);
            assert_eq!(ns.read_dir(&arg).unwrap_err().kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_size_limit_boundary() {
        let wd = MemStore::new();
        wd.insert_bytes("/exact.bin", vec![b'a'; 1_000_000]).unwrap();
        wd.insert_bytes("/over.bin", vec![b'a'; 1_000_001]).unwrap();
        let ns = Namespace::builder()
            .with_working_dir(Arc::new(wd))
            .with_max_file_size(1_000_000)
            .build();

        assert_eq!(ns.read_file(&json!("/exact.bin")).unwrap().len(), 1_000_000);
        let err = ns.read_file(&json!("/over.bin")).unwrap_err();
        assert!(matches!(
            err,
            OsError::TooLarge { size: 1_000_001, limit: 1_000_000, .. }
        ));
    }

    #[test]
    fn test_default_limit_from_config() {
        let ns = Namespace::builder().build();
        assert_eq!(ns.max_file_size(), config::get().max_file_size);
    }

    #[test]
    fn test_read_file_keeps_bom() {
        let wd = MemStore::new();
        wd.insert_bytes("/bom.txt", b"\xef\xbb\xbfhi".to_vec()).unwrap();
        let ns = Namespace::builder().with_working_dir(Arc::new(wd)).build();
        let text = ns.read_file(&json!("/bom.txt")).unwrap();
        assert_eq!(text.as_bytes(), [0xef, 0xbb, 0xbf, b'h', b'i']);
    }

    #[test]
    fn test_read_file_directory_is_underlying() {
        let ns = Namespace::builder()
            .with_working_dir(mem(&[("/dir/a.txt", "a")]))
            .build();
        let err = ns.read_file(&json!("/dir")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Underlying);
    }

    #[test]
    fn test_getenv() {
        let ns = Namespace::builder()
            .with_environment(MapEnv::new().with("SITE_ENV", "  production ").with("EMPTY", ""))
            .build();

        assert_eq!(ns.getenv(&json!("SITE_ENV")), "  production ");
        assert_eq!(ns.getenv(&json!("EMPTY")), "");
        assert_eq!(ns.getenv(&json!("UNSET")), "");
        assert_eq!(ns.getenv(&json!(["SITE_ENV"])), "");
        assert_eq!(ns.getenv(&json!({"k": 1})), "");
    }

    #[test]
    fn test_getenv_process_default() {
        temp_env::with_var("TPL_OS_NAMESPACE_VAR", Some("set-value"), || {
            let ns = Namespace::builder().build();
            assert_eq!(ns.getenv(&json!("TPL_OS_NAMESPACE_VAR")), "set-value");
        });
    }

    #[test]
    fn test_read_dir_ignores_content_root() {
        let ns = Namespace::builder()
            .with_working_dir(mem(&[("/dir/wd.txt", "w")]))
            .with_content(mem(&[("/dir/content.txt", "c"), ("/dir/wd.txt", "shadow")]))
            .build();

        let entries = ns.read_dir(&json!("/dir")).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["wd.txt"]);
        assert_eq!(entries[0].size, 1);
    }

    #[test]
    fn test_read_dir_content_only_path_fails() {
        let ns = Namespace::builder()
            .with_working_dir(mem(&[]))
            .with_content(mem(&[("/posts/p.md", "p")]))
            .build();

        assert!(ns.file_exists(&json!("/posts/p.md")).unwrap());
        let err = ns.read_dir(&json!("/posts")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Underlying);
        assert!(err.to_string().contains("/posts"));
    }

    #[test]
    fn test_unconfigured() {
        let ns = Namespace::builder().build();
        assert_eq!(ns.layout(), Layout::Unconfigured);
        assert_eq!(ns.read_file(&json!("/a.txt")).unwrap_err().kind(), ErrorKind::Unconfigured);
        assert_eq!(ns.file_exists(&json!("/a.txt")).unwrap_err().kind(), ErrorKind::Unconfigured);
        let err = ns.read_dir(&json!("/")).unwrap_err();
        assert!(matches!(
            err,
            OsError::Underlying { source: StoreError::Unconfigured, .. }
        ));
    }

    #[test]
    fn test_store_rejects_writes() {
        let ns = layered();
        let err = ns.store().write(Path::new("/a.txt"), b"new").unwrap_err();
        assert_eq!(
            OsError::from_store("/a.txt", err).kind(),
            ErrorKind::ReadOnlyViolation
        );
        assert_eq!(ns.read_file(&json!("/a.txt")).unwrap(), "X");
    }

    /// Stat succeeds but every other access fails with a permission error.
    struct Locked;

    impl Store for Locked {
        fn stat(&self, _: &Path) -> Lookup<Metadata> {
            Lookup::Failed(StoreError::Io {
                path: "/".into(),
                source: std::io::ErrorKind::PermissionDenied.into(),
            })
        }
        fn open_read(&self, _: &Path) -> Lookup<Reader> {
            Lookup::NotFound
        }
        fn read_dir(&self, _: &Path) -> Lookup<Vec<DirEntry>> {
            Lookup::NotFound
        }
        fn write(&self, _: &Path, _: &[u8]) -> StoreResult<()> {
            Err(StoreError::ReadOnly)
        }
        fn remove(&self, _: &Path) -> StoreResult<()> {
            Err(StoreError::ReadOnly)
        }
        fn create_dir_all(&self, _: &Path) -> StoreResult<()> {
            Err(StoreError::ReadOnly)
        }
        fn rename(&self, _: &Path, _: &Path) -> StoreResult<()> {
            Err(StoreError::ReadOnly)
        }
    }

    #[test]
    fn test_file_exists_propagates_stat_failure() {
        let ns = Namespace::builder()
            .with_working_dir(mem(&[("/a.txt", "Y")]))
            .with_content(Arc::new(Locked))
            .build();
        let err = ns.file_exists(&json!("/a.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Underlying);
        let err = ns.read_file(&json!("/a.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Underlying);
    }

    #[test]
    fn test_disk_roots() {
        let content = TempDir::new().unwrap();
        let workdir = TempDir::new().unwrap();
        fs::write(content.path().join("a.txt"), "X").unwrap();
        fs::write(workdir.path().join("a.txt"), "Y").unwrap();
        fs::write(workdir.path().join("b.txt"), "Z").unwrap();

        let ns = Namespace::builder()
            .with_working_dir_path(workdir.path())
            .with_content_path(content.path())
            .build();

        assert_eq!(ns.read_file(&json!("/a.txt")).unwrap(), "X");
        assert_eq!(ns.read_file(&json!("b.txt")).unwrap(), "Z");
        assert!(!ns.file_exists(&json!("/c.txt")).unwrap());

        let names: Vec<_> = ns
            .read_dir(&json!("/"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["a.txt", "b.txt"]);
    }

    #[test]
    fn test_disk_content_file_shadowing_parent_falls_through() {
        let content = TempDir::new().unwrap();
        let workdir = TempDir::new().unwrap();
        fs::write(content.path().join("data"), "not a directory").unwrap();
        fs::create_dir(workdir.path().join("data")).unwrap();
        fs::write(workdir.path().join("data/site.json"), "{}").unwrap();

        let ns = Namespace::builder()
            .with_working_dir_path(workdir.path())
            .with_content_path(content.path())
            .build();

        assert_eq!(ns.read_file(&json!("/data/site.json")).unwrap(), "{}");
        assert!(ns.file_exists(&json!("/data/site.json")).unwrap());
        assert!(!ns.file_exists(&json!("/data/missing.json")).unwrap());
    }

    #[test]
    fn test_concurrent_reads() {
        let ns = layered();
        let results: Vec<String> = (0..256)
            .into_par_iter()
            .map(|i| {
                let path = if i % 2 == 0 { "/a.txt" } else { "/b.txt" };
                ns.read_file(&json!(path)).unwrap()
            })
            .collect();

        for (i, text) in results.iter().enumerate() {
            assert_eq!(text, if i % 2 == 0 { "X" } else { "Z" });
        }
    }
}
