//! In-memory store.

use std::io::{self, Cursor};
use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{DirEntry, Lookup, Metadata, Reader, Store, StoreError, StoreResult};

const ROOT: &str = "/";

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, modified: DateTime<Utc> },
    Dir { modified: DateTime<Utc> },
}

impl Node {
    fn metadata(&self) -> Metadata {
        match self {
            Self::File { data, modified } => Metadata::file(data.len() as u64, Some(*modified)),
            Self::Dir { modified } => Metadata::dir(Some(*modified)),
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self, Self::Dir { .. })
    }
}

/// A map-based in-memory store.
///
/// Paths are normalized to rooted form (`a/./b/../c` → `/a/c`), so relative
/// and rooted spellings address the same node. A `..` climbing above the
/// root fails with [`StoreError::OutsideRoot`], as in [`OsStore`](super::OsStore).
/// The root directory always exists.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use tpl_os::store::{MemStore, Store};
///
/// let store = MemStore::new();
/// store.insert("/data/site.json", r#"{"title":"My Blog"}"#).unwrap();
/// assert!(store.exists(Path::new("/data")).unwrap());
/// ```
#[derive(Debug)]
pub struct MemStore {
    nodes: RwLock<FxHashMap<String, Node>>,
}

impl Default for MemStore {
    fn default() -> Self {
        let mut nodes = FxHashMap::default();
        nodes.insert(ROOT.to_string(), Node::Dir { modified: Utc::now() });
        Self {
            nodes: RwLock::new(nodes),
        }
    }
}

impl MemStore {
    /// Create an empty store containing only the root directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file with string content.
    ///
    /// Missing parents are created. Unlike [`Store::write`], any file standing
    /// where a parent directory belongs is replaced. Only a path escaping the
    /// root is rejected.
    pub fn insert(&self, path: impl AsRef<Path>, content: impl AsRef<str>) -> StoreResult<()> {
        self.insert_bytes(path, content.as_ref().as_bytes())
    }

    /// Insert a file with binary content. See [`MemStore::insert`].
    pub fn insert_bytes(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
    ) -> StoreResult<()> {
        let key = normalize(path.as_ref())?;
        let now = Utc::now();
        let mut nodes = self.nodes.write();
        for ancestor in ancestors(&key) {
            let slot = nodes
                .entry(ancestor.to_string())
                .or_insert(Node::Dir { modified: now });
            if !slot.is_dir() {
                *slot = Node::Dir { modified: now };
            }
        }
        nodes.insert(
            key,
            Node::File {
                data: content.into(),
                modified: now,
            },
        );
        Ok(())
    }

    /// Get the number of nodes, directories included (the root counts).
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Check if the store holds nothing but the root directory.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn has_children(nodes: &FxHashMap<String, Node>, key: &str) -> bool {
        nodes.keys().any(|k| parent(k) == Some(key))
    }
}

impl Store for MemStore {
    fn stat(&self, path: &Path) -> Lookup<Metadata> {
        let key = match lookup_key(path) {
            Ok(key) => key,
            Err(failed) => return failed,
        };
        match self.nodes.read().get(&key) {
            Some(node) => Lookup::Found(node.metadata()),
            None => Lookup::NotFound,
        }
    }

    fn open_read(&self, path: &Path) -> Lookup<Reader> {
        let key = match lookup_key(path) {
            Ok(key) => key,
            Err(failed) => return failed,
        };
        match self.nodes.read().get(&key) {
            Some(Node::File { data, .. }) => Lookup::Found(Box::new(Cursor::new(data.clone()))),
            Some(Node::Dir { .. }) => Lookup::Failed(StoreError::IsDirectory(path.to_path_buf())),
            None => Lookup::NotFound,
        }
    }

    fn read_dir(&self, path: &Path) -> Lookup<Vec<DirEntry>> {
        let key = match lookup_key(path) {
            Ok(key) => key,
            Err(failed) => return failed,
        };
        let nodes = self.nodes.read();
        match nodes.get(&key) {
            Some(Node::Dir { .. }) => {}
            Some(Node::File { .. }) => {
                return Lookup::Failed(StoreError::NotADirectory(path.to_path_buf()));
            }
            None => return Lookup::NotFound,
        }

        let mut entries: Vec<DirEntry> = nodes
            .iter()
            .filter(|(k, _)| parent(k) == Some(key.as_str()))
            .map(|(k, node)| DirEntry::new(file_name(k), node.metadata()))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Lookup::Found(entries)
    }

    fn write(&self, path: &Path, data: &[u8]) -> StoreResult<()> {
        let key = normalize(path)?;
        let mut nodes = self.nodes.write();
        if let Some(Node::Dir { .. }) = nodes.get(&key) {
            return Err(StoreError::IsDirectory(path.to_path_buf()));
        }
        let now = Utc::now();
        for ancestor in ancestors(&key) {
            match nodes.get(ancestor) {
                Some(Node::Dir { .. }) => {}
                Some(Node::File { .. }) => {
                    return Err(StoreError::NotADirectory(ancestor.into()));
                }
                None => {
                    nodes.insert(ancestor.to_string(), Node::Dir { modified: now });
                }
            }
        }
        nodes.insert(
            key,
            Node::File {
                data: data.to_vec(),
                modified: now,
            },
        );
        Ok(())
    }

    fn remove(&self, path: &Path) -> StoreResult<()> {
        let key = normalize(path)?;
        let mut nodes = self.nodes.write();
        match nodes.get(&key) {
            None => return Err(StoreError::NotFound(path.to_path_buf())),
            Some(_) if key == ROOT => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source: io::ErrorKind::PermissionDenied.into(),
                });
            }
            Some(Node::Dir { .. }) if Self::has_children(&nodes, &key) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source: io::ErrorKind::DirectoryNotEmpty.into(),
                });
            }
            Some(_) => {}
        }
        nodes.remove(&key);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> StoreResult<()> {
        let key = normalize(path)?;
        let now = Utc::now();
        let mut nodes = self.nodes.write();
        for dir in ancestors(&key).chain(std::iter::once(key.as_str())) {
            match nodes.get(dir) {
                Some(Node::Dir { .. }) => {}
                Some(Node::File { .. }) => return Err(StoreError::NotADirectory(dir.into())),
                None => {
                    nodes.insert(dir.to_string(), Node::Dir { modified: now });
                }
            }
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> StoreResult<()> {
        let src = normalize(from)?;
        let dst = normalize(to)?;
        let mut nodes = self.nodes.write();

        if !nodes.contains_key(&src) {
            return Err(StoreError::NotFound(from.to_path_buf()));
        }
        match parent(&dst).and_then(|p| nodes.get(p)) {
            Some(Node::Dir { .. }) => {}
            Some(Node::File { .. }) => return Err(StoreError::NotADirectory(to.to_path_buf())),
            None => return Err(StoreError::NotFound(to.to_path_buf())),
        }

        let prefix = format!("{src}/");
        let moved: Vec<String> = nodes
            .keys()
            .filter(|k| **k == src || k.starts_with(&prefix))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let new = format!("{dst}{}", &old[src.len()..]);
                nodes.insert(new, node);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Path Helpers
// =============================================================================

/// Normalize to a rooted, `/`-separated key.
///
/// `..` climbing above the root is rejected with [`StoreError::OutsideRoot`].
fn normalize(path: &Path) -> StoreResult<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(StoreError::OutsideRoot(path.to_path_buf()));
                }
            }
            Component::RootDir | Component::CurDir => {}
            Component::Prefix(_) => return Err(StoreError::OutsideRoot(path.to_path_buf())),
        }
    }
    Ok(format!("/{}", parts.join("/")))
}

/// Normalize for a read, reporting an escaping path as a failed lookup.
fn lookup_key<T>(path: &Path) -> Result<String, Lookup<T>> {
    normalize(path).map_err(Lookup::Failed)
}

fn parent(key: &str) -> Option<&str> {
    if key == ROOT {
        return None;
    }
    match key.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&key[..idx]),
        None => None,
    }
}

fn file_name(key: &str) -> &str {
    key.rfind('/').map_or(key, |idx| &key[idx + 1..])
}

/// Strict ancestors of `key`, root first.
fn ancestors(key: &str) -> impl Iterator<Item = &str> {
    let mut chain = Vec::new();
    let mut current = parent(key);
    while let Some(dir) = current {
        chain.push(dir);
        current = parent(dir);
    }
    chain.into_iter().rev()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_string(store: &MemStore, path: &str) -> String {
        match store.read(Path::new(path)) {
            Lookup::Found(bytes) => String::from_utf8(bytes).unwrap(),
            other => panic!("expected content at {path}, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/./b/../c")).unwrap(), "/a/c");
        assert_eq!(normalize(Path::new("/")).unwrap(), "/");
        assert_eq!(normalize(Path::new("")).unwrap(), "/");
        assert!(matches!(
            normalize(Path::new("/../x")),
            Err(StoreError::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_insert_creates_parents() {
        let store = MemStore::new();
        store.insert("/a/b/c.txt", "hello").unwrap();

        assert!(store.stat(Path::new("/a")).map(|m| m.is_dir).into_option().unwrap().unwrap());
        assert!(store.stat(Path::new("/a/b")).is_found());
        assert_eq!(read_string(&store, "a/b/c.txt"), "hello");
    }

    #[test]
    fn test_stat_reports_size() {
        let store = MemStore::new();
        store.insert("/a.txt", "12345").unwrap();
        match store.stat(Path::new("/a.txt")) {
            Lookup::Found(meta) => {
                assert_eq!(meta.size, 5);
                assert!(!meta.is_dir);
                assert!(meta.modified.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_is_not_found() {
        let store = MemStore::new();
        assert!(store.stat(Path::new("/nope")).is_not_found());
        assert!(store.open_read(Path::new("/nope")).is_not_found());
        assert!(store.read_dir(Path::new("/nope")).is_not_found());
    }

    #[test]
    fn test_read_dir_sorted_direct_children() {
        let store = MemStore::new();
        store.insert("/dir/b.txt", "b").unwrap();
        store.insert("/dir/a.txt", "a").unwrap();
        store.insert("/dir/sub/deep.txt", "d").unwrap();

        let Lookup::Found(entries) = store.read_dir(Path::new("/dir")) else {
            panic!("expected listing");
        };
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "sub"]);
        assert!(entries[2].is_dir);
    }

    #[test]
    fn test_open_directory_fails() {
        let store = MemStore::new();
        store.create_dir_all(Path::new("/d")).unwrap();
        assert!(matches!(
            store.open_read(Path::new("/d")),
            Lookup::Failed(StoreError::IsDirectory(_))
        ));
    }

    #[test]
    fn test_list_file_fails() {
        let store = MemStore::new();
        store.insert("/f", "x").unwrap();
        assert!(matches!(
            store.read_dir(Path::new("/f")),
            Lookup::Failed(StoreError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_write_under_file_fails() {
        let store = MemStore::new();
        store.insert("/f", "x").unwrap();
        let err = store.write(Path::new("/f/g"), b"y").unwrap_err();
        assert!(matches!(err, StoreError::NotADirectory(_)));
    }

    #[test]
    fn test_remove_non_empty_dir_fails() {
        let store = MemStore::new();
        store.insert("/d/f", "x").unwrap();
        assert!(store.remove(Path::new("/d")).is_err());
        store.remove(Path::new("/d/f")).unwrap();
        store.remove(Path::new("/d")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_rename_moves_subtree() {
        let store = MemStore::new();
        store.insert("/old/a.txt", "a").unwrap();
        store.insert("/old/sub/b.txt", "b").unwrap();
        store.rename(Path::new("/old"), Path::new("/new")).unwrap();

        assert!(store.stat(Path::new("/old")).is_not_found());
        assert_eq!(read_string(&store, "/new/a.txt"), "a");
        assert_eq!(read_string(&store, "/new/sub/b.txt"), "b");
    }

    #[test]
    fn test_rename_sibling_prefix_untouched() {
        let store = MemStore::new();
        store.insert("/a/x", "1").unwrap();
        store.insert("/ab/y", "2").unwrap();
        store.rename(Path::new("/a"), Path::new("/c")).unwrap();
        assert_eq!(read_string(&store, "/ab/y"), "2");
        assert_eq!(read_string(&store, "/c/x"), "1");
    }

    #[test]
    fn test_escape_rejected() {
        let store = MemStore::new();
        store.insert("/x", "x").unwrap();

        assert!(matches!(
            store.stat(Path::new("/../x")),
            Lookup::Failed(StoreError::OutsideRoot(_))
        ));
        assert!(matches!(
            store.read_dir(Path::new("..")),
            Lookup::Failed(StoreError::OutsideRoot(_))
        ));
        assert!(matches!(
            store.insert("../y", "y"),
            Err(StoreError::OutsideRoot(_))
        ));
        assert!(matches!(
            store.write(Path::new("a/../../y"), b"y"),
            Err(StoreError::OutsideRoot(_))
        ));
        assert!(store.stat(Path::new("/sub/../x")).is_found());
    }

    #[test]
    fn test_file_as_parent_is_not_found() {
        let store = MemStore::new();
        store.insert("/data", "plain file").unwrap();
        assert!(store.stat(Path::new("/data/site.json")).is_not_found());
        assert!(store.read_dir(Path::new("/data/sub")).is_not_found());
    }
}
