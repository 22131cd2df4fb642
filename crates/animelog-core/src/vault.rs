//! Document store the notes live in.
//!
//! The store is a host collaborator: the CLI uses [`FsVault`] over a directory
//! on disk, tests use [`MemoryVault`]. Paths are vault-relative and always use
//! `/` as the separator.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use crate::error::VaultError;

/// What lives at a vault path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    NotFound,
    Document,
    Directory,
}

/// A markdown document in the vault.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DocumentRef {
    pub path: String,
}

impl DocumentRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// File name without directory or extension.
    pub fn basename(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    }
}

/// Collapse separators and strip leading/trailing slashes.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent directory of a vault path (`""` for the root).
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Host document store.
pub trait Vault: Send + Sync {
    /// All markdown documents, in no particular order.
    fn markdown_documents(
        &self,
    ) -> impl Future<Output = Result<Vec<DocumentRef>, VaultError>> + Send;

    /// Paths of the files directly inside `dir`.
    fn list_files(&self, dir: &str)
        -> impl Future<Output = Result<Vec<String>, VaultError>> + Send;

    fn entry(&self, path: &str) -> impl Future<Output = Result<Entry, VaultError>> + Send;

    fn read(&self, path: &str) -> impl Future<Output = Result<String, VaultError>> + Send;

    /// Create a new document; fails with [`VaultError::AlreadyExists`] if the path is taken.
    fn create(&self, path: &str, text: &str)
        -> impl Future<Output = Result<(), VaultError>> + Send;

    /// Overwrite an existing document.
    fn modify(&self, path: &str, text: &str)
        -> impl Future<Output = Result<(), VaultError>> + Send;

    fn create_binary(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl Future<Output = Result<(), VaultError>> + Send;

    fn create_dir(&self, path: &str) -> impl Future<Output = Result<(), VaultError>> + Send;

    fn delete(&self, path: &str) -> impl Future<Output = Result<(), VaultError>> + Send;

    /// Show a document in the host's active view.
    fn open(&self, path: &str) -> impl Future<Output = Result<(), VaultError>> + Send;

    /// Create `path` as a directory unless it already is one.
    fn ensure_dir(&self, path: &str) -> impl Future<Output = Result<(), VaultError>> + Send {
        async move {
            match self.entry(path).await? {
                Entry::Directory => Ok(()),
                Entry::NotFound => self.create_dir(path).await,
                Entry::Document => Err(VaultError::AlreadyExists(path.to_string())),
            }
        }
    }
}

// ── Filesystem vault ────────────────────────────────────────────

/// A vault backed by a directory on disk.
pub struct FsVault {
    root: PathBuf,
    open_documents: bool,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            open_documents: true,
        }
    }

    /// When disabled, [`Vault::open`] only logs the path.
    pub fn with_open_documents(mut self, open_documents: bool) -> Self {
        self.open_documents = open_documents;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute filesystem path for a vault path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        normalize_path(path)
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |acc, seg| acc.join(seg))
    }

    fn relative(root: &Path, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    fn map_io(path: &str, e: std::io::Error) -> VaultError {
        match e.kind() {
            ErrorKind::NotFound => VaultError::NotFound(path.to_string()),
            ErrorKind::AlreadyExists => VaultError::AlreadyExists(path.to_string()),
            _ => VaultError::Io(e),
        }
    }
}

impl Vault for FsVault {
    async fn markdown_documents(&self) -> Result<Vec<DocumentRef>, VaultError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| {
                    e.path()
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
                })
                .filter_map(|e| Self::relative(&root, e.path()))
                .map(DocumentRef::new)
                .collect()
        })
        .await
        .map_err(|e| VaultError::Io(std::io::Error::other(e)))
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, VaultError> {
        let dir = normalize_path(dir);
        let mut read_dir = match tokio::fs::read_dir(self.resolve(&dir)).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(VaultError::Io(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                files.push(if dir.is_empty() {
                    name
                } else {
                    format!("{dir}/{name}")
                });
            }
        }
        files.sort();
        Ok(files)
    }

    async fn entry(&self, path: &str) -> Result<Entry, VaultError> {
        match tokio::fs::metadata(self.resolve(path)).await {
            Ok(meta) if meta.is_dir() => Ok(Entry::Directory),
            Ok(_) => Ok(Entry::Document),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entry::NotFound),
            Err(e) => Err(VaultError::Io(e)),
        }
    }

    async fn read(&self, path: &str) -> Result<String, VaultError> {
        tokio::fs::read_to_string(self.resolve(path))
            .await
            .map_err(|e| Self::map_io(path, e))
    }

    async fn create(&self, path: &str, text: &str) -> Result<(), VaultError> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.resolve(path))
            .await
            .map_err(|e| Self::map_io(path, e))?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn modify(&self, path: &str, text: &str) -> Result<(), VaultError> {
        let full = self.resolve(path);
        if !tokio::fs::try_exists(&full).await? {
            return Err(VaultError::NotFound(path.to_string()));
        }
        tokio::fs::write(full, text)
            .await
            .map_err(|e| Self::map_io(path, e))
    }

    async fn create_binary(&self, path: &str, data: &[u8]) -> Result<(), VaultError> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.resolve(path))
            .await
            .map_err(|e| Self::map_io(path, e))?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn create_dir(&self, path: &str) -> Result<(), VaultError> {
        tokio::fs::create_dir_all(self.resolve(path)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), VaultError> {
        tokio::fs::remove_file(self.resolve(path))
            .await
            .map_err(|e| Self::map_io(path, e))
    }

    async fn open(&self, path: &str) -> Result<(), VaultError> {
        let full = self.resolve(path);
        if !self.open_documents {
            tracing::info!(path = %full.display(), "Not opening document (disabled)");
            return Ok(());
        }
        open::that(&full).map_err(VaultError::Io)
    }
}

// ── In-memory vault ─────────────────────────────────────────────

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryVault;

#[cfg(any(test, feature = "test-util"))]
mod memory {
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;

    use super::{normalize_path, parent_dir, DocumentRef, Entry, Vault};
    use crate::error::VaultError;

    #[derive(Debug, Clone)]
    enum Node {
        Text(String),
        Binary(Vec<u8>),
    }

    #[derive(Debug, Default)]
    struct State {
        files: BTreeMap<String, Node>,
        dirs: BTreeSet<String>,
        text_writes: usize,
        binary_writes: usize,
        opened: Vec<String>,
        fail_writes: bool,
    }

    /// Vault held in memory that counts writes, for tests.
    #[derive(Debug, Default)]
    pub struct MemoryVault {
        state: Mutex<State>,
    }

    impl MemoryVault {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a text document without counting it as a write.
        pub fn insert(&self, path: &str, text: &str) {
            let mut state = self.state.lock().unwrap();
            state
                .files
                .insert(normalize_path(path), Node::Text(text.to_string()));
        }

        /// Seed a binary file without counting it as a write.
        pub fn insert_binary(&self, path: &str, data: &[u8]) {
            let mut state = self.state.lock().unwrap();
            state
                .files
                .insert(normalize_path(path), Node::Binary(data.to_vec()));
        }

        pub fn text(&self, path: &str) -> Option<String> {
            let state = self.state.lock().unwrap();
            match state.files.get(&normalize_path(path)) {
                Some(Node::Text(t)) => Some(t.clone()),
                _ => None,
            }
        }

        pub fn contains(&self, path: &str) -> bool {
            self.state
                .lock()
                .unwrap()
                .files
                .contains_key(&normalize_path(path))
        }

        /// Number of `create` and `modify` calls that succeeded.
        pub fn text_writes(&self) -> usize {
            self.state.lock().unwrap().text_writes
        }

        pub fn binary_writes(&self) -> usize {
            self.state.lock().unwrap().binary_writes
        }

        pub fn opened(&self) -> Vec<String> {
            self.state.lock().unwrap().opened.clone()
        }

        /// Make every subsequent write fail with an IO error.
        pub fn fail_writes(&self, fail: bool) {
            self.state.lock().unwrap().fail_writes = fail;
        }

        fn write_guard(state: &State) -> Result<(), VaultError> {
            if state.fail_writes {
                Err(VaultError::Io(std::io::Error::other("write rejected")))
            } else {
                Ok(())
            }
        }
    }

    impl Vault for MemoryVault {
        async fn markdown_documents(&self) -> Result<Vec<DocumentRef>, VaultError> {
            let state = self.state.lock().unwrap();
            Ok(state
                .files
                .iter()
                .filter(|(path, node)| matches!(node, Node::Text(_)) && path.ends_with(".md"))
                .map(|(path, _)| DocumentRef::new(path.clone()))
                .collect())
        }

        async fn list_files(&self, dir: &str) -> Result<Vec<String>, VaultError> {
            let dir = normalize_path(dir);
            let state = self.state.lock().unwrap();
            Ok(state
                .files
                .keys()
                .filter(|path| parent_dir(path) == dir)
                .cloned()
                .collect())
        }

        async fn entry(&self, path: &str) -> Result<Entry, VaultError> {
            let path = normalize_path(path);
            let state = self.state.lock().unwrap();
            if state.files.contains_key(&path) {
                return Ok(Entry::Document);
            }
            let prefix = format!("{path}/");
            if state.dirs.contains(&path) || state.files.keys().any(|k| k.starts_with(&prefix)) {
                return Ok(Entry::Directory);
            }
            Ok(Entry::NotFound)
        }

        async fn read(&self, path: &str) -> Result<String, VaultError> {
            let key = normalize_path(path);
            let state = self.state.lock().unwrap();
            match state.files.get(&key) {
                Some(Node::Text(t)) => Ok(t.clone()),
                Some(Node::Binary(_)) => Err(VaultError::NotADocument(key)),
                None => Err(VaultError::NotFound(key)),
            }
        }

        async fn create(&self, path: &str, text: &str) -> Result<(), VaultError> {
            let key = normalize_path(path);
            let mut state = self.state.lock().unwrap();
            Self::write_guard(&state)?;
            if state.files.contains_key(&key) {
                return Err(VaultError::AlreadyExists(key));
            }
            state.files.insert(key, Node::Text(text.to_string()));
            state.text_writes += 1;
            Ok(())
        }

        async fn modify(&self, path: &str, text: &str) -> Result<(), VaultError> {
            let key = normalize_path(path);
            let mut state = self.state.lock().unwrap();
            Self::write_guard(&state)?;
            if !state.files.contains_key(&key) {
                return Err(VaultError::NotFound(key));
            }
            state.files.insert(key, Node::Text(text.to_string()));
            state.text_writes += 1;
            Ok(())
        }

        async fn create_binary(&self, path: &str, data: &[u8]) -> Result<(), VaultError> {
            let key = normalize_path(path);
            let mut state = self.state.lock().unwrap();
            Self::write_guard(&state)?;
            if state.files.contains_key(&key) {
                return Err(VaultError::AlreadyExists(key));
            }
            state.files.insert(key, Node::Binary(data.to_vec()));
            state.binary_writes += 1;
            Ok(())
        }

        async fn create_dir(&self, path: &str) -> Result<(), VaultError> {
            let mut state = self.state.lock().unwrap();
            state.dirs.insert(normalize_path(path));
            Ok(())
        }

        async fn delete(&self, path: &str) -> Result<(), VaultError> {
            let key = normalize_path(path);
            let mut state = self.state.lock().unwrap();
            state
                .files
                .remove(&key)
                .map(|_| ())
                .ok_or(VaultError::NotFound(key))
        }

        async fn open(&self, path: &str) -> Result<(), VaultError> {
            let mut state = self.state.lock().unwrap();
            state.opened.push(normalize_path(path));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/animelog//5114_x.md"), "animelog/5114_x.md");
        assert_eq!(normalize_path("attachments\\anime\\"), "attachments/anime");
        assert_eq!(normalize_path("./a/./b"), "a/b");
    }

    #[test]
    fn test_basename() {
        let doc = DocumentRef::new("animelog/5114_Fullmetal Alchemist Brotherhood.md");
        assert_eq!(doc.basename(), "5114_Fullmetal Alchemist Brotherhood");
        assert_eq!(DocumentRef::new("README").basename(), "README");
    }

    #[tokio::test]
    async fn test_fs_vault_create_read_modify() {
        let dir = TempDir::new().unwrap();
        let vault = FsVault::new(dir.path()).with_open_documents(false);

        vault.ensure_dir("animelog").await.unwrap();
        assert_eq!(vault.entry("animelog").await.unwrap(), Entry::Directory);

        vault.create("animelog/1_Test.md", "hello").await.unwrap();
        assert_eq!(vault.entry("animelog/1_Test.md").await.unwrap(), Entry::Document);
        assert_eq!(vault.read("animelog/1_Test.md").await.unwrap(), "hello");

        let err = vault.create("animelog/1_Test.md", "again").await.unwrap_err();
        assert!(matches!(err, VaultError::AlreadyExists(_)));

        vault.modify("animelog/1_Test.md", "bye").await.unwrap();
        assert_eq!(vault.read("animelog/1_Test.md").await.unwrap(), "bye");

        let err = vault.modify("animelog/2_Missing.md", "x").await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fs_vault_lists_markdown_skipping_hidden() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("animelog")).unwrap();
        std::fs::create_dir_all(dir.path().join(".obsidian")).unwrap();
        std::fs::write(dir.path().join("animelog/1_A.md"), "a").unwrap();
        std::fs::write(dir.path().join("animelog/cover.jpg"), "x").unwrap();
        std::fs::write(dir.path().join(".obsidian/workspace.md"), "x").unwrap();
        std::fs::write(dir.path().join("Inbox.md"), "x").unwrap();

        let vault = FsVault::new(dir.path());
        let mut docs = vault.markdown_documents().await.unwrap();
        docs.sort();
        let paths: Vec<&str> = docs.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["Inbox.md", "animelog/1_A.md"]);

        let files = vault.list_files("animelog").await.unwrap();
        assert_eq!(files, vec!["animelog/1_A.md", "animelog/cover.jpg"]);
        assert!(vault.list_files("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_dir_rejects_document() {
        let vault = MemoryVault::new();
        vault.insert("animelog", "not a folder");
        assert!(matches!(
            vault.ensure_dir("animelog").await,
            Err(VaultError::AlreadyExists(_))
        ));
    }
}
