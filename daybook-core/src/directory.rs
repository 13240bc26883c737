//! Access to the user-chosen journal directory.
//!
//! The store only ever talks to a [`Directory`]: a flat namespace of named files plus a
//! permission handshake. [`FsDirectory`] backs it with a local folder.

use crate::error::{StoreError, StoreResult};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// The host must ask the user before granting read-write access.
    PromptRequired,
}

/// A revocable, read-write capability over one flat directory.
///
/// `read_file` returns `Ok(None)` for a missing file and `remove_file` succeeds when the
/// file is already gone; neither situation is an error at this level.
pub trait Directory: Send + Sync {
    /// Human readable location, for logs and the CLI.
    fn describe(&self) -> String;

    fn list_files(&self) -> impl Future<Output = StoreResult<Vec<String>>> + Send;

    fn read_file(&self, name: &str) -> impl Future<Output = StoreResult<Option<Vec<u8>>>> + Send;

    fn write_file(&self, name: &str, bytes: &[u8]) -> impl Future<Output = StoreResult<()>> + Send;

    fn remove_file(&self, name: &str) -> impl Future<Output = StoreResult<()>> + Send;

    fn query_permission(&self) -> impl Future<Output = Permission> + Send;

    fn request_permission(&self) -> impl Future<Output = Permission> + Send;
}

/// Lets the user pick a directory. `None` means they cancelled.
pub trait DirectoryPicker {
    type Dir: Directory;

    fn choose(&self) -> impl Future<Output = Option<Self::Dir>> + Send;
}

#[derive(Debug, Clone)]
pub struct FsDirectory {
    root: PathBuf,
}

impl FsDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> StoreResult<PathBuf> {
        if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name == "." || name == ".." {
            return Err(StoreError::storage(name, "not a plain file name"));
        }
        Ok(self.root.join(name))
    }
}

impl Directory for FsDirectory {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn list_files(&self) -> StoreResult<Vec<String>> {
        let describe = self.describe();
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::from_io(describe.clone(), e))?;
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| StoreError::from_io(describe.clone(), e))?
        {
            let is_file = item.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Ok(name) = item.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn read_file(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::from_io(name, e)),
        }
    }

    /// Writes next to the target first and renames over it, so readers see either the
    /// old or the new content.
    async fn write_file(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        let path = self.path_for(name)?;
        let staging = self.root.join(format!("{name}.new"));
        fs::write(&staging, bytes)
            .await
            .map_err(|e| StoreError::from_io(name, e))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| StoreError::from_io(name, e))
    }

    async fn remove_file(&self, name: &str) -> StoreResult<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::from_io(name, e)),
        }
    }

    async fn query_permission(&self) -> Permission {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => Permission::Granted,
            Ok(_) => Permission::Denied,
            Err(e) if e.kind() == ErrorKind::NotFound => Permission::PromptRequired,
            Err(_) => Permission::Denied,
        }
    }

    /// A missing folder is created on request; that is the filesystem's way of granting.
    async fn request_permission(&self) -> Permission {
        match self.query_permission().await {
            Permission::PromptRequired => match fs::create_dir_all(&self.root).await {
                Ok(()) => Permission::Granted,
                Err(e) => {
                    tracing::warn!(root = %self.describe(), error = %e, "could not create journal directory");
                    Permission::Denied
                }
            },
            other => other,
        }
    }
}

/// Picks a fixed folder, e.g. one named in the config or on the command line.
#[derive(Debug, Clone)]
pub struct FsPicker {
    pub path: Option<PathBuf>,
}

impl DirectoryPicker for FsPicker {
    type Dir = FsDirectory;

    async fn choose(&self) -> Option<FsDirectory> {
        self.path.clone().map(FsDirectory::new)
    }
}
