//! File store rooted at a mount directory. Paths are `/`-separated and always resolved inside the
//! root; `..` components are rejected.

use std::fmt::Write;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::kind::{FileKind, SUPPORTED_EXTENSIONS};

/// One directory entry as reported by [`FileStore::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub kind: Option<FileKind>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Mounts the store at `root`, creating the directory when missing.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        if !fs::metadata(&root).await?.is_dir() {
            return Err(StorageError::NotADirectory(root.display().to_string()));
        }
        info!(root = %root.display(), "file store mounted");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn supported_extensions(&self) -> &'static str {
        SUPPORTED_EXTENSIONS
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(StorageError::InvalidPath(path.to_string()))
                }
            }
        }
        Ok(resolved)
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path)?;
        let data = fs::read(&full).await.map_err(|e| not_found_or(e, path))?;
        debug!(path, bytes = data.len(), "read");
        Ok(data)
    }

    pub async fn read_text(&self, path: &str) -> Result<String, StorageError> {
        let data = self.read(path).await?;
        String::from_utf8(data).map_err(|_| StorageError::Encoding(path.to_string()))
    }

    /// Writes `data` to `path`, replacing any previous content and creating parent directories.
    pub async fn record(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, data).await?;
        debug!(path, bytes = data.len(), "recorded");
        Ok(())
    }

    /// Appends `data` to `path`, creating the file when missing.
    pub async fn append(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&full)
            .await
            .map_err(|e| not_found_or(e, path))?;
        file.write_all(data).await?;
        file.flush().await?;
        debug!(path, bytes = data.len(), "appended");
        Ok(())
    }

    /// Removes a file or an empty directory.
    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if full == self.root {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let meta = fs::metadata(&full).await.map_err(|e| not_found_or(e, path))?;
        if meta.is_dir() {
            fs::remove_dir(&full).await?;
        } else {
            fs::remove_file(&full).await?;
        }
        debug!(path, dir = meta.is_dir(), "deleted");
        Ok(())
    }

    pub async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full) => fs::try_exists(&full).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Entries of directory `path`, sorted by name.
    pub async fn entries(&self, path: &str) -> Result<Vec<EntryInfo>, StorageError> {
        let full = self.resolve(path)?;
        let meta = fs::metadata(&full).await.map_err(|e| not_found_or(e, path))?;
        if !meta.is_dir() {
            return Err(StorageError::NotADirectory(path.to_string()));
        }

        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&full).await?;
        while let Some(entry) = dir.next_entry().await? {
            let meta = entry.metadata().await?;
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(EntryInfo {
                kind: if meta.is_dir() { None } else { FileKind::from_path(&name) },
                is_dir: meta.is_dir(),
                size: if meta.is_dir() { 0 } else { meta.len() },
                name,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Human-readable listing of directory `path`.
    pub async fn list(&self, path: &str) -> Result<String, StorageError> {
        let entries = self.entries(path).await?;
        let mut out = format!("Directory: {}\n====================\n", path);
        for entry in &entries {
            if entry.is_dir {
                let _ = writeln!(out, "{}/ [DIR]", entry.name);
            } else {
                let _ = writeln!(out, "{} [{} bytes]", entry.name, entry.size);
            }
        }
        Ok(out)
    }
}

fn not_found_or(err: std::io::Error, path: &str) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(path.to_string())
    } else {
        StorageError::Io(err)
    }
}
