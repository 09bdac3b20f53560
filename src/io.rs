//! I/O managers for reading inputs and writing converted outputs

use crate::error::{Result, VolError};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Trait for whole-file I/O used by the conversion pipelines
#[async_trait]
pub trait IOManager: Send + Sync {
    /// Read the full contents of a file
    async fn read(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, replacing it
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Check if a path exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Check if a path is a directory
    async fn is_dir(&self, path: &Path) -> Result<bool>;

    /// Create a directory and its parents
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Files matching a glob pattern, sorted lexicographically
    async fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;
}

/// File system I/O manager
pub struct FileSystemIOManager {
    base_path: PathBuf,
}

impl FileSystemIOManager {
    /// Create a new file system I/O manager; relative paths resolve against `base_path`
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Manager rooted at the process working directory
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    /// Get the full path for a relative path
    fn full_path(&self, path: &Path) -> PathBuf {
        self.base_path.join(path)
    }
}

#[async_trait]
impl IOManager for FileSystemIOManager {
    async fn read(&self, path: &Path) -> Result<Bytes> {
        let full_path = self.full_path(path);
        let data = fs::read(&full_path).await.map_err(VolError::Io)?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(VolError::Io)?;
        }

        let mut file = fs::File::create(&full_path).await.map_err(VolError::Io)?;
        file.write_all(data).await.map_err(VolError::Io)?;
        file.flush().await.map_err(VolError::Io)?;
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(fs::try_exists(self.full_path(path)).await?)
    }

    async fn is_dir(&self, path: &Path) -> Result<bool> {
        match fs::metadata(self.full_path(path)).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(VolError::Io(e)),
        }
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(self.full_path(path))
            .await
            .map_err(VolError::Io)
    }

    async fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let base = glob::Pattern::escape(&self.base_path.to_string_lossy());
        let full_pattern = Path::new(&base).join(pattern);
        let mut matches = Vec::new();
        for entry in glob::glob(&full_pattern.to_string_lossy())? {
            match entry {
                Ok(path) if path.is_file() => matches.push(path),
                Ok(_) => {}
                Err(e) => log::warn!("Skipping unreadable glob match: {}", e),
            }
        }
        matches.sort();
        Ok(matches)
    }
}
