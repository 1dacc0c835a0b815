//! Real file system implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use relay_application::ports::{FileSystem, FileSystemError};
use tokio::fs;

/// Real file system implementation using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Creates a new `TokioFileSystem`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn map_io(path: &Path, error: std::io::Error) -> FileSystemError {
    match error.kind() {
        ErrorKind::NotFound => FileSystemError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => FileSystemError::PermissionDenied(path.to_path_buf()),
        ErrorKind::AlreadyExists => FileSystemError::AlreadyExists(path.to_path_buf()),
        _ => FileSystemError::Io(error),
    }
}

impl FileSystem for TokioFileSystem {
    async fn read_file_string(&self, path: &Path) -> Result<String, FileSystemError> {
        fs::read_to_string(path).await.map_err(|e| map_io(path, e))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileSystemError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io(parent, e))?;
        }
        fs::write(path, contents).await.map_err(|e| map_io(path, e))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), FileSystemError> {
        fs::create_dir_all(path).await.map_err(|e| map_io(path, e))
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok()
    }

    async fn is_dir(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok_and(|m| m.is_dir())
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(path).await.map_err(|e| map_io(path, e))?;

        while let Some(entry) = dir.next_entry().await? {
            entries.push(entry.path());
        }

        entries.sort();
        Ok(entries)
    }

    async fn remove_file(&self, path: &Path) -> Result<(), FileSystemError> {
        fs::remove_file(path).await.map_err(|e| map_io(path, e))
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<(), FileSystemError> {
        fs::remove_dir_all(path).await.map_err(|e| map_io(path, e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parents_and_reads_back() {
        let temp = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();
        let path = temp.path().join("a/b/c.json");

        fs.write_file(&path, b"{}").await.unwrap();

        assert!(fs.exists(&path).await);
        assert!(fs.is_dir(&temp.path().join("a/b")).await);
        assert_eq!(fs.read_file_string(&path).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_read_dir_is_sorted() {
        let temp = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();
        for name in ["b.json", "a.json", "c"] {
            fs.write_file(&temp.path().join(name), b"").await.unwrap();
        }

        let names: Vec<_> = fs
            .read_dir(temp.path())
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.json", "b.json", "c"]);
    }

    #[tokio::test]
    async fn test_missing_file_maps_to_not_found() {
        let temp = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();
        let missing = temp.path().join("nope.json");

        let result = fs.read_file_string(&missing).await;

        assert!(matches!(result, Err(FileSystemError::NotFound(p)) if p == missing));
    }
}
