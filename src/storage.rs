use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Publicly served directory holding uploaded images.
///
/// Paths handed out and accepted by the disk are relative to `root`, e.g.
/// `predictions/3f2a....jpg`, and are the values stored in the database.
#[derive(Debug, Clone)]
pub struct PublicDisk {
    root: PathBuf,
    public_url: String,
}

impl PublicDisk {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under `dir` with a random file name and returns the relative path.
    pub async fn put(&self, dir: &str, extension: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let relative = format!("{}/{}.{}", dir, Uuid::new_v4().simple(), extension);
        let full = self.resolve(&relative)?;

        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, bytes).await?;

        debug!("Stored {} bytes at {}", bytes.len(), relative);
        Ok(relative)
    }

    pub async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(full).await?)
    }

    /// Deletes the file if present. Returns whether a file was removed.
    pub async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => {
                debug!("Deleted {}", path);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.public_url, path.trim_start_matches('/'))
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_exists_delete() {
        let dir = tempfile::tempdir().unwrap();
        let disk = PublicDisk::new(dir.path(), "http://localhost/storage");

        let path = disk.put("predictions", "png", b"leaf").await.unwrap();
        assert!(path.starts_with("predictions/"));
        assert!(path.ends_with(".png"));
        assert!(disk.exists(&path).await.unwrap());

        assert!(disk.delete(&path).await.unwrap());
        assert!(!disk.exists(&path).await.unwrap());
        assert!(!disk.delete(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let disk = PublicDisk::new(dir.path(), "http://localhost/storage");

        for path in ["../secret", "/etc/passwd", "predictions/../../x", ""] {
            assert!(matches!(
                disk.delete(path).await,
                Err(StorageError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_url() {
        let disk = PublicDisk::new("/tmp", "http://localhost:8081/storage/");
        assert_eq!(
            disk.url("predictions/a.jpg"),
            "http://localhost:8081/storage/predictions/a.jpg"
        );
    }
}
