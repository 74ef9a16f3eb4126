//! File storage for public assets and upload staging.
//!
//! Keys are relative, `/`-separated paths such as `posts/cover.png`. Every
//! key is checked before it touches the filesystem so a client-supplied file
//! name can never escape the storage root.

use std::path::{Component, Path, PathBuf};

use crate::{AppError, AppResult};

/// Metadata of a file written to storage.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Storage key.
    pub key: String,
    /// Absolute or root-relative path on disk.
    pub path: PathBuf,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write a file, replacing any existing one.
    async fn put(&self, key: &str, data: &[u8]) -> AppResult<StoredFile>;

    /// Read a file. Returns `None` when it does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Delete a file. Deleting a missing file is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    /// Root directory of this storage.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a key to a path under the storage root.
    pub fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn put(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        tracing::debug!(key = %key, size = data.len(), "Stored file");

        Ok(StoredFile {
            key: key.to_string(),
            path,
            url: self.public_url(key),
            size: data.len() as u64,
        })
    }

    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("Failed to read file: {e}"))),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {e}"))),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat file: {e}")))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// Reject keys that are empty, absolute, or contain `..` components.
pub fn validate_key(key: &str) -> AppResult<()> {
    if key.is_empty() || key.contains('\\') || key.contains('\0') {
        return Err(AppError::BadRequest("Nom de fichier invalide".to_string()));
    }

    let valid = Path::new(key)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));

    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest("Nom de fichier invalide".to_string()))
    }
}

/// Reduce a client-supplied file name to a single safe path segment.
#[must_use]
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return None;
    }
    Some(base.to_string())
}
