//! Cache storage backends.
//!
//! A [`Store`] is a flat key/bytes namespace. The cache layer composes a
//! [`LocalStore`] with an optional remote store and decides read order and
//! degradation policy itself; stores just move bytes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

/// A flat key-value byte store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Human-readable backend name for log lines.
    fn name(&self) -> &str;

    /// Fetch the bytes for a key, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write the bytes for a key, replacing any existing value.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// File-per-key store rooted at a cache directory.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create cache directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// List keys in the cache directory starting with `prefix`.
    pub fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read cache directory {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(prefix) {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Delete a key. Missing keys are not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove cache entry '{key}'")),
        }
    }
}

#[async_trait]
impl Store for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read cache entry '{key}'")),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        // Write-then-rename so a crash never leaves a truncated entry.
        let final_path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{key}.tmp"));
        tokio::fs::write(&tmp_path, bytes)
            .await
            .with_context(|| format!("failed to write cache entry '{key}'"))?;
        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .with_context(|| format!("failed to finalize cache entry '{key}'"))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }
}
