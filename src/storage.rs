//! Durable label-artifact storage.
//!
//! The host ERP provides the real file facility; the trait keeps the
//! converter testable and lets deployments swap in remote stores.

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A persisted label artifact.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    /// Absolute, access-controlled URL the host can persist and print from.
    pub url: String,
}

/// Store bytes privately and hand back a URL; read bytes back by URL.
///
/// Artifacts are write-once: every `store` call gets a fresh name, nothing
/// is overwritten or deduplicated.
#[async_trait]
pub trait LabelStore: Send + Sync {
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<StoredFile>;

    /// Read a previously stored artifact back. Errors when the URL is not
    /// one of ours.
    async fn read(&self, url: &str) -> Result<Vec<u8>>;

    /// Whether the URL points into this store rather than at a remote
    /// carrier-hosted asset.
    fn is_internal(&self, url: &str) -> bool;
}

/// Stores labels under a private directory on local disk, addressed through
/// the site URL.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    files_dir: PathBuf,
    public_base: String,
}

impl LocalFileStore {
    pub fn new(files_dir: impl Into<PathBuf>, site_url: &str) -> Self {
        Self {
            files_dir: files_dir.into(),
            public_base: site_url.trim_end_matches('/').to_string(),
        }
    }

    /// File name for an internal URL, accepting both the absolute form and
    /// the site-relative `/private/files/...` form.
    fn file_name_of<'a>(&self, url: &'a str) -> Option<&'a str> {
        let relative = url
            .strip_prefix(&self.public_base)
            .unwrap_or(url);
        relative.strip_prefix("/private/files/")
    }
}

#[async_trait]
impl LabelStore for LocalFileStore {
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<StoredFile> {
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::create_dir_all(&self.files_dir).await?;
        tokio::fs::write(self.files_dir.join(&file_name), bytes).await?;
        let url = format!("{}/private/files/{}", self.public_base, file_name);
        Ok(StoredFile { file_name, url })
    }

    async fn read(&self, url: &str) -> Result<Vec<u8>> {
        let file_name = self
            .file_name_of(url)
            .ok_or_else(|| Error::Storage(format!("not an internal file URL: {url}")))?;
        Ok(tokio::fs::read(self.files_dir.join(file_name)).await?)
    }

    fn is_internal(&self, url: &str) -> bool {
        self.file_name_of(url).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LocalFileStore {
        LocalFileStore::new("/tmp/labels", "https://erp.example.com/")
    }

    #[test]
    fn internal_urls_are_recognized_absolute_and_relative() {
        let store = store();
        assert!(store.is_internal("https://erp.example.com/private/files/a.png"));
        assert!(store.is_internal("/private/files/a.png"));
        assert!(!store.is_internal("https://carrier.example.com/label.png"));
        assert!(!store.is_internal("https://erp.example.com/public/a.png"));
    }

    #[tokio::test]
    async fn store_and_read_round_trip() {
        let dir = std::env::temp_dir().join(format!("label-store-{}", Uuid::new_v4()));
        let store = LocalFileStore::new(&dir, "https://erp.example.com");

        let stored = store.store(b"^XA^XZ", "zpl").await.unwrap();
        assert!(stored.url.starts_with("https://erp.example.com/private/files/"));
        assert!(stored.url.ends_with(".zpl"));

        let bytes = store.read(&stored.url).await.unwrap();
        assert_eq!(bytes, b"^XA^XZ");

        // Two stores of the same bytes are distinct artifacts.
        let again = store.store(b"^XA^XZ", "zpl").await.unwrap();
        assert_ne!(again.url, stored.url);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
