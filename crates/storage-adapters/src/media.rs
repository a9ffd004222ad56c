//! # Media store
//!
//! Local filesystem implementation of `FileStore`. Uploads are stored
//! content-addressed under their SHA-256 hash with two-level directory
//! sharding, which deduplicates identical files for free.

use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;

use domains::ports::{FileStore, StoredFile};
use domains::{DomainError, Result};

pub struct LocalFileStore {
    /// Root directory for all uploads (e.g. "./data/media")
    root_path: PathBuf,
    /// Public URL prefix (e.g. "/media")
    url_prefix: String,
}

impl LocalFileStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self {
            root_path: root,
            url_prefix,
        }
    }

    /// Sharded path: "ab/cd/ef...hash"
    fn sharded_path(&self, hash: &str) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push(&hash[0..2]);
        path.push(&hash[2..4]);
        path.push(hash);
        path
    }

    fn public_url(&self, hash: &str) -> String {
        format!("{}/{}/{}/{}", self.url_prefix, &hash[0..2], &hash[2..4], hash)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(
        &self,
        data: Vec<u8>,
        file_name: &str,
        content_type: &mime::Mime,
    ) -> Result<StoredFile> {
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let hash = hex::encode(hasher.finalize());

        let target = self.sharded_path(&hash);
        let parent = target
            .parent()
            .ok_or_else(|| DomainError::internal("media root has no parent"))?;
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DomainError::internal(e))?;

        // Identical content already on disk means nothing to write.
        if fs::metadata(&target).await.is_err() {
            fs::write(&target, &data)
                .await
                .map_err(|e| DomainError::internal(e))?;
        }
        tracing::debug!(%hash, file_name, content_type = %content_type, "upload stored");

        Ok(StoredFile {
            id: hash.clone(),
            url: self.public_url(&hash),
        })
    }
}
