//! Blob storage for uploaded images.
//!
//! Blobs live on the local filesystem under a root directory and are read
//! back through signed URLs: `/files/{path}?expires={unix}&signature={sig}`
//! where `sig` is unpadded URL-safe base64 of HMAC-SHA256 over `path` and
//! `expires`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{TimeZone, Utc};
use constant_time_eq::constant_time_eq;
use hmac_sha256::HMAC;
use std::path::{Component, Path, PathBuf};

/// Signed URLs are effectively permanent: they expire on 2500-03-01.
fn far_future_expiry() -> i64 {
    Utc.with_ymd_and_hms(2500, 3, 1, 0, 0, 0)
        .single()
        .map(|dt| dt.timestamp())
        .unwrap_or(i64::MAX)
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub root: PathBuf,
    pub public_base_url: String,
    pub signing_secret: String,
}

/// Result of a successful write
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub path: String,
    pub url: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    public_base_url: String,
    signing_secret: String,
}

/// Reject absolute paths, traversal and characters that could escape the root
pub fn validate_blob_path(path: &str) -> Result<(), StorageError> {
    let invalid = || StorageError::InvalidPath(path.to_string());

    if path.is_empty() || path.contains('\\') || path.contains('\0') {
        return Err(invalid());
    }
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) => {}
            _ => return Err(invalid()),
        }
    }
    Ok(())
}

impl BlobStore {
    pub fn new(config: BlobConfig) -> Self {
        Self {
            root: config.root,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            signing_secret: config.signing_secret,
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_blob_path(path)?;
        Ok(self.root.join(path))
    }

    pub async fn put(&self, path: &str, bytes: &[u8]) -> Result<StoredBlob, StorageError> {
        let file_path = self.resolve(path)?;
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file_path, bytes).await?;

        tracing::info!(path = %path, size = bytes.len(), "blob stored");

        Ok(StoredBlob {
            path: path.to_string(),
            url: self.signed_url(path),
            size: bytes.len(),
        })
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let file_path = self.resolve(path)?;
        match tokio::fs::read(&file_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let file_path = self.resolve(path)?;
        match tokio::fs::remove_file(&file_path).await {
            Ok(()) => {
                tracing::info!(path = %path, "blob deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn signature(&self, path: &str, expires: i64) -> String {
        let message = format!("{}\n{}", path, expires);
        let mac = HMAC::mac(message.as_bytes(), self.signing_secret.as_bytes());
        URL_SAFE_NO_PAD.encode(mac)
    }

    pub fn signed_url(&self, path: &str) -> String {
        let expires = far_future_expiry();
        format!(
            "{}/files/{}?expires={}&signature={}",
            self.public_base_url,
            path,
            expires,
            self.signature(path, expires)
        )
    }

    /// True when the signature matches and the expiry has not passed
    pub fn verify(&self, path: &str, expires: i64, signature: &str) -> bool {
        if expires < Utc::now().timestamp() {
            return false;
        }
        let expected = self.signature(path, expires);
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }
}

/// Content type for a stored blob, from its extension
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
