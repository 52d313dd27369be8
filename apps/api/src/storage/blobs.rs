//! Photo blob storage.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;
use tracing::{info, warn};

use crate::document::PendingPhoto;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("photo upload failed: {0}")]
    Upload(String),

    #[error("photo delete failed: {0}")]
    Delete(String),
}

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Stores the payload and returns its public URL.
    async fn upload(&self, photo: &PendingPhoto) -> Result<String, BlobError>;

    async fn delete(&self, url: &str) -> Result<(), BlobError>;
}

const PHOTO_PREFIX: &str = "resume_photos";

/// Path-style public URLs: `{public_base}/{bucket}/{key}`.
pub struct S3PhotoStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base: String,
}

impl S3PhotoStorage {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base: &str) -> Self {
        Self {
            client,
            bucket,
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        public_url(&self.public_base, &self.bucket, key)
    }

    fn key_for(&self, url: &str) -> Option<String> {
        key_from_url(&self.public_base, &self.bucket, url)
    }
}

fn public_url(base: &str, bucket: &str, key: &str) -> String {
    format!("{base}/{bucket}/{key}")
}

/// `None` for URLs that do not point into our bucket.
fn key_from_url(base: &str, bucket: &str, url: &str) -> Option<String> {
    url.strip_prefix(&format!("{base}/{bucket}/"))
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

/// Object key for a pending photo, keeping the uploaded file's extension.
pub fn photo_key(photo: &PendingPhoto) -> String {
    let extension = photo
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!("{PHOTO_PREFIX}/{}{extension}", photo.token)
}

#[async_trait]
impl PhotoStorage for S3PhotoStorage {
    async fn upload(&self, photo: &PendingPhoto) -> Result<String, BlobError> {
        let key = photo_key(photo);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&photo.content_type)
            .body(ByteStream::from(photo.bytes.clone()))
            .send()
            .await
            .map_err(|e| BlobError::Upload(e.to_string()))?;

        info!("Uploaded photo to s3://{}/{}", self.bucket, key);
        Ok(self.url_for(&key))
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let Some(key) = self.key_for(url) else {
            warn!("Not deleting photo outside bucket {}: {url}", self.bucket);
            return Ok(());
        };
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| BlobError::Delete(e.to_string()))?;

        info!("Deleted photo s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
