//! Object storage for uploaded clips.
//!
//! Clips land in a public, S3-compatible bucket addressed virtual-host style
//! (`https://{bucket}.{endpoint-host}/{key}`); that public URL is what the
//! video platform later fetches the media from.

use std::sync::Arc;

use bytes::Bytes;

use crate::{AppError, AppResult};
#[cfg(feature = "s3")]
use crate::config::StorageConfig;

/// Uploaded object metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    /// Object key within the bucket (without the configured prefix).
    pub key: String,
    /// Public URL to fetch the object.
    pub url: String,
    /// Object size in bytes.
    pub size: u64,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under `key` with public-read access.
    ///
    /// Returns only after the store acknowledged every byte.
    async fn upload(&self, key: &str, data: Bytes, content_type: &str)
    -> AppResult<UploadedObject>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Shared handle to the configured storage backend.
pub type StorageService = Arc<dyn StorageBackend>;

/// S3-compatible object storage backend.
#[cfg(feature = "s3")]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base: String,
    prefix: Option<String>,
}

#[cfg(feature = "s3")]
impl S3Storage {
    /// Create a new S3 storage backend.
    pub fn new(config: &StorageConfig) -> AppResult<Self> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        let public_base = match &config.public_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => virtual_host_base(&config.endpoint, &config.bucket)?,
        };

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "lostsons",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(false)
            .build();

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_base,
            prefix: config.prefix.clone(),
        })
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
            None => key.to_string(),
        }
    }
}

#[cfg(feature = "s3")]
#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> AppResult<UploadedObject> {
        use aws_sdk_s3::error::DisplayErrorContext;
        use aws_sdk_s3::primitives::ByteStream;
        use aws_sdk_s3::types::ObjectCannedAcl;

        let full_key = self.full_key(key);
        let size = data.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(content_type)
            .content_length(i64::try_from(size).unwrap_or(i64::MAX))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| AppError::UploadFailed(format!("{}", DisplayErrorContext(e))))?;

        tracing::debug!(bucket = %self.bucket, key = %full_key, size, "Stored object");

        Ok(UploadedObject {
            key: key.to_string(),
            url: self.public_url(key),
            size,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        use aws_sdk_s3::error::DisplayErrorContext;

        let full_key = self.full_key(key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(|e| {
                AppError::Internal(format!("S3 delete failed: {}", DisplayErrorContext(e)))
            })?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, self.full_key(key))
    }
}

/// Public base URL of a bucket under virtual-host addressing.
///
/// `https://sfo3.digitaloceanspaces.com` + `lostsonstv` gives
/// `https://lostsonstv.sfo3.digitaloceanspaces.com`.
pub fn virtual_host_base(endpoint: &str, bucket: &str) -> AppResult<String> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| AppError::Config(format!("invalid storage endpoint {endpoint}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| AppError::Config(format!("storage endpoint {endpoint} has no host")))?;

    Ok(match url.port() {
        Some(port) => format!("{}://{bucket}.{host}:{port}", url.scheme()),
        None => format!("{}://{bucket}.{host}", url.scheme()),
    })
}

/// Generate the storage key for an uploaded clip.
///
/// Keys are `{yyyy}/{mm}/{dd}/{token}/{filename}` so that two uploads with the
/// same original filename never overwrite each other.
#[must_use]
pub fn generate_clip_key(token: &str, original_name: &str) -> String {
    let date_path = chrono::Utc::now().format("%Y/%m/%d");
    format!("{date_path}/{token}/{}", sanitize_filename(original_name))
}

fn sanitize_filename(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "clip".to_string()
    } else {
        cleaned.to_string()
    }
}
