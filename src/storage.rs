use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Prefix of every post image object key.
pub const POST_IMAGE_PREFIX: &str = "post_images";

/// Upload URLs stay valid for ten minutes.
const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("failed to presign upload: {0}")]
    Presign(String),
}

/// StorageService
///
/// Object storage for post images. Clients upload straight to the bucket through a
/// presigned URL; the service only hands out URLs and records the resulting key.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the bucket if it does not exist. Called at startup in `Env::Local`.
    async fn ensure_bucket_exists(&self);

    /// Presigned PUT URL for `key`, constrained to `content_type`.
    async fn presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// S3StorageClient
///
/// AWS SDK client pointed at any S3-compatible endpoint. Path-style addressing is forced
/// because MinIO does not serve virtual-hosted buckets.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket fails harmlessly when the bucket is already there.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
    }

    async fn presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        ensure_image(content_type)?;

        let presigning =
            PresigningConfig::expires_in(UPLOAD_URL_TTL).map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(sanitize_key(key))
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(presigned_req.uri().to_string())
    }
}

/// Object key for a new post image: `post_images/<uuid>.<ext>`. The extension comes from
/// the client filename and is reduced to ASCII alphanumerics.
pub fn post_image_key(filename: &str) -> String {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(|ext| {
            ext.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "bin".to_string());
    format!("{}/{}.{}", POST_IMAGE_PREFIX, uuid::Uuid::new_v4(), extension)
}

fn ensure_image(content_type: &str) -> Result<(), StorageError> {
    if IMAGE_CONTENT_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(StorageError::UnsupportedContentType(content_type.to_string()))
    }
}

/// Drops empty, `.` and `..` segments so a key can never walk out of its prefix.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// In-process stand-in for tests and for running locally without MinIO.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, every presign request fails.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Presign("simulated failure".to_string()));
        }
        ensure_image(content_type)?;

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }
}

/// StorageState
///
/// The storage handle shared through `AppState`.
pub type StorageState = Arc<dyn StorageService>;
