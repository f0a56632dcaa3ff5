use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// StorageError
///
/// The one way a write can fail. Surfaces to the client as a 502 through `AppError::Upstream`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of {key} failed: {reason}")]
    Upload { key: String, reason: String },
}

// 1. StorageService Contract
/// StorageService
///
/// Write-only contract for resume files. Implementations pick the object key; callers treat it
/// as an opaque reference. There is no read or delete path. Production uses
/// [`S3StorageClient`]; tests swap in [`MockStorageService`] without touching the callers.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in the `Env::Local` setup to provision the MinIO
    /// bucket. No-op where the bucket is managed externally.
    async fn ensure_bucket_exists(&self);

    /// Stores `bytes` and returns the key they were written under.
    ///
    /// # Arguments
    /// * `suggested_name`: the client's file name; only its final path segment survives.
    /// * `content_type`: the MIME type recorded on the object.
    async fn store(
        &self,
        bytes: Vec<u8>,
        suggested_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

// 2. Object Keys
/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`, empty segments) from a user-provided key.
fn sanitize_key(key: &str) -> String {
    key.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// resume_key
///
/// `resumes/<uuid>_<file name>`. The UUID prefix keeps two uploads of `cv.pdf` apart.
pub fn resume_key(suggested_name: &str) -> String {
    let sanitized = sanitize_key(suggested_name);
    let file_name = sanitized
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("resume");

    format!("resumes/{}_{}", Uuid::new_v4(), file_name)
}

// 3. The Real Implementation (S3/MinIO)

/// S3StorageClient
///
/// Resume storage on any S3-compatible endpoint (MinIO locally, a managed bucket in production).
/// `force_path_style(true)` is required by MinIO.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    /// new
    ///
    /// Builds the client from the endpoint and static credentials resolved by `AppConfig`.
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
            // Path-style addressing (http://endpoint/bucket/key); MinIO has no virtual hosts.
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
    /// ensure_bucket_exists
    ///
    /// Calls CreateBucket and only logs the outcome. Safe to call on every local startup.
    async fn ensure_bucket_exists(&self) {
        // CreateBucket on an existing bucket fails harmlessly.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!("create_bucket {}: {:?}", self.bucket_name, e);
        }
    }

    /// store
    ///
    /// One PutObject under a fresh `resumes/` key, with the client's content type attached.
    async fn store(
        &self,
        bytes: Vec<u8>,
        suggested_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = resume_key(suggested_name);

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(%key, "resume stored");
        Ok(key)
    }
}

// 4. The Mock Implementation (tests)

/// StoredObject
///
/// What the mock captured for a single `store` call.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// MockStorageService
///
/// In-memory `StorageService` for tests. Keeps every stored object so tests can assert on what
/// was written (including objects leaked by a failed apply).
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, every `store` fails.
    pub should_fail: bool,
    objects: Arc<Mutex<Vec<StoredObject>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose every `store` fails, for the upstream-error paths.
    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of everything stored so far, in call order.
    pub async fn stored(&self) -> Vec<StoredObject> {
        self.objects.lock().await.clone()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn store(
        &self,
        bytes: Vec<u8>,
        suggested_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = resume_key(suggested_name);

        // The key is still generated so failures look like the real client's.
        if self.should_fail {
            return Err(StorageError::Upload {
                key,
                reason: "Mock Storage Error: Simulation requested".to_string(),
            });
        }

        self.objects.lock().await.push(StoredObject {
            key: key.clone(),
            content_type: content_type.to_string(),
            bytes,
        });
        Ok(key)
    }
}

/// StorageState
///
/// The shared handle to file storage held in the application state.
pub type StorageState = Arc<dyn StorageService>;
