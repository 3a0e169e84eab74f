//! Storage client abstraction
//!
//! `ObjectClient` is the narrow capability the upload provider needs from an
//! object store: put, delete and presigned GET. Everything else (auth,
//! signing, retries, multipart orchestration) stays inside the client.

use async_trait::async_trait;
use bytes::Bytes;
use mediabucket_core::{ByteReader, ObjectAcl};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error type returned by storage clients, wrapped verbatim by the provider.
pub type ClientError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for storage client calls
pub type ClientResult<T> = Result<T, ClientError>;

/// Upload provider errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed for {key}: {source}")]
    UploadFailed {
        key: String,
        #[source]
        source: ClientError,
    },

    #[error("Delete failed for {key}: {source}")]
    DeleteFailed {
        key: String,
        #[source]
        source: ClientError,
    },

    #[error("Signing failed for {key}: {source}")]
    SigningFailed {
        key: String,
        #[source]
        source: ClientError,
    },

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for provider operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Request payload.
pub enum ObjectBody {
    Bytes(Bytes),
    Reader(ByteReader),
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectBody::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            ObjectBody::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

#[derive(Debug)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: ObjectBody,
    pub content_type: Option<String>,
    pub acl: Option<ObjectAcl>,
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl PutObjectRequest {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, body: ObjectBody) -> Self {
        PutObjectRequest {
            bucket: bucket.into(),
            key: key.into(),
            body,
            content_type: None,
            acl: None,
            cache_control: None,
            content_disposition: None,
            content_encoding: None,
            metadata: HashMap::new(),
        }
    }
}

/// Where the store says an uploaded object lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectLocation {
    Url(String),
    /// Placeholder reported for multipart uploads (R2 answers `"auto"`).
    Auto,
}

impl ObjectLocation {
    pub const PLACEHOLDER: &'static str = "auto";

    /// Interpret a location string as returned by the store.
    pub fn from_reported(location: Option<&str>) -> Self {
        match location {
            Some(value) if !value.is_empty() && value != Self::PLACEHOLDER => {
                ObjectLocation::Url(value.to_string())
            }
            _ => ObjectLocation::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// Key as reported back by the store. Multipart uploads to R2 may
    /// prepend the bucket name.
    pub key: String,
    pub location: ObjectLocation,
    pub e_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteObjectRequest {
    pub bucket: String,
    pub key: String,
    pub version_id: Option<String>,
}

/// Object storage capability used by the upload provider.
///
/// Implementations must be safe to share between concurrent operations.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Store an object, replacing any previous object under the same key.
    async fn put_object(&self, request: PutObjectRequest) -> ClientResult<PutObjectOutput>;

    /// Delete an object. Deleting a missing key succeeds.
    async fn delete_object(&self, request: DeleteObjectRequest) -> ClientResult<()>;

    /// Generate a presigned GET URL valid for `expires_in`.
    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration)
        -> ClientResult<String>;
}
