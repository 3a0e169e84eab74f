//! In-process object store.
//!
//! Keeps objects in a map and mimics the parts of S3/R2 behavior the upload
//! provider depends on: overwrite-on-put, idempotent delete, and the `auto`
//! placeholder location with a bucket-prefixed key for large uploads.

use crate::traits::{
    ClientError, ClientResult, DeleteObjectRequest, ObjectBody, ObjectClient, ObjectLocation,
    PutObjectOutput, PutObjectRequest,
};
use async_trait::async_trait;
use bytes::Bytes;
use mediabucket_core::ObjectAcl;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// An object as it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
    pub acl: Option<ObjectAcl>,
    pub cache_control: Option<String>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<(String, String), StoredObject>,
    failure: Option<String>,
}

/// Map-backed `ObjectClient`.
#[derive(Debug)]
pub struct MemoryObjectClient {
    state: Mutex<State>,
    base_url: Option<String>,
    multipart_threshold: u64,
}

impl Default for MemoryObjectClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectClient {
    pub fn new() -> Self {
        MemoryObjectClient {
            state: Mutex::new(State::default()),
            base_url: None,
            multipart_threshold: 5 * 1024 * 1024,
        }
    }

    /// Report locations under `base_url` instead of the scheme-less
    /// `{bucket}.memory.local` host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Objects above this size are reported like multipart uploads.
    pub fn with_multipart_threshold(mut self, threshold: u64) -> Self {
        self.multipart_threshold = threshold;
        self
    }

    /// Make every following call fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.state().failure = Some(message.into());
    }

    pub fn clear_failure(&self) {
        self.state().failure = None;
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.state()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_failure(&self) -> ClientResult<()> {
        match self.state().failure.clone() {
            Some(message) => Err(ClientError::from(message)),
            None => Ok(()),
        }
    }

    fn location_for(&self, bucket: &str, key: &str) -> String {
        match self.base_url {
            Some(ref base) => format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key),
            None => format!("{}.memory.local/{}", bucket, key),
        }
    }
}

#[async_trait]
impl ObjectClient for MemoryObjectClient {
    async fn put_object(&self, request: PutObjectRequest) -> ClientResult<PutObjectOutput> {
        self.check_failure()?;

        let data = match request.body {
            ObjectBody::Bytes(bytes) => bytes,
            ObjectBody::Reader(mut reader) => {
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer).await?;
                Bytes::from(buffer)
            }
        };

        let size = data.len() as u64;
        let object = StoredObject {
            data,
            content_type: request.content_type,
            acl: request.acl,
            cache_control: request.cache_control,
            metadata: request.metadata,
        };
        self.state()
            .objects
            .insert((request.bucket.clone(), request.key.clone()), object);

        let output = if size > self.multipart_threshold {
            PutObjectOutput {
                key: format!("{}/{}", request.bucket, request.key),
                location: ObjectLocation::Auto,
                e_tag: None,
            }
        } else {
            PutObjectOutput {
                location: ObjectLocation::Url(self.location_for(&request.bucket, &request.key)),
                key: request.key,
                e_tag: None,
            }
        };

        Ok(output)
    }

    async fn delete_object(&self, request: DeleteObjectRequest) -> ClientResult<()> {
        self.check_failure()?;
        self.state().objects.remove(&(request.bucket, request.key));
        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> ClientResult<String> {
        self.check_failure()?;
        Ok(format!(
            "https://{}?X-Amz-Expires={}",
            self.location_for(bucket, key),
            expires_in.as_secs()
        ))
    }
}
