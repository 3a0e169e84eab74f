//! Upload provider
//!
//! Binds a storage client to the provider configuration and implements the
//! operations the host calls: upload, stream upload, delete, signed URL and
//! the private-bucket check.

use crate::keys::{object_key, ObjectKey};
use crate::location::resolve_public_url;
use crate::overrides::{DeleteOverrides, PutOverrides};
use crate::traits::{
    DeleteObjectRequest, ObjectBody, ObjectClient, PutObjectRequest, StorageError, StorageResult,
};
use mediabucket_core::{FileBody, ObjectAcl, ProviderConfig, UploadFile};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lifetime of URLs returned by [`UploadProvider::get_signed_url`].
pub const SIGNED_URL_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Temporary read URL for an object in a private bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub url: String,
}

/// Object storage upload provider.
///
/// Holds no per-call state; clones share the same client.
#[derive(Clone)]
pub struct UploadProvider {
    client: Arc<dyn ObjectClient>,
    bucket: String,
    acl: Option<ObjectAcl>,
    public_access_url: Option<String>,
    pool: bool,
}

impl UploadProvider {
    pub fn new(client: Arc<dyn ObjectClient>, config: &ProviderConfig) -> Self {
        UploadProvider {
            client,
            bucket: config.bucket().to_string(),
            acl: config.acl().cloned(),
            public_access_url: config.public_access_url().map(String::from),
            pool: config.pool,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key an upload or delete of `file` targets.
    pub fn key_for(&self, file: &UploadFile) -> ObjectKey {
        object_key(file, self.pool)
    }

    /// Whether objects are stored with the `private` ACL and need signed URLs.
    pub fn is_private(&self) -> bool {
        self.acl.as_ref().is_some_and(ObjectAcl::is_private)
    }

    /// Upload `file` and set `file.url` to its public URL.
    pub async fn upload(&self, file: &mut UploadFile, overrides: PutOverrides) -> StorageResult<()> {
        self.put_file(file, overrides, "upload").await
    }

    /// Same contract as [`upload`](Self::upload); the host calls this for
    /// streamed bodies. A stream body is consumed either way.
    pub async fn upload_stream(
        &self,
        file: &mut UploadFile,
        overrides: PutOverrides,
    ) -> StorageResult<()> {
        self.put_file(file, overrides, "upload_stream").await
    }

    async fn put_file(
        &self,
        file: &mut UploadFile,
        overrides: PutOverrides,
        operation: &'static str,
    ) -> StorageResult<()> {
        let ObjectKey { key, .. } = self.key_for(file);

        let body = match file.take_body() {
            FileBody::Stream(reader) => ObjectBody::Reader(reader),
            FileBody::Buffer(bytes) => ObjectBody::Bytes(bytes),
            FileBody::Empty => {
                return Err(StorageError::InvalidFile(format!(
                    "{} has neither a buffer nor a stream",
                    key
                )))
            }
        };

        let mut request = PutObjectRequest::new(self.bucket.clone(), key.clone(), body);
        request.acl = self.acl.clone();
        request.content_type = file.mime.clone();
        overrides.apply(&mut request);
        let bucket = request.bucket.clone();

        let start = Instant::now();

        let output = self.client.put_object(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                operation,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed {
                key: key.clone(),
                source: e,
            }
        })?;

        let url = resolve_public_url(&output, &self.bucket, self.public_access_url.as_deref())
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    reported_key = %output.key,
                    "Uploaded object has no usable URL"
                );
            })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            url = %url,
            size_bytes = file.size,
            operation,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        file.url = Some(url);
        Ok(())
    }

    /// Delete the object an upload of `file` would have written.
    pub async fn delete(&self, file: &UploadFile, overrides: DeleteOverrides) -> StorageResult<()> {
        let ObjectKey { key, .. } = self.key_for(file);
        let mut request = DeleteObjectRequest {
            bucket: self.bucket.clone(),
            key: key.clone(),
            version_id: None,
        };
        overrides.apply(&mut request);
        let bucket = request.bucket.clone();

        let start = Instant::now();

        self.client.delete_object(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object delete failed"
            );
            StorageError::DeleteFailed {
                key: key.clone(),
                source: e,
            }
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object delete successful"
        );

        Ok(())
    }

    /// Presigned GET URL for `file`, valid for [`SIGNED_URL_EXPIRY`].
    pub async fn get_signed_url(&self, file: &UploadFile) -> StorageResult<SignedUrl> {
        let ObjectKey { key, .. } = self.key_for(file);

        let url = self
            .client
            .presign_get(&self.bucket, &key, SIGNED_URL_EXPIRY)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "Presigning failed"
                );
                StorageError::SigningFailed {
                    key: key.clone(),
                    source: e,
                }
            })?;

        tracing::debug!(bucket = %self.bucket, key = %key, "Presigned GET URL generated");

        Ok(SignedUrl { url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryObjectClient;
    use bytes::Bytes;
    use mediabucket_core::ByteReader;

    fn setup(config: ProviderConfig) -> (Arc<MemoryObjectClient>, UploadProvider) {
        let client = Arc::new(MemoryObjectClient::new());
        let provider = UploadProvider::new(client.clone(), &config);
        (client, provider)
    }

    fn png(hash: &str) -> UploadFile {
        UploadFile::new(hash, ".png")
            .with_mime("image/png")
            .with_buffer(Bytes::from_static(b"\x89PNG"))
    }

    #[tokio::test]
    async fn upload_stores_object_and_sets_url() {
        let mut config = ProviderConfig::new("media");
        config.params.acl = Some(ObjectAcl::PublicRead);
        let (client, provider) = setup(config);

        let mut file = png("cat_1").with_path("thumb").with_folder_path("/a/b");
        provider.upload(&mut file, PutOverrides::default()).await.unwrap();

        let stored = client.get("media", "a/b/thumb/cat_1.png").unwrap();
        assert_eq!(stored.data, Bytes::from_static(b"\x89PNG"));
        assert_eq!(stored.content_type.as_deref(), Some("image/png"));
        assert_eq!(stored.acl, Some(ObjectAcl::PublicRead));
        assert_eq!(
            file.url.as_deref(),
            Some("https://media.memory.local/a/b/thumb/cat_1.png")
        );
    }

    #[tokio::test]
    async fn public_access_url_overrides_location() {
        let mut config = ProviderConfig::new("media");
        config.cloudflare_public_access_url = Some("https://cdn.example.com/".to_string());
        let (_, provider) = setup(config);

        let mut file = png("cat_2");
        provider.upload(&mut file, PutOverrides::default()).await.unwrap();
        assert_eq!(file.url.as_deref(), Some("https://cdn.example.com/cat_2.png"));
    }

    #[tokio::test]
    async fn stream_upload_consumes_reader() {
        let mut config = ProviderConfig::new("media");
        config.cloudflare_public_access_url = Some("https://cdn.example.com".to_string());
        let (client, provider) = setup(config);

        let reader: ByteReader = Box::pin(std::io::Cursor::new(b"streamed".to_vec()));
        let mut file = UploadFile::new("doc", ".txt").with_stream(reader, Some(8));
        provider
            .upload_stream(&mut file, PutOverrides::default())
            .await
            .unwrap();

        assert!(file.body.is_empty());
        assert_eq!(client.get("media", "doc.txt").unwrap().data, Bytes::from_static(b"streamed"));
        assert_eq!(file.url.as_deref(), Some("https://cdn.example.com/doc.txt"));
    }

    #[tokio::test]
    async fn large_upload_strips_bucket_from_reported_key() {
        let mut config = ProviderConfig::new("media");
        config.cloudflare_public_access_url = Some("https://cdn.example.com".to_string());
        let client = Arc::new(MemoryObjectClient::new().with_multipart_threshold(2));
        let provider = UploadProvider::new(client.clone(), &config);

        let mut file = png("big").with_path("large");
        provider.upload(&mut file, PutOverrides::default()).await.unwrap();

        assert!(client.get("media", "large/big.png").is_some());
        assert_eq!(file.url.as_deref(), Some("https://cdn.example.com/large/big.png"));
    }

    #[tokio::test]
    async fn large_upload_without_public_url_is_config_error() {
        let client = Arc::new(MemoryObjectClient::new().with_multipart_threshold(2));
        let provider = UploadProvider::new(client, &ProviderConfig::new("media"));

        let mut file = png("big");
        let err = provider
            .upload(&mut file, PutOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
        assert!(file.url.is_none());
    }

    #[tokio::test]
    async fn failed_upload_propagates_and_leaves_url_unset() {
        let (client, provider) = setup(ProviderConfig::new("media"));
        client.fail_with("NoSuchBucket");

        let mut file = png("cat_3");
        let err = provider
            .upload(&mut file, PutOverrides::default())
            .await
            .unwrap_err();

        match err {
            StorageError::UploadFailed { key, source } => {
                assert_eq!(key, "cat_3.png");
                assert_eq!(source.to_string(), "NoSuchBucket");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(file.url.is_none());
    }

    #[tokio::test]
    async fn upload_without_body_is_rejected() {
        let (client, provider) = setup(ProviderConfig::new("media"));

        let mut file = UploadFile::new("empty", ".bin");
        let err = provider
            .upload(&mut file, PutOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidFile(_)));
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn overrides_apply_but_key_is_fixed() {
        let mut config = ProviderConfig::new("media");
        config.params.acl = Some(ObjectAcl::PublicRead);
        let (client, provider) = setup(config);

        let overrides = PutOverrides {
            acl: Some(ObjectAcl::Private),
            content_type: Some("application/octet-stream".to_string()),
            cache_control: Some("max-age=31536000".to_string()),
            ..Default::default()
        };
        let mut file = png("cat_4");
        provider.upload(&mut file, overrides).await.unwrap();

        let stored = client.get("media", "cat_4.png").unwrap();
        assert_eq!(stored.acl, Some(ObjectAcl::Private));
        assert_eq!(stored.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(stored.cache_control.as_deref(), Some("max-age=31536000"));
    }

    #[tokio::test]
    async fn delete_targets_uploaded_key() {
        let (client, provider) = setup(ProviderConfig::new("media"));

        let mut file = png("cat_5").with_folder_path("/albums");
        provider.upload(&mut file, PutOverrides::default()).await.unwrap();
        assert!(client.get("media", "albums/cat_5.png").is_some());

        provider.delete(&file, DeleteOverrides::default()).await.unwrap();
        assert!(client.is_empty());

        // deleting again is not an error
        provider.delete(&file, DeleteOverrides::default()).await.unwrap();
    }

    #[tokio::test]
    async fn delete_failure_is_propagated() {
        let (client, provider) = setup(ProviderConfig::new("media"));
        client.fail_with("AccessDenied");

        let err = provider
            .delete(&UploadFile::new("x", ".png"), DeleteOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DeleteFailed { ref key, .. } if key == "x.png"));
    }

    #[tokio::test]
    async fn pool_mode_flattens_keys_for_upload_and_delete() {
        let mut config = ProviderConfig::new("media");
        config.pool = true;
        let (client, provider) = setup(config);

        let mut file = png("cat_6").with_path("thumb").with_folder_path("/deep/folder");
        provider.upload(&mut file, PutOverrides::default()).await.unwrap();
        assert!(client.get("media", "thumb/cat_6.png").is_some());

        provider.delete(&file, DeleteOverrides::default()).await.unwrap();
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn signed_url_uses_one_hour_expiry() {
        let mut config = ProviderConfig::new("media");
        config.params.acl = Some(ObjectAcl::Private);
        let (client, provider) = setup(config);
        assert!(provider.is_private());

        let file = UploadFile::new("secret", ".pdf").with_folder_path("/docs");
        let signed = provider.get_signed_url(&file).await.unwrap();
        assert!(signed.url.contains("docs/secret.pdf"));
        assert!(signed.url.ends_with("X-Amz-Expires=3600"));

        client.fail_with("InvalidAccessKeyId");
        let err = provider.get_signed_url(&file).await.unwrap_err();
        assert!(matches!(err, StorageError::SigningFailed { .. }));
    }

    #[test]
    fn is_private_follows_acl() {
        let client: Arc<dyn ObjectClient> = Arc::new(MemoryObjectClient::new());
        let mut config = ProviderConfig::new("media");
        assert!(!UploadProvider::new(client.clone(), &config).is_private());

        config.params.acl = Some(ObjectAcl::PublicRead);
        assert!(!UploadProvider::new(client.clone(), &config).is_private());

        config.params.acl = Some(ObjectAcl::Private);
        assert!(UploadProvider::new(client, &config).is_private());
    }
}
