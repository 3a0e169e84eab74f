use crate::traits::{
    ClientError, ClientResult, DeleteObjectRequest, ObjectBody, ObjectClient, ObjectLocation,
    PutObjectOutput, PutObjectRequest, StorageError, StorageResult,
};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use aws_sdk_s3::Client;
use bytes::Bytes;
use mediabucket_core::{ByteReader, ClientSettings};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;

/// Bodies larger than one part are sent as multipart uploads.
const PART_SIZE: usize = 5 * 1024 * 1024; // 5MB, minimum part size except the last part

/// Failed S3 API call, with the SDK's full error context rendered.
#[derive(Debug, Error)]
#[error("S3 {operation} failed: {message}")]
pub struct S3RequestError {
    pub operation: &'static str,
    pub message: String,
}

fn request_error<E: std::error::Error>(operation: &'static str, err: E) -> ClientError {
    Box::new(S3RequestError {
        operation,
        message: DisplayErrorContext(err).to_string(),
    })
}

/// Hands out a body in part-sized chunks.
enum PartSource {
    Bytes(Bytes),
    Reader(ByteReader),
}

impl PartSource {
    async fn next_part(&mut self) -> std::io::Result<Option<Bytes>> {
        match self {
            PartSource::Bytes(remaining) => {
                if remaining.is_empty() {
                    return Ok(None);
                }
                let take = remaining.len().min(PART_SIZE);
                Ok(Some(remaining.split_to(take)))
            }
            PartSource::Reader(reader) => {
                let mut part = vec![0u8; PART_SIZE];
                let mut filled = 0usize;
                while filled < PART_SIZE {
                    let bytes_read = reader.read(&mut part[filled..]).await?;
                    if bytes_read == 0 {
                        break; // EOF
                    }
                    filled += bytes_read;
                }
                if filled == 0 {
                    return Ok(None);
                }
                part.truncate(filled);
                Ok(Some(Bytes::from(part)))
            }
        }
    }
}

/// Object attributes shared by single and multipart uploads.
struct PutHead {
    bucket: String,
    key: String,
    content_type: Option<String>,
    acl: Option<ObjectCannedAcl>,
    cache_control: Option<String>,
    content_disposition: Option<String>,
    content_encoding: Option<String>,
    metadata: Option<HashMap<String, String>>,
}

/// URL an object is reachable at through the configured endpoint.
///
/// For AWS S3: `https://{bucket}.s3.{region}.amazonaws.com/{key}`. For
/// S3-compatible providers the endpoint is used, path-style
/// (`{endpoint}/{bucket}/{key}`) or virtual-hosted (`{scheme}://{bucket}.{host}/{key}`).
pub fn object_url(
    endpoint: Option<&str>,
    force_path_style: bool,
    region: &str,
    bucket: &str,
    key: &str,
) -> String {
    let key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    match endpoint {
        Some(endpoint) => {
            let base_url = endpoint.trim_end_matches('/');
            if force_path_style {
                return format!("{}/{}/{}", base_url, bucket, key);
            }
            match base_url.split_once("://") {
                Some((scheme, host)) => format!("{}://{}.{}/{}", scheme, bucket, host, key),
                None => format!("{}.{}/{}", bucket, base_url, key),
            }
        }
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}

/// aws-sdk-s3 backed `ObjectClient` for AWS S3 and Cloudflare R2.
#[derive(Clone)]
pub struct S3ObjectClient {
    client: Client,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    force_path_style: bool,
}

impl S3ObjectClient {
    /// Create a new client from the provider's client settings.
    ///
    /// Static credentials are used when configured; otherwise the default AWS
    /// credential chain applies.
    pub async fn new(settings: &ClientSettings) -> StorageResult<Self> {
        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(settings.region.clone()));

        let retry_config = RetryConfig::standard()
            .with_max_attempts(5)
            .with_retry_mode(RetryMode::Adaptive);

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(retry_config);

        match (
            settings.access_key_id.as_ref(),
            settings.secret_access_key.as_ref(),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key_id,
                    secret_access_key,
                    settings.session_token.clone(),
                    None,
                    "mediabucket-config",
                ));
            }
            (None, None) => {}
            _ => {
                return Err(StorageError::ConfigError(
                    "access key id and secret access key must be set together".to_string(),
                ))
            }
        }

        let sdk_config = loader.load().await;

        let mut s3_config_builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(settings.force_path_style);
        if let Some(ref endpoint) = settings.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        Ok(S3ObjectClient {
            client,
            region: settings.region.clone(),
            endpoint_url: settings.endpoint.clone(),
            force_path_style: settings.force_path_style,
        })
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        object_url(
            self.endpoint_url.as_deref(),
            self.force_path_style,
            &self.region,
            bucket,
            key,
        )
    }

    async fn put_single(&self, head: PutHead, data: Bytes) -> ClientResult<PutObjectOutput> {
        let size = data.len();

        let output = self
            .client
            .put_object()
            .bucket(&head.bucket)
            .key(&head.key)
            .body(ByteStream::from(data))
            .content_length(size as i64)
            .set_content_type(head.content_type)
            .set_acl(head.acl)
            .set_cache_control(head.cache_control)
            .set_content_disposition(head.content_disposition)
            .set_content_encoding(head.content_encoding)
            .set_metadata(head.metadata)
            .send()
            .await
            .map_err(|e| request_error("PutObject", e))?;

        Ok(PutObjectOutput {
            location: ObjectLocation::Url(self.object_url(&head.bucket, &head.key)),
            key: head.key,
            e_tag: output.e_tag().map(String::from),
        })
    }

    async fn put_multipart(
        &self,
        head: PutHead,
        first_parts: Vec<Bytes>,
        source: PartSource,
    ) -> ClientResult<PutObjectOutput> {
        let create_result = self
            .client
            .create_multipart_upload()
            .bucket(&head.bucket)
            .key(&head.key)
            .set_content_type(head.content_type.clone())
            .set_acl(head.acl.clone())
            .set_cache_control(head.cache_control.clone())
            .set_content_disposition(head.content_disposition.clone())
            .set_content_encoding(head.content_encoding.clone())
            .set_metadata(head.metadata.clone())
            .send()
            .await
            .map_err(|e| request_error("CreateMultipartUpload", e))?;

        let upload_id = create_result
            .upload_id()
            .ok_or_else(|| ClientError::from("No upload ID returned from S3"))?
            .to_string();

        let parts = match self
            .upload_parts(&head, &upload_id, first_parts, source)
            .await
        {
            Ok(parts) => parts,
            Err(e) => {
                self.abort_multipart(&head, &upload_id).await;
                return Err(e);
            }
        };
        let part_count = parts.len();

        let completed_parts = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        let output = match self
            .client
            .complete_multipart_upload()
            .bucket(&head.bucket)
            .key(&head.key)
            .upload_id(&upload_id)
            .multipart_upload(completed_parts)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                self.abort_multipart(&head, &upload_id).await;
                return Err(request_error("CompleteMultipartUpload", e));
            }
        };

        tracing::debug!(
            bucket = %head.bucket,
            key = %head.key,
            parts = part_count,
            location = ?output.location(),
            "S3 multipart upload completed"
        );

        Ok(PutObjectOutput {
            key: output.key().unwrap_or(head.key.as_str()).to_string(),
            location: ObjectLocation::from_reported(output.location()),
            e_tag: output.e_tag().map(String::from),
        })
    }

    async fn upload_parts(
        &self,
        head: &PutHead,
        upload_id: &str,
        first_parts: Vec<Bytes>,
        mut source: PartSource,
    ) -> ClientResult<Vec<CompletedPart>> {
        let mut parts = Vec::new();
        let mut part_number = 1i32;
        let mut pending = first_parts.into_iter();

        loop {
            let data = match pending.next() {
                Some(data) => data,
                None => match source.next_part().await? {
                    Some(data) => data,
                    None => break,
                },
            };

            let upload_part_result = self
                .client
                .upload_part()
                .bucket(&head.bucket)
                .key(&head.key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(data))
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %DisplayErrorContext(&e),
                        bucket = %head.bucket,
                        key = %head.key,
                        part_number = part_number,
                        "Failed to upload part"
                    );
                    request_error("UploadPart", e)
                })?;

            let etag = upload_part_result
                .e_tag()
                .ok_or_else(|| {
                    ClientError::from(format!("No ETag returned for part {}", part_number))
                })?
                .to_string();

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .e_tag(etag)
                    .build(),
            );
            part_number += 1;
        }

        Ok(parts)
    }

    async fn abort_multipart(&self, head: &PutHead, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(&head.bucket)
            .key(&head.key)
            .upload_id(upload_id)
            .send()
            .await
        {
            tracing::warn!(
                error = %DisplayErrorContext(&e),
                bucket = %head.bucket,
                key = %head.key,
                upload_id = %upload_id,
                "Failed to abort multipart upload"
            );
        }
    }
}

#[async_trait]
impl ObjectClient for S3ObjectClient {
    async fn put_object(&self, request: PutObjectRequest) -> ClientResult<PutObjectOutput> {
        let head = PutHead {
            bucket: request.bucket,
            key: request.key,
            content_type: request.content_type,
            acl: request.acl.map(|acl| ObjectCannedAcl::from(acl.as_str())),
            cache_control: request.cache_control,
            content_disposition: request.content_disposition,
            content_encoding: request.content_encoding,
            metadata: (!request.metadata.is_empty()).then_some(request.metadata),
        };

        let mut source = match request.body {
            ObjectBody::Bytes(bytes) => PartSource::Bytes(bytes),
            ObjectBody::Reader(reader) => PartSource::Reader(reader),
        };

        // Anything that fits into one part goes out as a single PutObject.
        let first = source.next_part().await?.unwrap_or_default();
        if first.len() < PART_SIZE {
            return self.put_single(head, first).await;
        }
        match source.next_part().await? {
            None => self.put_single(head, first).await,
            Some(second) => self.put_multipart(head, vec![first, second], source).await,
        }
    }

    async fn delete_object(&self, request: DeleteObjectRequest) -> ClientResult<()> {
        self.client
            .delete_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .set_version_id(request.version_id)
            .send()
            .await
            .map_err(|e| request_error("DeleteObject", e))?;

        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> ClientResult<String> {
        let presigning_config = PresigningConfig::builder()
            .expires_in(expires_in)
            .build()?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| request_error("GetObject presign", e))?;

        Ok(presigned_request.uri().to_string())
    }
}
