//! mediabucket storage library
//!
//! The upload provider that maps host files onto objects in an S3-compatible
//! store (AWS S3, Cloudflare R2), plus the storage clients it runs on.
//!
//! # Object key format
//!
//! `[{folder_path}/][{path}/]{hash}{ext}`; the folder segment is dropped for
//! the media-library root and in pool mode. See the `keys` module.
//!
//! # File URLs
//!
//! A configured public access URL always takes precedence over the location
//! the store reports. Multipart uploads to R2 report only the `auto`
//! placeholder, so large files require a public access URL.

pub mod factory;
pub mod keys;
pub mod location;
#[cfg(any(test, feature = "storage-memory"))]
pub mod memory;
pub mod overrides;
pub mod provider;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_provider, log_init_warnings, provider_with_client};
pub use keys::{build_key, object_key, ObjectKey};
#[cfg(any(test, feature = "storage-memory"))]
pub use memory::MemoryObjectClient;
pub use overrides::{DeleteOverrides, PutOverrides};
pub use provider::{SignedUrl, UploadProvider, SIGNED_URL_EXPIRY};
#[cfg(feature = "storage-s3")]
pub use s3::S3ObjectClient;
pub use traits::{
    ClientError, ClientResult, DeleteObjectRequest, ObjectBody, ObjectClient, ObjectLocation,
    PutObjectOutput, PutObjectRequest, StorageError, StorageResult,
};
