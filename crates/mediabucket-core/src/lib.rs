//! mediabucket core library
//!
//! Configuration, the host file descriptor model and other types shared by the
//! storage provider and the command-line client.

pub mod config;
pub mod models;
pub mod storage_types;
pub mod warnings;

// Re-export commonly used types
pub use config::{BucketParams, ClientSettings, ProviderConfig, DEFAULT_REGION};
pub use models::{ByteReader, FileBody, UploadFile};
pub use storage_types::ObjectAcl;
pub use warnings::{collect_init_warnings, InitWarning};
