//! Per-call request parameters supplied by the host.
//!
//! Field names follow the S3 request shape (`Bucket`, `ACL`, `ContentType`,
//! ...) so the host can forward its custom params unchanged. The object key is
//! never overridable.

use mediabucket_core::ObjectAcl;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::traits::{DeleteObjectRequest, PutObjectRequest};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, rename = "ACL", skip_serializing_if = "Option::is_none")]
    pub acl: Option<ObjectAcl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl PutOverrides {
    /// Merge onto a request built from the file and provider defaults.
    pub fn apply(self, request: &mut PutObjectRequest) {
        if let Some(bucket) = self.bucket {
            request.bucket = bucket;
        }
        if let Some(acl) = self.acl {
            request.acl = Some(acl);
        }
        if let Some(content_type) = self.content_type {
            request.content_type = Some(content_type);
        }
        if let Some(cache_control) = self.cache_control {
            request.cache_control = Some(cache_control);
        }
        if let Some(content_disposition) = self.content_disposition {
            request.content_disposition = Some(content_disposition);
        }
        if let Some(content_encoding) = self.content_encoding {
            request.content_encoding = Some(content_encoding);
        }
        request.metadata.extend(self.metadata);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

impl DeleteOverrides {
    pub fn apply(self, request: &mut DeleteObjectRequest) {
        if let Some(bucket) = self.bucket {
            request.bucket = bucket;
        }
        if let Some(version_id) = self.version_id {
            request.version_id = Some(version_id);
        }
    }
}
