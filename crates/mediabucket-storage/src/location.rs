//! Public URL derivation for uploaded objects.

use crate::traits::{ObjectLocation, PutObjectOutput, StorageError, StorageResult};

/// True when `url` starts with a `scheme://` prefix.
pub fn has_url_scheme(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, _)| {
        scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Default scheme-less URLs to https.
pub fn ensure_scheme(url: String) -> String {
    if has_url_scheme(&url) {
        url
    } else {
        format!("https://{}", url)
    }
}

/// Remove a leading `{bucket}/` segment from `key`.
pub fn strip_bucket_prefix<'a>(key: &'a str, bucket: &str) -> &'a str {
    key.strip_prefix(bucket)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(key)
}

/// Turn an upload result into the URL the host stores for the file.
///
/// A configured public base URL always wins. Otherwise the location reported
/// by the store is used, which is impossible for multipart uploads that only
/// report the `auto` placeholder.
pub fn resolve_public_url(
    output: &PutObjectOutput,
    bucket: &str,
    public_base_url: Option<&str>,
) -> StorageResult<String> {
    let key = match output.location {
        ObjectLocation::Auto => strip_bucket_prefix(&output.key, bucket),
        ObjectLocation::Url(_) => output.key.as_str(),
    };

    let url = match (public_base_url, &output.location) {
        (Some(base), _) => format!("{}/{}", base.trim_end_matches('/'), key),
        (None, ObjectLocation::Url(location)) => location.clone(),
        (None, ObjectLocation::Auto) => {
            return Err(StorageError::ConfigError(format!(
                "storage returned no location for {} and no public access URL is configured; \
                 a public access URL is required for uploads larger than 5MB",
                key
            )))
        }
    };

    Ok(ensure_scheme(url))
}
