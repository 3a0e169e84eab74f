//! Configuration module
//!
//! Provider configuration is read once at startup, either from the host's
//! JSON provider options or from `CF_`-prefixed environment variables, and is
//! immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::storage_types::ObjectAcl;

/// Region used when none is configured. Cloudflare R2 expects `auto`.
pub const DEFAULT_REGION: &str = "auto";

const ENV_PREFIX: &str = "CF_";

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Settings forwarded to the object storage client constructor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    /// Custom endpoint for S3-compatible providers (R2, MinIO, ...)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default, rename = "s3ForcePathStyle")]
    pub force_path_style: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            endpoint: None,
            region: default_region(),
            force_path_style: false,
        }
    }
}

/// Default request parameters applied to every object request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BucketParams {
    #[serde(rename = "Bucket")]
    pub bucket: String,
    #[serde(rename = "ACL", default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<ObjectAcl>,
}

/// Upload provider configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub client: ClientSettings,
    pub params: BucketParams,
    /// Base URL objects are publicly readable from, e.g. an R2 custom domain.
    #[serde(default)]
    pub cloudflare_public_access_url: Option<String>,
    /// Flatten the key namespace by ignoring media-library folders.
    #[serde(default)]
    pub pool: bool,
}

/// Flat shape of the `CF_*` environment variables.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    session_token: Option<String>,
    endpoint: Option<String>,
    region: Option<String>,
    #[serde(default)]
    force_path_style: bool,
    bucket: String,
    acl: Option<String>,
    public_access_url: Option<String>,
    #[serde(default)]
    pool: bool,
}

impl From<EnvConfig> for ProviderConfig {
    fn from(env: EnvConfig) -> Self {
        ProviderConfig {
            client: ClientSettings {
                access_key_id: env.access_key_id,
                secret_access_key: env.secret_access_key,
                session_token: env.session_token,
                endpoint: env.endpoint,
                region: env.region.unwrap_or_else(default_region),
                force_path_style: env.force_path_style,
            },
            params: BucketParams {
                bucket: env.bucket,
                acl: env.acl.map(ObjectAcl::from),
            },
            cloudflare_public_access_url: env.public_access_url,
            pool: env.pool,
        }
    }
}

impl ProviderConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        ProviderConfig {
            client: ClientSettings::default(),
            params: BucketParams {
                bucket: bucket.into(),
                acl: None,
            },
            cloudflare_public_access_url: None,
            pool: false,
        }
    }

    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, anyhow::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: EnvConfig = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .map_err(|e| anyhow::anyhow!("Invalid {}* environment configuration: {}", ENV_PREFIX, e))?;
        let config = ProviderConfig::from(env);
        config.validate()?;
        Ok(config)
    }

    /// Parse the host's JSON provider options.
    pub fn from_json(raw: &str) -> Result<Self, anyhow::Error> {
        let config: ProviderConfig = serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("Invalid provider options: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.params.bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("Bucket must not be empty"));
        }

        if let Some(ref endpoint) = self.client.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "Endpoint must start with http:// or https://, got {}",
                    endpoint
                ));
            }
        }

        match (
            self.client.access_key_id.as_deref(),
            self.client.secret_access_key.as_deref(),
        ) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(anyhow::anyhow!(
                    "accessKeyId and secretAccessKey must be configured together"
                ));
            }
            _ => {}
        }

        if let Some(ref url) = self.cloudflare_public_access_url {
            if url.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "cloudflarePublicAccessUrl must not be empty when set"
                ));
            }
        }

        Ok(())
    }

    pub fn bucket(&self) -> &str {
        &self.params.bucket
    }

    pub fn acl(&self) -> Option<&ObjectAcl> {
        self.params.acl.as_ref()
    }

    pub fn public_access_url(&self) -> Option<&str> {
        self.cloudflare_public_access_url.as_deref()
    }

    pub fn is_private(&self) -> bool {
        self.params.acl.as_ref().is_some_and(ObjectAcl::is_private)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn from_vars_reads_prefixed_variables() {
        let config = ProviderConfig::from_vars(vars(&[
            ("CF_ACCESS_KEY_ID", "key"),
            ("CF_SECRET_ACCESS_KEY", "secret"),
            ("CF_ENDPOINT", "https://account.r2.cloudflarestorage.com"),
            ("CF_BUCKET", "media"),
            ("CF_ACL", "private"),
            ("CF_PUBLIC_ACCESS_URL", "https://cdn.example.com"),
            ("CF_POOL", "true"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.bucket(), "media");
        assert_eq!(config.client.region, DEFAULT_REGION);
        assert_eq!(config.public_access_url(), Some("https://cdn.example.com"));
        assert!(config.pool);
        assert!(config.is_private());
    }

    #[test]
    fn from_vars_requires_bucket() {
        let result = ProviderConfig::from_vars(vars(&[("CF_ENDPOINT", "https://r2.example.com")]));
        assert!(result.is_err());
    }

    #[test]
    fn from_json_accepts_host_provider_options() {
        let raw = r#"{
            "accessKeyId": "key",
            "secretAccessKey": "secret",
            "endpoint": "https://account.r2.cloudflarestorage.com",
            "s3ForcePathStyle": true,
            "cloudflarePublicAccessUrl": "https://cdn.example.com/",
            "params": { "Bucket": "media", "ACL": "public-read" }
        }"#;

        let config = ProviderConfig::from_json(raw).unwrap();
        assert_eq!(config.bucket(), "media");
        assert_eq!(config.acl(), Some(&ObjectAcl::PublicRead));
        assert!(config.client.force_path_style);
        assert!(!config.pool);
        assert!(!config.is_private());
    }

    #[test]
    fn validate_rejects_bad_endpoint_and_partial_credentials() {
        let mut config = ProviderConfig::new("media");
        config.client.endpoint = Some("r2.example.com".to_string());
        assert!(config.validate().is_err());

        let mut config = ProviderConfig::new("media");
        config.client.access_key_id = Some("key".to_string());
        assert!(config.validate().is_err());

        let mut config = ProviderConfig::new("  ");
        config.client.endpoint = Some("https://r2.example.com".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn is_private_only_for_private_acl() {
        let mut config = ProviderConfig::new("media");
        assert!(!config.is_private());
        config.params.acl = Some(ObjectAcl::PublicRead);
        assert!(!config.is_private());
        config.params.acl = Some(ObjectAcl::Private);
        assert!(config.is_private());
    }
}
