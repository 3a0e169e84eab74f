#[cfg(feature = "storage-s3")]
use crate::S3ObjectClient;
use crate::{ObjectClient, StorageError, StorageResult, UploadProvider};
use mediabucket_core::{collect_init_warnings, InitWarning, ProviderConfig};
use std::sync::Arc;

/// Create the upload provider backed by S3/R2 from configuration.
///
/// Returns the provider together with the startup warnings, which are also
/// logged. Warnings never prevent initialization.
#[cfg(feature = "storage-s3")]
pub async fn create_provider(
    config: &ProviderConfig,
) -> StorageResult<(UploadProvider, Vec<InitWarning>)> {
    config
        .validate()
        .map_err(|e| StorageError::ConfigError(e.to_string()))?;

    let client = S3ObjectClient::new(&config.client).await?;
    Ok(provider_with_client(Arc::new(client), config))
}

#[cfg(not(feature = "storage-s3"))]
pub async fn create_provider(
    _config: &ProviderConfig,
) -> StorageResult<(UploadProvider, Vec<InitWarning>)> {
    Err(StorageError::ConfigError(
        "S3 storage client not available (storage-s3 feature not enabled)".to_string(),
    ))
}

/// Create the upload provider on top of an existing client.
pub fn provider_with_client(
    client: Arc<dyn ObjectClient>,
    config: &ProviderConfig,
) -> (UploadProvider, Vec<InitWarning>) {
    let warnings = collect_init_warnings(config, std::env::vars().map(|(key, _)| key));
    log_init_warnings(&warnings);

    let provider = UploadProvider::new(client, config);

    tracing::info!(
        bucket = %config.bucket(),
        pool = config.pool,
        private = provider.is_private(),
        public_access_url = config.public_access_url().unwrap_or("-"),
        "Upload provider initialized"
    );

    (provider, warnings)
}

pub fn log_init_warnings(warnings: &[InitWarning]) {
    for warning in warnings {
        tracing::warn!(warning = %warning, "Upload provider configuration warning");
    }
}
