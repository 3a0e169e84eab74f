use anyhow::Context;
use mediabucket_core::{ByteReader, ProviderConfig, UploadFile};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

const HASH_SUFFIX_LEN: usize = 10;

/// Initialize tracing for the CLI binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load provider options from a JSON file, or from `CF_*` variables.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ProviderConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Read config file {}", path.display()))?;
            ProviderConfig::from_json(&raw)
        }
        None => ProviderConfig::from_env(),
    }
}

/// Reduce a file stem to characters that are safe in object keys.
pub fn sanitize_stem(stem: &str) -> String {
    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = sanitized.trim_matches('_');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Content hash of a file: `{sanitized stem}_{first 10 hex chars of sha256}`.
pub async fn file_hash(path: &Path) -> anyhow::Result<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Open {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    let digest = hex::encode(hasher.finalize());

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(format!("{}_{}", sanitize_stem(&stem), &digest[..HASH_SUFFIX_LEN]))
}

/// Extension with leading dot, lowercased; empty when the file has none.
pub fn file_ext(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Build an upload descriptor for a local file.
pub async fn file_from_path(
    path: &Path,
    mime: Option<String>,
    stream: bool,
) -> anyhow::Result<UploadFile> {
    let hash = file_hash(path).await?;
    let mime = mime.unwrap_or_else(|| {
        mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    });
    let file = UploadFile::new(hash, file_ext(path)).with_mime(mime);

    if stream {
        let handle = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Open {}", path.display()))?;
        let size = handle.metadata().await.ok().map(|m| m.len());
        let reader: ByteReader = Box::pin(handle);
        Ok(file.with_stream(reader, size))
    } else {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Read {}", path.display()))?;
        Ok(file.with_buffer(data))
    }
}
