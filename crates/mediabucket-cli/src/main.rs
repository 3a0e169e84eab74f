//! mediabucket CLI: upload, delete and sign media objects in S3 / Cloudflare R2.
//!
//! Configure with CF_* environment variables (or a .env file), or pass the
//! host's JSON provider options with --config.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mediabucket_cli::{file_from_path, init_tracing, load_config};
use mediabucket_core::{collect_init_warnings, UploadFile};
use mediabucket_storage::{create_provider, DeleteOverrides, PutOverrides};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediabucket", about = "S3 / Cloudflare R2 media upload CLI")]
struct Cli {
    /// JSON provider options file (defaults to CF_* environment variables)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Placement {
    /// Sub-path inside the key, e.g. a thumbnail format
    #[arg(long)]
    path: Option<String>,
    /// Media-library folder, e.g. /1/4
    #[arg(long)]
    folder_path: Option<String>,
}

#[derive(Args)]
struct FileRef {
    /// File hash as stored by the host
    #[arg(long)]
    hash: String,
    /// Extension including the dot, e.g. .png
    #[arg(long)]
    ext: String,
    #[command(flatten)]
    placement: Placement,
}

impl FileRef {
    fn into_file(self) -> UploadFile {
        let mut file = UploadFile::new(self.hash, self.ext);
        file.path = self.placement.path;
        file.folder_path = self.placement.folder_path;
        file
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local file and print its URL
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        #[command(flatten)]
        placement: Placement,
        /// Content type (guessed from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,
        /// Stream the file instead of reading it into memory
        #[arg(long)]
        stream: bool,
        /// Cache-Control header for the stored object
        #[arg(long)]
        cache_control: Option<String>,
    },
    /// Delete a stored file
    Delete {
        #[command(flatten)]
        file: FileRef,
    },
    /// Print a presigned GET URL (valid for one hour)
    Sign {
        #[command(flatten)]
        file: FileRef,
    },
    /// Print the object key a file maps to, without contacting storage
    Key {
        #[command(flatten)]
        file: FileRef,
    },
    /// Validate the configuration and list warnings
    CheckConfig,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())
        .context("Failed to load provider configuration. Set CF_BUCKET and friends or pass --config")?;

    match cli.command {
        Commands::Key { file } => {
            let file = file.into_file();
            let key = mediabucket_storage::object_key(&file, config.pool);
            print_json(&serde_json::json!({ "key": key.key, "prefix": key.prefix }))?;
        }
        Commands::CheckConfig => {
            let warnings: Vec<String> =
                collect_init_warnings(&config, std::env::vars().map(|(key, _)| key))
                    .iter()
                    .map(ToString::to_string)
                    .collect();
            print_json(&serde_json::json!({
                "bucket": config.bucket(),
                "region": config.client.region,
                "endpoint": config.client.endpoint,
                "public_access_url": config.public_access_url(),
                "pool": config.pool,
                "private": config.is_private(),
                "warnings": warnings,
            }))?;
        }
        Commands::Upload {
            file,
            placement,
            mime,
            stream,
            cache_control,
        } => {
            let (provider, _warnings) = create_provider(&config).await?;
            let mut upload = file_from_path(&file, mime, stream).await?;
            upload.path = placement.path;
            upload.folder_path = placement.folder_path;

            let overrides = PutOverrides {
                cache_control,
                ..Default::default()
            };
            if stream {
                provider.upload_stream(&mut upload, overrides).await?;
            } else {
                provider.upload(&mut upload, overrides).await?;
            }
            print_json(&upload)?;
        }
        Commands::Delete { file } => {
            let (provider, _warnings) = create_provider(&config).await?;
            let file = file.into_file();
            let key = provider.key_for(&file).key;
            provider.delete(&file, DeleteOverrides::default()).await?;
            print_json(&serde_json::json!({ "deleted": key }))?;
        }
        Commands::Sign { file } => {
            let (provider, _warnings) = create_provider(&config).await?;
            let file = file.into_file();
            if !provider.is_private() {
                tracing::warn!(
                    bucket = %provider.bucket(),
                    "Bucket ACL is not private; the public URL may be used instead"
                );
            }
            let signed = provider.get_signed_url(&file).await?;
            print_json(&signed)?;
        }
    }

    Ok(())
}
