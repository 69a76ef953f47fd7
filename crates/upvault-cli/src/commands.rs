//! Command handlers

use crate::settings::ConnectionArgs;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::future::Future;
use std::io;
use std::path::Path;
use tokio::runtime::Runtime;
use tracing::{info, warn};
use upvault_cloud::{FileDescriptor, SignedUrlOptions, StorageAdapter};
use upvault_core::{build_upload_path, normalize, PathParts, RawValue, StorageConfig};

fn load_config(connection: &ConnectionArgs) -> Result<StorageConfig> {
    let raw = connection.resolve()?;
    Ok(normalize(&raw)?)
}

/// Run `f` with an adapter inside a fresh runtime
///
/// The bucket is only probed when a command asks for it.
fn with_adapter<F, Fut, T>(config: StorageConfig, f: F) -> Result<T>
where
    F: FnOnce(StorageAdapter) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let runtime = Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let adapter = StorageAdapter::builder(config)
            .background_probe(false)
            .build()?;
        f(adapter).await
    })
}

pub fn check(connection: &ConnectionArgs, connect: bool) -> Result<()> {
    let config = load_config(connection)?;
    println!("{}", serde_json::to_string_pretty(&config)?);

    if !connect {
        return Ok(());
    }
    with_adapter(config, |adapter| async move {
        match adapter.check_bucket().await {
            Some(true) => {
                info!(bucket = adapter.config().bucket(), "Bucket is reachable");
                Ok(())
            }
            Some(false) => bail!("bucket `{}` does not exist", adapter.config().bucket()),
            None => bail!("could not reach {}", adapter.host_url()),
        }
    })
}

/// Works offline: only the folder is taken from the configuration
pub fn path(connection: &ConnectionArgs, hash: &str, ext: &str, path: Option<&str>) -> Result<()> {
    let mut parts = PathParts::new(hash, ext);
    if let Some(p) = path {
        parts = parts.with_path(p);
    }
    let folder = match connection.resolve()?.folder {
        Some(RawValue::Str(s)) => Some(s),
        Some(other) => Some(other.to_string()),
        None => None,
    };
    let key = build_upload_path(parts, folder.as_deref())?;
    println!("{}", key);
    Ok(())
}

/// BLAKE3 of a file's content, hex encoded
fn hash_file(file: &Path) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut File::open(file)?, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

pub fn upload(
    connection: &ConnectionArgs,
    file: &Path,
    hash: Option<String>,
    path: Option<String>,
    buffer: bool,
) -> Result<()> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some(ext) = file.extension().map(|e| e.to_string_lossy().into_owned()) else {
        bail!("{} has no extension", file.display());
    };
    let size = std::fs::metadata(file)
        .with_context(|| format!("Cannot read {}", file.display()))?
        .len();
    let hash = match hash {
        Some(hash) => hash,
        None => hash_file(file).with_context(|| format!("Cannot hash {}", file.display()))?,
    };

    let mut descriptor = FileDescriptor::new(name, hash, ext).with_size(size);
    if let Some(path) = path {
        descriptor = descriptor.with_path(path);
    }

    let config = load_config(connection)?;
    let file = file.to_path_buf();
    let outcome = with_adapter(config, |adapter| async move {
        if buffer {
            let content = tokio::fs::read(&file).await?;
            descriptor = descriptor.with_buffer(content);
        } else {
            let reader = tokio::fs::File::open(&file).await?;
            descriptor = descriptor.with_stream(reader);
        }
        Ok::<_, anyhow::Error>(adapter.upload(&mut descriptor).await?)
    })?;

    info!(key = %outcome.metadata.key, etag = ?outcome.metadata.etag, "Uploaded");
    println!("{}", outcome.url);
    Ok(())
}

pub fn delete(connection: &ConnectionArgs, url: &str) -> Result<()> {
    let descriptor = FileDescriptor::default().with_url(url);
    with_adapter(load_config(connection)?, |adapter| async move {
        adapter.delete(&descriptor).await?;
        Ok::<_, anyhow::Error>(())
    })?;
    info!(url, "Deleted");
    Ok(())
}

pub fn sign(connection: &ConnectionArgs, url: &str, expires_in: Option<i64>) -> Result<()> {
    let descriptor = FileDescriptor::default().with_url(url);
    let signed = with_adapter(load_config(connection)?, |adapter| async move {
        let signed = adapter
            .get_signed_url(&descriptor, SignedUrlOptions { expires_in })
            .await?;
        if signed == descriptor.url.as_deref().unwrap_or_default() {
            warn!("URL returned unchanged");
        }
        Ok::<_, anyhow::Error>(signed)
    })?;
    println!("{}", signed);
    Ok(())
}
