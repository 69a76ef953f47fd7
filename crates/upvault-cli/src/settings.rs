//! Connection settings from flags, environment variables and config files

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::debug;
use upvault_core::RawConfig;

/// Connection options shared by every command
///
/// Values stay strings here; `upvault_core::normalize` coerces them exactly
/// like any other loosely typed source.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Configuration file (TOML or JSON)
    #[arg(long, global = true, env = "UPVAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Object store hostname or IP address
    #[arg(long, global = true, env = "UPVAULT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Object store port
    #[arg(long, global = true, env = "UPVAULT_PORT")]
    pub port: Option<String>,

    /// Connect over TLS (true/false)
    #[arg(long, global = true, env = "UPVAULT_USE_SSL")]
    pub use_ssl: Option<String>,

    /// Access key
    #[arg(long, global = true, env = "UPVAULT_ACCESS_KEY")]
    pub access_key: Option<String>,

    /// Secret key
    #[arg(long, global = true, env = "UPVAULT_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Bucket name
    #[arg(long, global = true, env = "UPVAULT_BUCKET")]
    pub bucket: Option<String>,

    /// Key prefix for uploads
    #[arg(long, global = true, env = "UPVAULT_FOLDER")]
    pub folder: Option<String>,

    /// Serve files through signed URLs only (true/false)
    #[arg(long, global = true, env = "UPVAULT_PRIVATE")]
    pub private: Option<String>,

    /// Signed URL lifetime in seconds
    #[arg(long, global = true, env = "UPVAULT_EXPIRY")]
    pub expiry: Option<String>,
}

/// `<config dir>/upvault/config.toml`, if it exists
pub fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("upvault").join("config.toml");
    path.exists().then_some(path)
}

fn load_file(path: &Path) -> Result<RawConfig> {
    debug!(path = %path.display(), "Loading configuration file");
    RawConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

impl ConnectionArgs {
    /// Flags and environment variables as a raw configuration
    fn overrides(&self) -> RawConfig {
        let mut raw = RawConfig::new();
        let fields = [
            (&self.endpoint, &mut raw.end_point),
            (&self.port, &mut raw.port),
            (&self.use_ssl, &mut raw.use_ssl),
            (&self.access_key, &mut raw.access_key),
            (&self.secret_key, &mut raw.secret_key),
            (&self.bucket, &mut raw.bucket),
            (&self.folder, &mut raw.folder),
            (&self.private, &mut raw.private),
            (&self.expiry, &mut raw.expiry),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = Some(value.as_str().into());
            }
        }
        raw
    }

    /// Config file values with flags and environment variables on top
    pub fn resolve(&self) -> Result<RawConfig> {
        let base = match self.config.clone().or_else(default_config_path) {
            Some(path) => load_file(&path)?,
            None => RawConfig::new(),
        };
        Ok(base.merge(self.overrides()))
    }
}
