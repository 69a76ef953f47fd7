//! Configuration module
//!
//! A [`RawConfig`] is the options bag handed over by the host, typically
//! assembled from environment variables, so every field may arrive as a
//! string. [`normalize`] turns it into an immutable [`StorageConfig`].
//!
//! Two policies apply. The identity fields (endpoint, access key, secret key,
//! bucket) are required and any defect is a [`ConfigError`]. Every other field
//! is a tuning knob: a value that cannot be coerced is replaced by its default
//! and a warning is logged, so a typo there never prevents startup.

use crate::error::{ConfigError, Result};
use crate::validation::{is_valid_ipv6, strip_brackets, validate_bucket_name, validate_endpoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn, Dispatch};

/// Port used when TLS is enabled and none is configured
pub const DEFAULT_TLS_PORT: u16 = 443;

/// Port used when TLS is disabled and none is configured (MinIO's default)
pub const DEFAULT_PLAIN_PORT: u16 = 9000;

/// Conventional plain HTTP port
pub const HTTP_PORT: u16 = 80;

/// Signed URL lifetime: 7 days
pub const DEFAULT_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Transport connect timeout in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 60_000;

/// Retries performed by the transport layer
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Initial delay between transport retries in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// A configuration value as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Native boolean
    Bool(bool),
    /// Native integer
    Int(i64),
    /// Native floating point number
    Float(f64),
    /// String representation, e.g. from an environment variable
    Str(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Int(n) => write!(f, "{}", n),
            RawValue::Float(n) => write!(f, "{}", n),
            RawValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Str(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Str(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Int(value.into())
    }
}

impl From<u16> for RawValue {
    fn from(value: u16) -> Self {
        RawValue::Int(value.into())
    }
}

impl From<u32> for RawValue {
    fn from(value: u32) -> Self {
        RawValue::Int(value.into())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

/// Coerce a raw value into an integer
///
/// Integral floats and trimmed decimal strings are accepted.
pub fn coerce_int(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Int(n) => Some(*n),
        RawValue::Float(f) => float_to_int(*f),
        RawValue::Str(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_int))
        }
        RawValue::Bool(_) => None,
    }
}

fn float_to_int(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Coerce a raw value into a boolean
///
/// Accepts booleans, `"true"`/`"false"` in any case, and `1`/`0`.
pub fn coerce_bool(value: &RawValue) -> Option<bool> {
    match value {
        RawValue::Bool(b) => Some(*b),
        RawValue::Int(1) => Some(true),
        RawValue::Int(0) => Some(false),
        RawValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn required_string(
    field: &'static str,
    value: Option<&RawValue>,
) -> std::result::Result<String, ConfigError> {
    match value {
        None => Err(ConfigError::Missing { field }),
        Some(RawValue::Str(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(ConfigError::Empty { field })
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(_) => Err(ConfigError::NotAString { field }),
    }
}

fn optional_string(field: &'static str, value: Option<&RawValue>) -> Option<String> {
    let text = match value? {
        RawValue::Str(s) => s.trim().to_string(),
        RawValue::Int(n) => n.to_string(),
        RawValue::Float(f) => f.to_string(),
        RawValue::Bool(b) => {
            warn!(field, value = b, "Ignoring non-string value");
            return None;
        }
    };
    (!text.is_empty()).then_some(text)
}

fn optional_bool(field: &'static str, value: Option<&RawValue>, default: bool) -> bool {
    let Some(raw) = value else {
        return default;
    };
    match coerce_bool(raw) {
        Some(b) => b,
        None => {
            warn!(field, value = %raw, default, "Invalid boolean, using default");
            default
        }
    }
}

fn optional_int(
    field: &'static str,
    value: Option<&RawValue>,
    default: i64,
    accept: impl Fn(i64) -> bool,
) -> i64 {
    let Some(raw) = value else {
        return default;
    };
    match coerce_int(raw).filter(|n| accept(*n)) {
        Some(n) => n,
        None => {
            warn!(field, value = %raw, default, "Invalid number, using default");
            default
        }
    }
}

/// Loosely typed configuration as supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawConfig {
    /// Endpoint hostname
    #[serde(rename = "endPoint", alias = "endpoint", alias = "end_point")]
    pub end_point: Option<RawValue>,
    /// Alias of `end_point`, used when that is absent
    pub host: Option<RawValue>,
    /// Port number
    pub port: Option<RawValue>,
    /// Whether to connect over TLS
    #[serde(rename = "useSSL", alias = "use_ssl")]
    pub use_ssl: Option<RawValue>,
    /// Access key
    #[serde(alias = "access_key")]
    pub access_key: Option<RawValue>,
    /// Secret key
    #[serde(alias = "secret_key")]
    pub secret_key: Option<RawValue>,
    /// Bucket name
    pub bucket: Option<RawValue>,
    /// Key prefix for every upload
    pub folder: Option<RawValue>,
    /// Serve files through signed URLs only
    pub private: Option<RawValue>,
    /// Signed URL lifetime in seconds
    pub expiry: Option<RawValue>,
    /// Transport connect timeout in milliseconds
    #[serde(alias = "connect_timeout")]
    pub connect_timeout: Option<RawValue>,
    /// Verbose operation logging
    pub debug: Option<RawValue>,
    /// Verify TLS certificates
    #[serde(alias = "reject_unauthorized")]
    pub reject_unauthorized: Option<RawValue>,
    /// Transport retry count
    #[serde(alias = "max_retries")]
    pub max_retries: Option<RawValue>,
    /// Initial transport retry delay in milliseconds
    #[serde(alias = "retry_delay")]
    pub retry_delay: Option<RawValue>,
    /// Reuse idle connections
    #[serde(alias = "keep_alive")]
    pub keep_alive: Option<RawValue>,
}

macro_rules! raw_setters {
    ($($(#[$doc:meta])* $name:ident => $field:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(mut self, value: impl Into<RawValue>) -> Self {
                self.$field = Some(value.into());
                self
            }
        )*
    };
}

impl RawConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    raw_setters! {
        /// Set the endpoint
        with_endpoint => end_point;
        /// Set the `host` alias of the endpoint
        with_host => host;
        /// Set the port
        with_port => port;
        /// Set the TLS flag
        with_use_ssl => use_ssl;
        /// Set the access key
        with_access_key => access_key;
        /// Set the secret key
        with_secret_key => secret_key;
        /// Set the bucket
        with_bucket => bucket;
        /// Set the folder prefix
        with_folder => folder;
        /// Set the private flag
        with_private => private;
        /// Set the signed URL expiry in seconds
        with_expiry => expiry;
        /// Set the connect timeout in milliseconds
        with_connect_timeout => connect_timeout;
        /// Set the debug flag
        with_debug => debug;
        /// Set TLS certificate verification
        with_reject_unauthorized => reject_unauthorized;
        /// Set the transport retry count
        with_max_retries => max_retries;
        /// Set the transport retry delay in milliseconds
        with_retry_delay => retry_delay;
        /// Set connection keep-alive
        with_keep_alive => keep_alive;
    }

    /// Parse a JSON document
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| ConfigError::Parse(format!("invalid JSON: {}", e)).into())
    }

    /// Parse a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(format!("invalid TOML: {}", e)).into())
    }

    /// Load from a `.json` or `.toml` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ConfigError::Parse(format!("cannot read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    /// Overlay `overrides` on top of `self`, field by field
    pub fn merge(self, overrides: RawConfig) -> RawConfig {
        RawConfig {
            end_point: overrides.end_point.or(self.end_point),
            host: overrides.host.or(self.host),
            port: overrides.port.or(self.port),
            use_ssl: overrides.use_ssl.or(self.use_ssl),
            access_key: overrides.access_key.or(self.access_key),
            secret_key: overrides.secret_key.or(self.secret_key),
            bucket: overrides.bucket.or(self.bucket),
            folder: overrides.folder.or(self.folder),
            private: overrides.private.or(self.private),
            expiry: overrides.expiry.or(self.expiry),
            connect_timeout: overrides.connect_timeout.or(self.connect_timeout),
            debug: overrides.debug.or(self.debug),
            reject_unauthorized: overrides.reject_unauthorized.or(self.reject_unauthorized),
            max_retries: overrides.max_retries.or(self.max_retries),
            retry_delay: overrides.retry_delay.or(self.retry_delay),
            keep_alive: overrides.keep_alive.or(self.keep_alive),
        }
    }
}

/// Validated, defaulted configuration
///
/// Built once by [`normalize`] and never modified afterwards.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(rename = "endPoint")]
    end_point: String,
    port: u16,
    #[serde(rename = "useSSL")]
    use_ssl: bool,
    access_key: String,
    #[serde(skip_serializing)]
    secret_key: String,
    bucket: String,
    folder: Option<String>,
    private: bool,
    expiry: u64,
    connect_timeout: u64,
    debug: bool,
    reject_unauthorized: bool,
    max_retries: u32,
    retry_delay: u64,
    keep_alive: bool,
}

impl StorageConfig {
    /// Endpoint hostname or IP literal (IPv6 without brackets)
    pub fn endpoint(&self) -> &str {
        &self.end_point
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn use_ssl(&self) -> bool {
        self.use_ssl
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key prefix applied to every upload
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Whether files are served through signed URLs only
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Default signed URL lifetime in seconds
    pub fn expiry_secs(&self) -> u64 {
        self.expiry
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn reject_unauthorized(&self) -> bool {
        self.reject_unauthorized
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("end_point", &self.end_point)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("folder", &self.folder)
            .field("private", &self.private)
            .field("expiry", &self.expiry)
            .field("connect_timeout", &self.connect_timeout)
            .field("debug", &self.debug)
            .field("reject_unauthorized", &self.reject_unauthorized)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}

fn resolve_port(value: Option<&RawValue>, use_ssl: bool) -> u16 {
    let default = if use_ssl {
        DEFAULT_TLS_PORT
    } else {
        DEFAULT_PLAIN_PORT
    };
    let Some(raw) = value else {
        return default;
    };

    let port = match coerce_int(raw)
        .and_then(|n| u16::try_from(n).ok())
        .filter(|p| *p >= 1)
    {
        Some(p) => p,
        None => {
            warn!(field = "port", value = %raw, default, "Invalid port, using default");
            return default;
        }
    };

    if use_ssl && port == DEFAULT_PLAIN_PORT {
        warn!(
            port,
            corrected = DEFAULT_TLS_PORT,
            "Port 9000 is the plain MinIO port but TLS is enabled, using 443"
        );
        return DEFAULT_TLS_PORT;
    }
    if !use_ssl && port == DEFAULT_TLS_PORT {
        warn!(port, "Port 443 is configured while TLS is disabled");
    } else if use_ssl && port == HTTP_PORT {
        warn!(port, "Port 80 is configured while TLS is enabled");
    }

    port
}

/// Validate and default a raw configuration
pub fn normalize(raw: &RawConfig) -> Result<StorageConfig> {
    let end_point = required_string("endPoint", raw.end_point.as_ref().or(raw.host.as_ref()))?;
    let access_key = required_string("accessKey", raw.access_key.as_ref())?;
    let secret_key = required_string("secretKey", raw.secret_key.as_ref())?;
    let bucket = required_string("bucket", raw.bucket.as_ref())?;

    let end_point = if is_valid_ipv6(&end_point) {
        strip_brackets(&end_point).to_string()
    } else {
        end_point
    };
    validate_endpoint(&end_point)?;
    validate_bucket_name(&bucket)?;

    let use_ssl = optional_bool("useSSL", raw.use_ssl.as_ref(), false);
    let port = resolve_port(raw.port.as_ref(), use_ssl);
    let private = optional_bool("private", raw.private.as_ref(), false);

    let config = StorageConfig {
        end_point,
        port,
        use_ssl,
        access_key,
        secret_key,
        bucket,
        folder: optional_string("folder", raw.folder.as_ref()),
        private,
        expiry: optional_int("expiry", raw.expiry.as_ref(), DEFAULT_EXPIRY_SECS as i64, |v| {
            v > 0
        }) as u64,
        connect_timeout: optional_int(
            "connectTimeout",
            raw.connect_timeout.as_ref(),
            DEFAULT_CONNECT_TIMEOUT_MS as i64,
            |v| v > 0,
        ) as u64,
        debug: optional_bool("debug", raw.debug.as_ref(), false),
        reject_unauthorized: optional_bool(
            "rejectUnauthorized",
            raw.reject_unauthorized.as_ref(),
            true,
        ),
        max_retries: optional_int(
            "maxRetries",
            raw.max_retries.as_ref(),
            DEFAULT_MAX_RETRIES.into(),
            |v| (0..=i64::from(u32::MAX)).contains(&v),
        ) as u32,
        retry_delay: optional_int(
            "retryDelay",
            raw.retry_delay.as_ref(),
            DEFAULT_RETRY_DELAY_MS as i64,
            |v| v >= 0,
        ) as u64,
        keep_alive: optional_bool("keepAlive", raw.keep_alive.as_ref(), false),
    };

    if config.private && (config.access_key.is_empty() || config.secret_key.is_empty()) {
        return Err(ConfigError::PrivateWithoutCredentials.into());
    }
    if !config.reject_unauthorized {
        warn!(
            endpoint = %config.end_point,
            "TLS certificate verification is disabled; only use this with self-signed certificates outside production"
        );
    }

    debug!(
        endpoint = %config.end_point,
        port = config.port,
        use_ssl = config.use_ssl,
        bucket = %config.bucket,
        private = config.private,
        "Configuration normalized"
    );

    Ok(config)
}

/// [`normalize`] with warnings routed to an explicit subscriber
pub fn normalize_with(raw: &RawConfig, dispatch: &Dispatch) -> Result<StorageConfig> {
    tracing::dispatcher::with_default(dispatch, || normalize(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn local() -> RawConfig {
        RawConfig::new()
            .with_endpoint("localhost")
            .with_access_key("k")
            .with_secret_key("s")
            .with_bucket("bkt")
    }

    #[test]
    fn test_defaults() {
        let config = normalize(&local()).unwrap();
        assert_eq!(config.endpoint(), "localhost");
        assert_eq!(config.port(), 9000);
        assert!(!config.use_ssl());
        assert_eq!(config.expiry_secs(), 604_800);
        assert_eq!(config.connect_timeout(), Duration::from_millis(60_000));
        assert_eq!(config.max_retries(), 3);
        assert_eq!(config.retry_delay(), Duration::from_millis(1_000));
        assert!(!config.keep_alive());
        assert!(config.reject_unauthorized());
        assert!(!config.is_private());
        assert!(!config.debug());
        assert_eq!(config.folder(), None);
    }

    #[test]
    fn test_tls_default_port() {
        let config = normalize(&local().with_use_ssl(true)).unwrap();
        assert_eq!(config.port(), 443);
        assert!(config.use_ssl());
    }

    #[test]
    fn test_tls_with_minio_port_is_corrected() {
        let config = normalize(&local().with_use_ssl("TRUE").with_port("9000")).unwrap();
        assert_eq!(config.port(), 443);
    }

    #[test]
    fn test_port_443_without_tls_is_kept() {
        let config = normalize(&local().with_port(443u16)).unwrap();
        assert_eq!(config.port(), 443);
        assert!(!config.use_ssl());
    }

    #[test]
    fn test_invalid_ports_fall_back() {
        for bad in [
            RawValue::from("abc"),
            RawValue::from(0),
            RawValue::from(70_000),
            RawValue::from(9000.5),
            RawValue::from(true),
        ] {
            let mut raw = local();
            raw.port = Some(bad);
            assert_eq!(normalize(&raw).unwrap().port(), 9000);
        }
    }

    #[test]
    fn test_string_coercion() {
        let raw = local()
            .with_port(" 9100 ")
            .with_expiry("3600")
            .with_private("true")
            .with_keep_alive("1")
            .with_reject_unauthorized("False")
            .with_max_retries("5")
            .with_retry_delay("250")
            .with_connect_timeout(5000.0);
        let config = normalize(&raw).unwrap();
        assert_eq!(config.port(), 9100);
        assert_eq!(config.expiry_secs(), 3600);
        assert!(config.is_private());
        assert!(config.keep_alive());
        assert!(!config.reject_unauthorized());
        assert_eq!(config.max_retries(), 5);
        assert_eq!(config.retry_delay(), Duration::from_millis(250));
        assert_eq!(config.connect_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_invalid_optional_values_fall_back() {
        let raw = local()
            .with_expiry("-5")
            .with_connect_timeout("soon")
            .with_max_retries(-1)
            .with_keep_alive("maybe")
            .with_use_ssl("yes please");
        let config = normalize(&raw).unwrap();
        assert_eq!(config.expiry_secs(), DEFAULT_EXPIRY_SECS);
        assert_eq!(config.connect_timeout(), Duration::from_millis(60_000));
        assert_eq!(config.max_retries(), 3);
        assert!(!config.keep_alive());
        assert!(!config.use_ssl());
    }

    #[test]
    fn test_host_alias() {
        let mut raw = local();
        raw.end_point = None;
        raw.host = Some(" minio.example.com ".into());
        assert_eq!(normalize(&raw).unwrap().endpoint(), "minio.example.com");
    }

    #[test]
    fn test_endpoint_takes_precedence_over_host() {
        let raw = local().with_host("other.example.com");
        assert_eq!(normalize(&raw).unwrap().endpoint(), "localhost");
    }

    #[test]
    fn test_required_field_failures() {
        let mut raw = local();
        raw.bucket = None;
        assert!(matches!(
            normalize(&raw),
            Err(Error::Configuration(ConfigError::Missing { field: "bucket" }))
        ));

        let raw = local().with_access_key("   ");
        assert!(matches!(
            normalize(&raw),
            Err(Error::Configuration(ConfigError::Empty { field: "accessKey" }))
        ));

        let raw = local().with_secret_key(42);
        assert!(matches!(
            normalize(&raw),
            Err(Error::Configuration(ConfigError::NotAString { field: "secretKey" }))
        ));

        let mut raw = local();
        raw.end_point = None;
        assert!(matches!(
            normalize(&raw),
            Err(Error::Configuration(ConfigError::Missing { field: "endPoint" }))
        ));
    }

    #[test]
    fn test_format_failures() {
        assert!(matches!(
            normalize(&local().with_bucket("Bad_Bucket")),
            Err(Error::Configuration(ConfigError::InvalidBucket { .. }))
        ));
        assert!(matches!(
            normalize(&local().with_endpoint("https://minio.example.com")),
            Err(Error::Configuration(ConfigError::InvalidHostname { .. }))
        ));
    }

    #[test]
    fn test_values_are_trimmed() {
        let raw = local()
            .with_bucket("  bkt ")
            .with_access_key(" key ")
            .with_folder("  uploads  ");
        let config = normalize(&raw).unwrap();
        assert_eq!(config.bucket(), "bkt");
        assert_eq!(config.access_key(), "key");
        assert_eq!(config.folder(), Some("uploads"));
    }

    #[test]
    fn test_blank_folder_is_none() {
        let config = normalize(&local().with_folder("   ")).unwrap();
        assert_eq!(config.folder(), None);
    }

    #[test]
    fn test_ipv6_endpoint_brackets_removed() {
        let config = normalize(&local().with_endpoint("[::1]")).unwrap();
        assert_eq!(config.endpoint(), "::1");
    }

    #[test]
    fn test_from_json_and_toml() {
        let json = r#"{"endPoint":"localhost","port":"9001","useSSL":false,
            "accessKey":"k","secretKey":"s","bucket":"bkt","expiry":60}"#;
        let config = normalize(&RawConfig::from_json_str(json).unwrap()).unwrap();
        assert_eq!(config.port(), 9001);
        assert_eq!(config.expiry_secs(), 60);

        let toml_str = r#"
            endpoint = "minio.local"
            use_ssl = "true"
            access_key = "k"
            secret_key = "s"
            bucket = "media"
            folder = 2024
        "#;
        let config = normalize(&RawConfig::from_toml_str(toml_str).unwrap()).unwrap();
        assert_eq!(config.endpoint(), "minio.local");
        assert!(config.use_ssl());
        assert_eq!(config.port(), 443);
        assert_eq!(config.folder(), Some("2024"));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            RawConfig::from_json_str("{not json"),
            Err(Error::Configuration(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn test_merge_overrides() {
        let base = local().with_port(9001u16).with_folder("a");
        let merged = base.merge(RawConfig::new().with_port(9002u16));
        let config = normalize(&merged).unwrap();
        assert_eq!(config.port(), 9002);
        assert_eq!(config.folder(), Some("a"));
    }

    #[test]
    fn test_secret_is_not_exposed() {
        let config = normalize(&local().with_secret_key("hunter2")).unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"endPoint\":\"localhost\""));
    }

    #[test]
    fn test_coercions() {
        assert_eq!(coerce_int(&RawValue::from("42")), Some(42));
        assert_eq!(coerce_int(&RawValue::from("42.0")), Some(42));
        assert_eq!(coerce_int(&RawValue::from(1.5)), None);
        assert_eq!(coerce_int(&RawValue::from(true)), None);
        assert_eq!(coerce_bool(&RawValue::from("TRUE")), Some(true));
        assert_eq!(coerce_bool(&RawValue::from("0")), Some(false));
        assert_eq!(coerce_bool(&RawValue::from(1)), Some(true));
        assert_eq!(coerce_bool(&RawValue::from("yes")), None);
    }
}
