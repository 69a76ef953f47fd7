//! Error types for upvault-core

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Structured diagnostic details attached to operation errors
///
/// Keys are kept sorted so that rendered messages are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext(BTreeMap<String, String>);

impl ErrorContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, returning the updated context
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace an entry
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Look up an entry
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the context holds no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Reasons a raw configuration is rejected
///
/// Only identity-critical fields (endpoint, keys, bucket) ever produce one of
/// these. Tuning knobs fall back to their defaults instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field was not supplied at all
    #[error("required field `{field}` is missing")]
    Missing { field: &'static str },

    /// A required field was supplied with a non-string value
    #[error("required field `{field}` must be a string")]
    NotAString { field: &'static str },

    /// A required field was blank after trimming
    #[error("required field `{field}` is empty")]
    Empty { field: &'static str },

    /// The endpoint is neither localhost, an IP literal nor a DNS hostname
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidHostname { endpoint: String, reason: String },

    /// The bucket name breaks object-store naming rules
    #[error("invalid bucket name `{bucket}`: {reason}")]
    InvalidBucket { bucket: String, reason: String },

    /// Private mode was requested without usable credentials
    #[error("private mode requires a non-empty access key and secret key")]
    PrivateWithoutCredentials,

    /// The configuration source could not be parsed
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Suggested fix for a failed object-store call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// The endpoint could not be reached
    Connection,
    /// The configured bucket does not exist
    BucketMissing,
    /// The store rejected the credentials or request signature
    Credentials,
    /// The credentials are a well-known default that only works on a local deployment
    CredentialsForDefaultEndpoint,
    /// TLS certificate verification failed
    Certificate,
}

impl Remediation {
    /// Human readable hint
    pub fn hint(&self) -> &'static str {
        match self {
            Remediation::Connection => {
                "check that the endpoint and port are correct and that the object store is running and reachable"
            }
            Remediation::BucketMissing => {
                "create the bucket or fix the bucket name in the configuration"
            }
            Remediation::Credentials => {
                "verify the access key and secret key, and that the server clock is in sync"
            }
            Remediation::CredentialsForDefaultEndpoint => {
                "the access key is the well-known default for a local MinIO deployment; configure the credentials issued for this endpoint"
            }
            Remediation::Certificate => {
                "the TLS certificate could not be verified; install a trusted certificate or set rejectUnauthorized=false for self-signed certificates outside production"
            }
        }
    }
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hint())
    }
}

/// Core error types for upvault
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing required configuration
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// An object key component could not be built safely
    #[error("Path traversal rejected for `{segment}`: {reason}")]
    PathTraversal { segment: String, reason: String },

    /// No object key could be recovered from a URL
    #[error("Cannot extract object key from `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The object-store PUT failed
    #[error(
        "Upload failed: {message} [{context}]{}",
        .remediation.map(|r| format!(" (hint: {})", r)).unwrap_or_default()
    )]
    Upload {
        message: String,
        context: ErrorContext,
        remediation: Option<Remediation>,
    },

    /// The object-store REMOVE failed or the file had no URL
    #[error("Delete failed: {message} [{context}]")]
    Delete {
        message: String,
        context: ErrorContext,
    },

    /// Presigning failed or the request was invalid
    #[error("Signed URL error: {message} [{context}]")]
    SignedUrl {
        message: String,
        context: ErrorContext,
    },
}

impl Error {
    /// Build a path traversal error
    pub fn path_traversal(segment: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::PathTraversal {
            segment: segment.into(),
            reason: reason.into(),
        }
    }

    /// Build an invalid URL error
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Diagnostic context, for the error kinds that carry one
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Upload { context, .. }
            | Error::Delete { context, .. }
            | Error::SignedUrl { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Remediation hint attached to an upload failure
    pub fn remediation(&self) -> Option<Remediation> {
        match self {
            Error::Upload { remediation, .. } => *remediation,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display_is_sorted() {
        let ctx = ErrorContext::new()
            .with("filename", "cat.jpg")
            .with("bucket", "media")
            .with("size", 42);
        assert_eq!(ctx.to_string(), "bucket=media, filename=cat.jpg, size=42");
    }

    #[test]
    fn test_upload_error_includes_hint() {
        let err = Error::Upload {
            message: "connection refused".to_string(),
            context: ErrorContext::new().with("bucket", "media"),
            remediation: Some(Remediation::Connection),
        };
        let text = err.to_string();
        assert!(text.contains("connection refused"));
        assert!(text.contains("bucket=media"));
        assert!(text.contains("hint: check that the endpoint"));
        assert_eq!(err.remediation(), Some(Remediation::Connection));
    }

    #[test]
    fn test_config_error_converts() {
        let err: Error = ConfigError::Missing { field: "bucket" }.into();
        assert!(matches!(
            err,
            Error::Configuration(ConfigError::Missing { field: "bucket" })
        ));
        assert!(err.context().is_none());
    }
}
