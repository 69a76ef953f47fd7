//! Failure classification for object store errors
//!
//! Client errors arrive as opaque messages from several layers (HTTP
//! transport, TLS, the S3 XML error body). The patterns below map the common
//! ones onto a [`Remediation`] the operator can act on.

use crate::file::FileDescriptor;
use upvault_core::{ErrorContext, Remediation, StorageConfig};

/// Access key shipped as the default by MinIO
const DEFAULT_ACCESS_KEY: &str = "minioadmin";

/// Port MinIO listens on by default
const DEFAULT_MINIO_PORT: u16 = 9000;

const CONNECTION_PATTERNS: &[&str] = &[
    "connection refused",
    "econnrefused",
    "enotfound",
    "timed out",
    "timeout",
    "dns error",
    "error trying to connect",
    "connection reset",
    "failed to lookup address",
];

const BUCKET_PATTERNS: &[&str] = &["nosuchbucket", "bucket does not exist"];

const CREDENTIAL_PATTERNS: &[&str] = &[
    "signaturedoesnotmatch",
    "invalidaccesskeyid",
    "accessdenied",
    "access denied",
    "signature",
    "forbidden",
];

const CERTIFICATE_PATTERNS: &[&str] = &[
    "certificate",
    "self signed",
    "self-signed",
    "unknownissuer",
    "invalid peer certificate",
    "tls handshake",
];

fn matches_any(message: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| message.contains(p))
}

fn is_local(endpoint: &str) -> bool {
    endpoint.eq_ignore_ascii_case("localhost")
        || endpoint == "::1"
        || endpoint.starts_with("127.")
        || endpoint.ends_with(".local")
}

/// Credentials that only make sense against a different, well-known endpoint
///
/// Either the MinIO default access key is pointed at a remote host, or the
/// MinIO default port is combined with an AWS hostname.
fn default_endpoint_mismatch(config: &StorageConfig) -> bool {
    let endpoint = config.endpoint();
    (config.access_key() == DEFAULT_ACCESS_KEY && !is_local(endpoint))
        || (config.port() == DEFAULT_MINIO_PORT
            && endpoint.to_ascii_lowercase().ends_with("amazonaws.com"))
}

/// Classify a client failure message
///
/// Certificate problems are checked before connection problems because TLS
/// failures are usually reported as connection errors too.
pub fn classify(message: &str, config: &StorageConfig) -> Option<Remediation> {
    let message = message.to_ascii_lowercase();

    if matches_any(&message, CERTIFICATE_PATTERNS) {
        Some(Remediation::Certificate)
    } else if matches_any(&message, BUCKET_PATTERNS) {
        Some(Remediation::BucketMissing)
    } else if matches_any(&message, CREDENTIAL_PATTERNS) {
        if default_endpoint_mismatch(config) {
            Some(Remediation::CredentialsForDefaultEndpoint)
        } else {
            Some(Remediation::Credentials)
        }
    } else if matches_any(&message, CONNECTION_PATTERNS) {
        Some(Remediation::Connection)
    } else {
        None
    }
}

/// Context shared by every operation error: where the request went
pub fn base_context(config: &StorageConfig) -> ErrorContext {
    ErrorContext::new()
        .with("bucket", config.bucket())
        .with("endpoint", format!("{}:{}", config.endpoint(), config.port()))
}

/// Context for a failed upload
pub fn upload_context(config: &StorageConfig, file: &FileDescriptor, key: Option<&str>) -> ErrorContext {
    let mut context = base_context(config).with("filename", &file.name);
    if let Some(size) = file.size {
        context.insert("size", size);
    }
    if let Some(key) = key {
        context.insert("key", key);
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use upvault_core::{normalize, RawConfig};

    fn config(endpoint: &str, access_key: &str, port: u16) -> StorageConfig {
        normalize(
            &RawConfig::new()
                .with_endpoint(endpoint)
                .with_port(port)
                .with_access_key(access_key)
                .with_secret_key("s")
                .with_bucket("media"),
        )
        .unwrap()
    }

    #[test]
    fn test_classification() {
        let c = config("localhost", "k", 9000);
        assert_eq!(
            classify("error trying to connect: tcp connect error: Connection refused", &c),
            Some(Remediation::Connection)
        );
        assert_eq!(
            classify("<Code>NoSuchBucket</Code>", &c),
            Some(Remediation::BucketMissing)
        );
        assert_eq!(
            classify("SignatureDoesNotMatch", &c),
            Some(Remediation::Credentials)
        );
        assert_eq!(
            classify("invalid peer certificate: UnknownIssuer", &c),
            Some(Remediation::Certificate)
        );
        assert_eq!(classify("something else entirely", &c), None);
    }

    #[test]
    fn test_default_credentials_on_remote_endpoint() {
        let remote = config("storage.example.com", "minioadmin", 443);
        assert_eq!(
            classify("InvalidAccessKeyId", &remote),
            Some(Remediation::CredentialsForDefaultEndpoint)
        );

        let local = config("localhost", "minioadmin", 9000);
        assert_eq!(
            classify("InvalidAccessKeyId", &local),
            Some(Remediation::Credentials)
        );

        let aws = config("s3.amazonaws.com", "AKIA", 9000);
        assert_eq!(
            classify("SignatureDoesNotMatch", &aws),
            Some(Remediation::CredentialsForDefaultEndpoint)
        );
    }

    #[test]
    fn test_upload_context() {
        let c = config("localhost", "k", 9000);
        let file = FileDescriptor::new("cat.jpg", "h", "jpg").with_size(12);
        let ctx = upload_context(&c, &file, Some("uploads/h.jpg"));
        assert_eq!(ctx.get("filename"), Some("cat.jpg"));
        assert_eq!(ctx.get("size"), Some("12"));
        assert_eq!(ctx.get("bucket"), Some("media"));
        assert_eq!(ctx.get("endpoint"), Some("localhost:9000"));
        assert_eq!(ctx.get("key"), Some("uploads/h.jpg"));
    }
}
