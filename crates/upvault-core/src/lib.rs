//! upvault-core - the synchronous half of the upvault S3 upload provider
//!
//! This crate turns a loosely typed options bag into a validated
//! [`StorageConfig`], builds sanitized object keys for uploaded files, and
//! converts between object keys and the public URLs recorded by the host.
//! Nothing in here talks to the network; see `upvault-cloud` for that.

pub mod config;
pub mod error;
pub mod security;
pub mod url_builder;
pub mod validation;

pub use config::{normalize, normalize_with, RawConfig, RawValue, StorageConfig};
pub use error::{ConfigError, Error, ErrorContext, Remediation, Result};
pub use security::{build_upload_path, sanitize_segment, PathParts};
pub use url_builder::{
    build_host_url, classify_url, create_file_url, extract_file_path_from_url,
    has_presign_markers, is_file_from_same_bucket, match_object_key, pathname_contains_bucket,
    KeyMatch, UrlOwnership,
};
