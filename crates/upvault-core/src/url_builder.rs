//! Public URL construction and ownership checks
//!
//! File URLs have the form `scheme://endpoint[:port]/bucket/key`. The host
//! records them and hands them back for deletion and signing, sometimes years
//! later and after the store has moved to a different endpoint, so the
//! inverse direction has to be tolerant about the host part.

use crate::config::{StorageConfig, DEFAULT_TLS_PORT, HTTP_PORT};
use crate::validation::{is_valid_ipv6, strip_brackets};
use crate::{Error, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;
use tracing::trace;
use url::Url;

/// Query parameters that mark a URL as already presigned
const PRESIGN_MARKERS: &[&str] = &[
    "X-Amz-Algorithm",
    "X-Amz-Credential",
    "X-Amz-Date",
    "X-Amz-Expires",
    "X-Amz-Signature",
    "X-Amz-SignedHeaders",
];

/// Characters escaped in each key segment of a file URL
///
/// Covers everything a URL parser would treat as a delimiter or re-encode,
/// so decoding the path once gives back the exact key.
const KEY_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// How a URL relates to the configured bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlOwnership {
    /// Same endpoint host and the path starts with the bucket
    Owned,
    /// The path starts with the bucket but the host is a different domain.
    ///
    /// Accepted for records written before an endpoint migration. This is
    /// intentionally loose: any hostname containing a dot qualifies.
    LegacyHost,
    /// Belongs to some other bucket or provider
    Foreign,
}

/// Result of recovering an object key from a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMatch {
    /// The key within the bucket (empty when the URL names the bucket itself)
    Matched(String),
    /// The URL does not point into the bucket
    NotOwned,
}

/// `scheme://endpoint[:port]/` for the configured store
///
/// The port is omitted when it is the scheme's conventional one.
pub fn build_host_url(config: &StorageConfig) -> String {
    let (scheme, conventional_port) = if config.use_ssl() {
        ("https", DEFAULT_TLS_PORT)
    } else {
        ("http", HTTP_PORT)
    };

    let host = if is_valid_ipv6(config.endpoint()) {
        format!("[{}]", strip_brackets(config.endpoint()))
    } else {
        config.endpoint().to_string()
    };

    if config.port() == conventional_port {
        format!("{}://{}/", scheme, host)
    } else {
        format!("{}://{}:{}/", scheme, host, config.port())
    }
}

/// Public URL of an object
///
/// Each `/`-separated segment of the key is percent-encoded, so keys holding
/// `?`, `#` or `%` survive [`extract_file_path_from_url`] unchanged.
pub fn create_file_url(path: &str, host_url: &str, bucket: &str) -> String {
    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
        .collect();
    format!("{}{}/{}", host_url, bucket, encoded.join("/"))
}

fn decode(s: &str) -> Cow<'_, str> {
    percent_decode_str(s).decode_utf8_lossy()
}

/// The URL without its query string and fragment, still encoded
fn strip_query(url: &str) -> &str {
    let url = url.trim();
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    &url[..end]
}

fn decoded_pathname(url: &Url) -> String {
    decode(url.path()).into_owned()
}

fn path_in_bucket(pathname: &str, bucket: &str) -> bool {
    pathname
        .strip_prefix('/')
        .and_then(|p| p.strip_prefix(bucket))
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Whether the URL's path is `/bucket` or starts with `/bucket/`, whatever the host
///
/// Returns `false` for empty or unparsable input.
pub fn pathname_contains_bucket(url: &str, bucket: &str) -> bool {
    if url.trim().is_empty() || bucket.is_empty() {
        return false;
    }
    match Url::parse(url.trim()) {
        Ok(parsed) => path_in_bucket(&decoded_pathname(&parsed), bucket),
        Err(_) => false,
    }
}

/// Whether the URL is on the configured endpoint host and inside the bucket
///
/// Hostnames compare case-insensitively; the port is ignored. Returns
/// `false` for empty or unparsable input.
pub fn is_file_from_same_bucket(url: &str, endpoint: &str, bucket: &str) -> bool {
    if url.trim().is_empty() || endpoint.is_empty() || bucket.is_empty() {
        return false;
    }
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };

    strip_brackets(host).eq_ignore_ascii_case(strip_brackets(endpoint))
        && path_in_bucket(&decoded_pathname(&parsed), bucket)
}

/// Decide whether a URL belongs to the configured bucket
pub fn classify_url(url: &str, endpoint: &str, bucket: &str) -> UrlOwnership {
    if is_file_from_same_bucket(url, endpoint, bucket) {
        return UrlOwnership::Owned;
    }
    if !pathname_contains_bucket(url, bucket) {
        return UrlOwnership::Foreign;
    }

    let domain_like = Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.contains('.')))
        .unwrap_or(false);
    if domain_like {
        UrlOwnership::LegacyHost
    } else {
        UrlOwnership::Foreign
    }
}

/// Recover the object key from a URL
///
/// Tried in order: exact `host_url + bucket + "/"` prefix; a path starting
/// with `/bucket/`; a path equal to `/bucket`; a first non-empty path segment
/// equal to the bucket. The query string and fragment are dropped first, and
/// the recovered key is percent-decoded exactly once.
pub fn match_object_key(url: &str, host_url: &str, bucket: &str) -> KeyMatch {
    let base = strip_query(url);

    let prefix = format!("{}{}/", host_url, bucket);
    if let Some(rest) = base.strip_prefix(&prefix) {
        trace!(url, "Matched object key by host prefix");
        return KeyMatch::Matched(decode(rest.trim_start_matches('/')).into_owned());
    }

    let Ok(parsed) = Url::parse(base) else {
        return KeyMatch::NotOwned;
    };
    let pathname = parsed.path();

    if let Some(rest) = pathname.strip_prefix(&format!("/{}/", bucket)) {
        trace!(url, "Matched object key by bucket path");
        return KeyMatch::Matched(decode(rest.trim_start_matches('/')).into_owned());
    }
    if pathname == format!("/{}", bucket) {
        return KeyMatch::Matched(String::new());
    }

    let segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&bucket) {
        trace!(url, "Matched object key by path segments");
        return KeyMatch::Matched(decode(&segments[1..].join("/")).into_owned());
    }

    KeyMatch::NotOwned
}

/// Recover the object key from a previously issued URL
///
/// # Errors
/// Fails when `url` is empty or does not point into `bucket`.
pub fn extract_file_path_from_url(url: &str, host_url: &str, bucket: &str) -> Result<String> {
    if url.trim().is_empty() {
        return Err(Error::invalid_url(url, "URL is empty"));
    }
    match match_object_key(url, host_url, bucket) {
        KeyMatch::Matched(key) => Ok(key),
        KeyMatch::NotOwned => Err(Error::invalid_url(
            url,
            format!("no object key for bucket `{}` found", bucket),
        )),
    }
}

/// Whether the URL already carries presigning query parameters
pub fn has_presign_markers(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };

    let mut signature = false;
    let mut expires = false;
    for (name, _) in parsed.query_pairs() {
        if PRESIGN_MARKERS.iter().any(|m| m.eq_ignore_ascii_case(&name)) {
            return true;
        }
        // SigV2 style
        signature |= name == "Signature";
        expires |= name == "Expires";
    }
    signature && expires
}
