//! Endpoint and bucket name validation

use crate::error::ConfigError;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Longest DNS hostname accepted
pub const MAX_HOSTNAME_LEN: usize = 253;

/// Longest single DNS label accepted
pub const MAX_LABEL_LEN: usize = 63;

/// Shortest bucket name accepted
pub const MIN_BUCKET_LEN: usize = 3;

/// Longest bucket name accepted
pub const MAX_BUCKET_LEN: usize = 63;

/// Whether `s` is a dotted-quad IPv4 address
pub fn is_valid_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

/// Whether `s` is an IPv6 address, optionally wrapped in brackets
///
/// Accepts `::` compression (at most once) and at most eight groups.
pub fn is_valid_ipv6(s: &str) -> bool {
    strip_brackets(s).parse::<Ipv6Addr>().is_ok()
}

/// Whether `s` is a syntactically valid DNS hostname
pub fn is_valid_hostname(s: &str) -> bool {
    hostname_error(s).is_none()
}

fn hostname_error(s: &str) -> Option<String> {
    let host = s.strip_suffix('.').unwrap_or(s);
    if host.is_empty() {
        return Some("hostname is empty".to_string());
    }
    if host.len() > MAX_HOSTNAME_LEN {
        return Some(format!(
            "hostname is {} characters long, the maximum is {}",
            host.len(),
            MAX_HOSTNAME_LEN
        ));
    }

    let labels: Vec<&str> = host.split('.').collect();
    for label in &labels {
        if label.is_empty() {
            return Some("hostname contains an empty label".to_string());
        }
        if label.len() > MAX_LABEL_LEN {
            return Some(format!(
                "label `{}` exceeds {} characters",
                label, MAX_LABEL_LEN
            ));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Some(format!("label `{}` contains invalid characters", label));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Some(format!(
                "label `{}` must not start or end with a hyphen",
                label
            ));
        }
    }

    // A numeric top-level label means this was meant to be an IPv4 literal.
    if let Some(last) = labels.last() {
        if last.chars().all(|c| c.is_ascii_digit()) {
            return Some("looks like an IPv4 address but is not a valid one".to_string());
        }
    }

    None
}

/// Remove one pair of surrounding brackets from an IPv6 literal
pub fn strip_brackets(s: &str) -> &str {
    s.strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(s)
}

/// Validate an endpoint: `localhost`, an IPv4/IPv6 literal or a DNS hostname
pub fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    if endpoint.eq_ignore_ascii_case("localhost")
        || is_valid_ipv4(endpoint)
        || is_valid_ipv6(endpoint)
    {
        return Ok(());
    }

    if endpoint.contains("://") || endpoint.contains('/') {
        return Err(ConfigError::InvalidHostname {
            endpoint: endpoint.to_string(),
            reason: "expected a bare hostname without scheme or path".to_string(),
        });
    }

    if endpoint.contains(':') {
        return Err(ConfigError::InvalidHostname {
            endpoint: endpoint.to_string(),
            reason: "not a valid IPv6 address; configure the port separately".to_string(),
        });
    }

    match hostname_error(endpoint) {
        None => Ok(()),
        Some(reason) => Err(ConfigError::InvalidHostname {
            endpoint: endpoint.to_string(),
            reason,
        }),
    }
}

/// Validate a bucket name against S3 naming rules
pub fn validate_bucket_name(bucket: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBucket {
        bucket: bucket.to_string(),
        reason: reason.to_string(),
    };

    if bucket.len() < MIN_BUCKET_LEN || bucket.len() > MAX_BUCKET_LEN {
        return Err(invalid("must be between 3 and 63 characters long"));
    }
    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(invalid(
            "may only contain lowercase letters, digits, dots and hyphens",
        ));
    }

    let starts_ok = bucket.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = bucket.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if !starts_ok || !ends_ok {
        return Err(invalid("must start and end with a letter or digit"));
    }
    if bucket.contains("..") {
        return Err(invalid("must not contain consecutive dots"));
    }
    if looks_like_ipv4(bucket) {
        return Err(invalid("must not be formatted as an IP address"));
    }

    Ok(())
}

/// Four dot-separated groups of digits, whether or not each is in range
fn looks_like_ipv4(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4() {
        assert!(is_valid_ipv4("127.0.0.1"));
        assert!(is_valid_ipv4("192.168.1.254"));
        assert!(!is_valid_ipv4("256.1.1.1"));
        assert!(!is_valid_ipv4("1.2.3"));
        assert!(!is_valid_ipv4("1.2.3.4.5"));
    }

    #[test]
    fn test_ipv6() {
        assert!(is_valid_ipv6("::1"));
        assert!(is_valid_ipv6("[::1]"));
        assert!(is_valid_ipv6("2001:db8::8a2e:370:7334"));
        assert!(is_valid_ipv6("2001:0db8:0000:0000:0000:8a2e:0370:7334"));
        assert!(!is_valid_ipv6("2001:db8::1::2"));
        assert!(!is_valid_ipv6("1:2:3:4:5:6:7:8:9"));
        assert!(!is_valid_ipv6("12345::1"));
    }

    #[test]
    fn test_hostnames() {
        assert!(is_valid_hostname("minio.example.com"));
        assert!(is_valid_hostname("s3-eu-west-1.amazonaws.com"));
        assert!(is_valid_hostname("storage"));
        assert!(!is_valid_hostname("-bad.example.com"));
        assert!(!is_valid_hostname("bad-.example.com"));
        assert!(!is_valid_hostname("a..b"));
        assert!(!is_valid_hostname("under_score.com"));
        assert!(!is_valid_hostname(&format!("{}.com", "a".repeat(64))));
        assert!(!is_valid_hostname(&vec!["abcdefghi"; 30].join(".")));
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("localhost").is_ok());
        assert!(validate_endpoint("10.0.0.5").is_ok());
        assert!(validate_endpoint("fe80::1").is_ok());
        assert!(validate_endpoint("minio.internal").is_ok());
        assert!(validate_endpoint("http://minio.internal").is_err());
        assert!(validate_endpoint("minio.internal:9000").is_err());
        assert!(validate_endpoint("999.1.1.1").is_err());
    }

    #[test]
    fn test_bucket_names() {
        assert!(validate_bucket_name("bkt").is_ok());
        assert!(validate_bucket_name("my-bucket.assets").is_ok());
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
        assert!(validate_bucket_name("MyBucket").is_err());
        assert!(validate_bucket_name("-bucket").is_err());
        assert!(validate_bucket_name("bucket-").is_err());
        assert!(validate_bucket_name("my..bucket").is_err());
        assert!(validate_bucket_name("192.168.5.4").is_err());
        assert!(validate_bucket_name("under_score").is_err());
    }
}
