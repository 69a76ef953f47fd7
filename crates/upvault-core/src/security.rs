//! Object key construction with path traversal protection
//!
//! Every uploaded file is stored under `folder/path/hash.ext`. Each of those
//! parts comes from configuration or from the host and is sanitized on its
//! own before the key is assembled, so the final key never contains `..`,
//! `~`, a leading separator, NUL or other control characters.

use crate::{Error, Result};
use tracing::error;

/// The key-relevant parts of a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathParts<'a> {
    /// Content hash, used as the file name
    pub hash: Option<&'a str>,
    /// Extension, with or without the leading dot
    pub ext: Option<&'a str>,
    /// Optional relative directory supplied by the host
    pub path: Option<&'a str>,
}

impl<'a> PathParts<'a> {
    /// Parts for a file stored directly under the folder
    pub fn new(hash: &'a str, ext: &'a str) -> Self {
        Self {
            hash: Some(hash),
            ext: Some(ext),
            path: None,
        }
    }

    /// Add a relative directory
    pub fn with_path(mut self, path: &'a str) -> Self {
        self.path = Some(path);
        self
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Absolute-looking input: leading separator or a Windows drive prefix
fn looks_absolute(s: &str) -> bool {
    if s.starts_with(is_separator) {
        return true;
    }
    let mut chars = s.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(drive), Some(':'), next) if drive.is_ascii_alphabetic() && next.map_or(true, is_separator)
    )
}

/// Sanitize a single key segment
///
/// Trims whitespace, strips NUL and control characters, and collapses runs
/// of `/` or `\` into a single `/`. Fails if what remains contains `..` or
/// `~`, or starts with a separator.
pub fn sanitize_segment(segment: &str) -> Result<String> {
    let mut cleaned = String::with_capacity(segment.len());
    let mut last_was_separator = false;

    for c in segment.trim().chars() {
        if c.is_ascii_control() {
            continue;
        }
        if is_separator(c) {
            if !last_was_separator {
                cleaned.push('/');
            }
            last_was_separator = true;
        } else {
            cleaned.push(c);
            last_was_separator = false;
        }
    }

    if cleaned.contains("..") {
        error!(segment, "Key segment contains a parent directory sequence");
        return Err(Error::path_traversal(segment, "contains `..`"));
    }
    if cleaned.contains('~') {
        error!(segment, "Key segment contains a home directory marker");
        return Err(Error::path_traversal(segment, "contains `~`"));
    }
    if cleaned.starts_with('/') {
        error!(segment, "Key segment is absolute");
        return Err(Error::path_traversal(segment, "must not start with a separator"));
    }

    Ok(cleaned)
}

/// Sanitize a directory-like prefix into `a/b/c` form (possibly empty)
fn sanitize_directory(label: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if looks_absolute(trimmed) {
        error!(label, value, "Absolute directory rejected");
        return Err(Error::path_traversal(value, format!("{} must be relative", label)));
    }

    let normalized = sanitize_segment(trimmed)?;
    let parts: Vec<&str> = normalized
        .split('/')
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();

    Ok(parts.join("/"))
}

/// Sanitize the hash or extension: one non-empty segment, no separators
fn sanitize_file_name_part(label: &str, value: &str) -> Result<String> {
    let cleaned = sanitize_segment(value)?;
    if cleaned.is_empty() {
        return Err(Error::path_traversal(value, format!("{} is empty", label)));
    }
    if cleaned.contains('/') {
        error!(label, value, "Separator in file name component");
        return Err(Error::path_traversal(
            value,
            format!("{} must not contain a path separator", label),
        ));
    }
    Ok(cleaned)
}

/// Build the object key for a file
///
/// The result is `[folder/][path/]hash.ext`, omitting empty parts.
///
/// # Errors
/// Returns [`Error::PathTraversal`] when the folder or path is absolute or
/// contains a traversal sequence, or when the hash or extension is missing
/// or empty after sanitization, or contains a path separator.
pub fn build_upload_path(parts: PathParts<'_>, folder: Option<&str>) -> Result<String> {
    let folder = match folder {
        Some(f) => sanitize_directory("folder", f)?,
        None => String::new(),
    };
    let path = match parts.path {
        Some(p) => sanitize_directory("file path", p)?,
        None => String::new(),
    };

    let hash = parts
        .hash
        .ok_or_else(|| Error::path_traversal("", "file hash is missing"))?;
    let hash = sanitize_file_name_part("file hash", hash)?;

    let ext = parts
        .ext
        .ok_or_else(|| Error::path_traversal("", "file extension is missing"))?;
    let ext_clean = sanitize_file_name_part("file extension", ext.trim().trim_start_matches('.'))?;

    let file_name = format!("{}.{}", hash, ext_clean);
    let key = [folder.as_str(), path.as_str(), file_name.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    // hash "a." with ext "b" would otherwise join into "a..b"
    if key.contains("..") {
        error!(key = %key, "Assembled key contains a parent directory sequence");
        return Err(Error::path_traversal(key, "assembled key contains `..`"));
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_key() {
        let key = build_upload_path(PathParts::new("abc123", ".jpg"), Some("uploads")).unwrap();
        assert_eq!(key, "uploads/abc123.jpg");
    }

    #[test]
    fn test_without_folder() {
        let key = build_upload_path(PathParts::new("abc123", "png"), None).unwrap();
        assert_eq!(key, "abc123.png");
    }

    #[test]
    fn test_with_file_path() {
        let parts = PathParts::new("h", ".pdf").with_path("docs\\\\2024//q1/");
        let key = build_upload_path(parts, Some("uploads/")).unwrap();
        assert_eq!(key, "uploads/docs/2024/q1/h.pdf");
    }

    #[test]
    fn test_control_characters_are_stripped() {
        let parts = PathParts::new("ab\0c\u{7f}1\n", ".jpg");
        let key = build_upload_path(parts, Some("up\tloads")).unwrap();
        assert_eq!(key, "uploads/abc1.jpg");
    }

    #[test]
    fn test_traversal_in_hash() {
        let err = build_upload_path(PathParts::new("../evil", ".jpg"), Some("uploads"));
        assert!(matches!(err, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn test_traversal_in_folder_and_path() {
        for bad in ["../etc", "/etc", "\\etc", "~root", "a/../../b", "C:\\Windows"] {
            assert!(
                build_upload_path(PathParts::new("h", "jpg"), Some(bad)).is_err(),
                "folder {:?} should be rejected",
                bad
            );
            assert!(
                build_upload_path(PathParts::new("h", "jpg").with_path(bad), None).is_err(),
                "path {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_missing_hash_or_extension() {
        let parts = PathParts {
            hash: None,
            ext: Some("jpg"),
            path: None,
        };
        assert!(build_upload_path(parts, None).is_err());
        assert!(build_upload_path(PathParts::new(" \0 ", "jpg"), None).is_err());
        assert!(build_upload_path(PathParts::new("h", "."), None).is_err());
        assert!(build_upload_path(PathParts::new("h", ""), None).is_err());
    }

    #[test]
    fn test_extension_leading_dots_removed() {
        let key = build_upload_path(PathParts::new("h", "..jpg"), None).unwrap();
        assert_eq!(key, "h.jpg");
    }

    #[test]
    fn test_separators_in_hash_or_extension() {
        for hash in ["abc/", "a/./b", "a\\b", "a//b"] {
            assert!(
                matches!(
                    build_upload_path(PathParts::new(hash, "jpg"), Some("uploads")),
                    Err(Error::PathTraversal { .. })
                ),
                "hash {:?} should be rejected",
                hash
            );
        }
        assert!(build_upload_path(PathParts::new("h", "tar/gz"), None).is_err());
    }

    #[test]
    fn test_dotted_hash_cannot_form_traversal() {
        assert!(build_upload_path(PathParts::new("h.", "jpg"), None).is_err());
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("  a//b\\\\c ").unwrap(), "a/b/c");
        assert!(sanitize_segment("/a").is_err());
        assert!(sanitize_segment("a/..").is_err());
        assert!(sanitize_segment("~").is_err());
    }
}
