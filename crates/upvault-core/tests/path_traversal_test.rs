//! Integration tests for object key construction and recovery

use proptest::prelude::*;
use upvault_core::security::{build_upload_path, PathParts};
use upvault_core::url_builder::{create_file_url, extract_file_path_from_url};
use upvault_core::Error;

#[test]
fn test_documented_scenarios() {
    assert_eq!(
        build_upload_path(PathParts::new("abc123", ".jpg"), Some("uploads")).unwrap(),
        "uploads/abc123.jpg"
    );
    assert!(matches!(
        build_upload_path(PathParts::new("../evil", ".jpg"), Some("uploads")),
        Err(Error::PathTraversal { .. })
    ));
    assert_eq!(
        extract_file_path_from_url(
            "http://h/bkt/uploads/f.jpg?X-Amz-Signature=z",
            "http://h/",
            "bkt"
        )
        .unwrap(),
        "uploads/f.jpg"
    );
}

#[test]
fn test_malicious_folders() {
    let parts = PathParts::new("abc", "png");

    assert!(build_upload_path(parts, Some("../uploads")).is_err());
    assert!(build_upload_path(parts, Some("uploads/../../etc")).is_err());
    assert!(build_upload_path(parts, Some("/var/www")).is_err());
    assert!(build_upload_path(parts, Some("\\\\server\\share")).is_err());
    assert!(build_upload_path(parts, Some("~/uploads")).is_err());
    assert!(build_upload_path(parts, Some("D:/data")).is_err());

    // Tolerated: relative folders with messy separators
    assert_eq!(
        build_upload_path(parts, Some("./media//images\\")).unwrap(),
        "media/images/abc.png"
    );
}

#[test]
fn test_url_reserved_characters_round_trip() {
    let host = "http://minio.local:9000/";
    for hash in ["a#b", "a?b", "a%41b", "a%2520b"] {
        let key = build_upload_path(PathParts::new(hash, ".jpg"), Some("uploads")).unwrap();
        let url = create_file_url(&key, host, "media");
        assert_eq!(extract_file_path_from_url(&url, host, "media").unwrap(), key);
    }
}

#[test]
fn test_traversal_hidden_behind_control_characters() {
    let parts = PathParts::new("abc", "png");
    assert!(build_upload_path(parts, Some(".\0./etc")).is_err());
    assert!(build_upload_path(parts.with_path("\u{1}/..\u{7f}/x"), None).is_err());
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9][a-zA-Z0-9_%?#&+= -]{0,11}"
}

fn directory() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(proptest::collection::vec(segment(), 1..4).prop_map(|s| s.join("/")))
}

proptest! {
    #[test]
    fn prop_key_survives_url_round_trip(
        folder in directory(),
        path in directory(),
        hash in "[a-f0-9][a-f0-9%?#&+ ]{6,38}[a-f0-9]",
        ext in "\\.?[a-z0-9]{1,5}",
    ) {
        let mut parts = PathParts::new(&hash, &ext);
        if let Some(p) = path.as_deref() {
            parts = parts.with_path(p);
        }

        let key = build_upload_path(parts, folder.as_deref()).unwrap();
        let host = "http://minio.local:9000/";
        let url = create_file_url(&key, host, "media");
        prop_assert_eq!(extract_file_path_from_url(&url, host, "media").unwrap(), key.clone());

        let moved = url.replacen(host, "https://old.example.com/", 1);
        prop_assert_eq!(extract_file_path_from_url(&moved, host, "media").unwrap(), key);
    }

    #[test]
    fn prop_keys_never_contain_unsafe_sequences(
        folder in directory(),
        hash in "[a-zA-Z0-9.\\x00-\\x1f]{1,20}",
        ext in "[a-z.]{1,6}",
    ) {
        if let Ok(key) = build_upload_path(PathParts::new(&hash, &ext), folder.as_deref()) {
            prop_assert!(!key.contains(".."));
            prop_assert!(!key.starts_with('/'));
            prop_assert!(!key.chars().any(|c| c.is_ascii_control()));
        }
    }

    #[test]
    fn prop_traversal_folders_rejected(
        prefix in "[a-z]{0,5}",
        marker in prop_oneof![Just("../"), Just("/"), Just("~"), Just("\\")],
    ) {
        let folder = format!("{}{}", marker, prefix);
        let result = build_upload_path(PathParts::new("abc", "jpg"), Some(&folder));
        prop_assert!(result.is_err(), "folder {:?} accepted", folder);
    }
}
