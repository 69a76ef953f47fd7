//! Content type lookup by file extension

use mime::Mime;

/// Extensions the host commonly uploads, beyond what the `mime` constants cover
const EXTRA_TYPES: &[(&str, &str)] = &[
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
    ("ico", "image/x-icon"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("md", "text/markdown"),
    ("xml", "application/xml"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
];

fn known(ext: &str) -> Option<Mime> {
    let mime = match ext {
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "png" => mime::IMAGE_PNG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "pdf" => mime::APPLICATION_PDF,
        "json" => mime::APPLICATION_JSON,
        "js" | "mjs" => mime::APPLICATION_JAVASCRIPT,
        "txt" => mime::TEXT_PLAIN,
        "csv" => mime::TEXT_CSV,
        "css" => mime::TEXT_CSS,
        "htm" | "html" => mime::TEXT_HTML,
        _ => {
            return EXTRA_TYPES
                .iter()
                .find(|(e, _)| *e == ext)
                .and_then(|(_, t)| t.parse().ok())
        }
    };
    Some(mime)
}

/// Content type for an upload
///
/// The extension decides when it is known. Otherwise the type the host
/// declared is used if it parses, and `application/octet-stream` if not.
pub fn content_type_for(ext: &str, declared: Option<&str>) -> String {
    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    known(&ext)
        .or_else(|| declared.and_then(|d| d.trim().parse::<Mime>().ok()))
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
        .to_string()
}
