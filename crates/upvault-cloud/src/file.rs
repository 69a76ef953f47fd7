//! The file model exchanged with the host upload framework

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use tokio::io::AsyncRead;
use upvault_core::{Error, ErrorContext, PathParts, Result};

/// Readable upload content
pub type ByteStream = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Where the store put an uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    /// Object key within the bucket
    pub key: String,
    /// Bucket holding the object
    pub bucket: String,
    /// Entity tag reported by the store
    pub etag: Option<String>,
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Public URL of the object
    pub url: String,
    pub metadata: ProviderMetadata,
}

/// Options for [`get_signed_url`](crate::StorageAdapter::get_signed_url)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignedUrlOptions {
    /// Lifetime in seconds; the configured expiry is used when absent
    pub expires_in: Option<i64>,
}

impl SignedUrlOptions {
    pub fn expires_in(seconds: i64) -> Self {
        Self {
            expires_in: Some(seconds),
        }
    }
}

/// Upload content taken out of a [`FileDescriptor`]
pub enum FileContent {
    Buffer(Bytes),
    Stream(ByteStream),
}

impl fmt::Debug for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileContent::Buffer(b) => f.debug_tuple("Buffer").field(&b.len()).finish(),
            FileContent::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// One file handled by the provider
///
/// The caller owns the descriptor. The adapter only takes its content and
/// fills in `url` and `provider_metadata` after an upload.
#[derive(Default)]
pub struct FileDescriptor {
    /// Logical file name, used in diagnostics
    pub name: String,
    /// Content hash, used as the object file name
    pub hash: String,
    /// Extension, with or without the leading dot
    pub ext: String,
    /// Size in bytes, when known
    pub size: Option<u64>,
    /// Mime type declared by the host
    pub mime: Option<String>,
    /// Relative directory below the configured folder
    pub path: Option<String>,
    pub buffer: Option<Bytes>,
    pub stream: Option<ByteStream>,
    /// Free-form metadata stored with the object
    pub metadata: BTreeMap<String, String>,
    /// Public URL, set by upload and read by delete and signing
    pub url: Option<String>,
    pub provider_metadata: Option<ProviderMetadata>,
}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("name", &self.name)
            .field("hash", &self.hash)
            .field("ext", &self.ext)
            .field("size", &self.size)
            .field("mime", &self.mime)
            .field("path", &self.path)
            .field("buffer", &self.buffer.as_ref().map(Bytes::len))
            .field("stream", &self.stream.is_some())
            .field("metadata", &self.metadata)
            .field("url", &self.url)
            .field("provider_metadata", &self.provider_metadata)
            .finish()
    }
}

impl FileDescriptor {
    /// Create a descriptor without content
    pub fn new(name: impl Into<String>, hash: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
            ext: ext.into(),
            ..Self::default()
        }
    }

    /// Set in-memory content; the size is taken from the buffer
    pub fn with_buffer(mut self, buffer: impl Into<Bytes>) -> Self {
        let buffer = buffer.into();
        self.size = Some(buffer.len() as u64);
        self.buffer = Some(buffer);
        self
    }

    /// Set streamed content
    pub fn with_stream(mut self, stream: impl AsyncRead + Send + Sync + Unpin + 'static) -> Self {
        self.stream = Some(Box::new(stream));
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Key components for the path builder
    pub fn path_parts(&self) -> PathParts<'_> {
        PathParts {
            hash: Some(self.hash.as_str()),
            ext: Some(self.ext.as_str()),
            path: self.path.as_deref(),
        }
    }

    /// Take the content out of the descriptor
    ///
    /// Exactly one of buffer or stream must be present. Both slots are
    /// emptied either way, so a rejected stream is still closed.
    pub fn take_content(&mut self) -> Result<FileContent> {
        match (self.buffer.take(), self.stream.take()) {
            (Some(buffer), None) => Ok(FileContent::Buffer(buffer)),
            (None, Some(stream)) => Ok(FileContent::Stream(stream)),
            (buffer, _) => {
                let problem = if buffer.is_some() {
                    "file carries both a buffer and a stream"
                } else {
                    "file carries neither a buffer nor a stream"
                };
                Err(Error::Upload {
                    message: problem.to_string(),
                    context: ErrorContext::new().with("filename", &self.name),
                    remediation: None,
                })
            }
        }
    }
}
