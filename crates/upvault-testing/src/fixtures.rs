//! Common test fixtures for upvault testing

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use upvault_cloud::FileDescriptor;
use upvault_core::{normalize, RawConfig, StorageConfig};

/// Bucket used by every fixture
pub const BUCKET: &str = "media";

/// A local MinIO-style configuration with an `uploads` folder
pub fn raw_config() -> RawConfig {
    RawConfig::new()
        .with_endpoint("localhost")
        .with_port(9000)
        .with_access_key("minioadmin")
        .with_secret_key("minioadmin")
        .with_bucket(BUCKET)
        .with_folder("uploads")
}

/// [`raw_config`] normalized
pub fn storage_config() -> StorageConfig {
    normalize(&raw_config()).expect("fixture configuration is valid")
}

/// Normalize a fixture variant
pub fn storage_config_with(f: impl FnOnce(RawConfig) -> RawConfig) -> StorageConfig {
    normalize(&f(raw_config())).expect("fixture configuration is valid")
}

/// A small PNG-like file held in memory
pub fn buffer_file() -> FileDescriptor {
    FileDescriptor::new("cat.png", "5f2b9c01", ".png")
        .with_mime("image/png")
        .with_buffer(&b"\x89PNG\r\n\x1a\nfixture"[..])
}

/// A text file streamed through a [`TrackedReader`]
///
/// The returned flag turns `true` once the adapter has dropped the reader.
pub fn stream_file(content: &'static [u8]) -> (FileDescriptor, Arc<AtomicBool>) {
    let (reader, closed) = TrackedReader::new(content);
    let file = FileDescriptor::new("notes.txt", "a1b2c3", "txt").with_stream(reader);
    (file, closed)
}

/// Reader that records when it is dropped
pub struct TrackedReader {
    inner: &'static [u8],
    closed: Arc<AtomicBool>,
}

impl TrackedReader {
    pub fn new(content: &'static [u8]) -> (Self, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner: content,
                closed: Arc::clone(&closed),
            },
            closed,
        )
    }
}

impl AsyncRead for TrackedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Reader that fails on the first read
pub struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "upload source went away",
        )))
    }
}
