//! # upvault-cloud
//!
//! The S3-compatible storage provider. [`StorageAdapter`] exposes the
//! operations the host upload framework calls (`upload`, `upload_stream`,
//! `delete`, `get_signed_url`, `is_private`) and delegates the network work
//! to an [`ObjectStoreClient`].
//!
//! ## Architecture
//!
//! - `upvault-core` normalizes configuration and builds keys and URLs
//! - [`S3Client`] implements [`ObjectStoreClient`] on top of `object_store`
//! - [`BucketProbe`] checks in the background that the bucket exists
//!
//! ```no_run
//! use upvault_cloud::{FileDescriptor, StorageAdapter};
//! use upvault_core::{normalize, RawConfig};
//!
//! # async fn run() -> upvault_core::Result<()> {
//! let config = normalize(
//!     &RawConfig::new()
//!         .with_endpoint("localhost")
//!         .with_access_key("minioadmin")
//!         .with_secret_key("minioadmin")
//!         .with_bucket("media"),
//! )?;
//! let adapter = StorageAdapter::connect(config)?;
//!
//! let mut file = FileDescriptor::new("cat.png", "5f2b9c", ".png").with_buffer(vec![0u8; 16]);
//! adapter.upload(&mut file).await?;
//! println!("{:?}", file.url);
//! # Ok(())
//! # }
//! ```

#![warn(missing_debug_implementations)]

mod adapter;
mod bucket_check;
mod client;
mod content_type;
mod diagnostics;
mod error;
mod file;

pub use adapter::{StorageAdapter, StorageAdapterBuilder};
pub use bucket_check::{BucketProbe, PROBE_TTL};
pub use client::{ObjectMetadata, ObjectStoreClient, PutOutcome, S3Client};
pub use content_type::content_type_for;
pub use diagnostics::classify;
pub use error::{ClientError, Result};
pub use file::{
    ByteStream, FileContent, FileDescriptor, ProviderMetadata, SignedUrlOptions, UploadOutcome,
};
