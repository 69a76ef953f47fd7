//! Object store client seam
//!
//! The adapter never talks to the network directly. It goes through
//! [`ObjectStoreClient`], which [`S3Client`] implements on top of
//! `object_store`'s S3 backend and tests implement in memory.

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{
    Attribute, AttributeValue, Attributes, BackoffConfig, ClientOptions, ObjectStore, PutOptions,
    PutPayload, RetryConfig,
};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace};
use upvault_core::{build_host_url, StorageConfig};

/// Region sent with every request; S3-compatible stores ignore it
const DEFAULT_REGION: &str = "us-east-1";

/// Headers stored with an object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// `Content-Type` of the object
    pub content_type: String,
    /// User metadata (`x-amz-meta-*`)
    pub user: BTreeMap<String, String>,
}

impl ObjectMetadata {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            user: BTreeMap::new(),
        }
    }
}

/// Result of a successful PUT
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOutcome {
    /// Entity tag returned by the store, if any
    pub etag: Option<String>,
}

/// The object store operations the adapter relies on
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Whether the bucket exists and is reachable with the configured credentials
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket
    ///
    /// The adapter never calls this; a missing bucket is only reported.
    async fn make_bucket(&self, bucket: &str) -> Result<()>;

    /// Store an object
    ///
    /// `size` is the content length when the caller knows it; `None` lets
    /// the store derive it.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        size: Option<u64>,
        metadata: &ObjectMetadata,
    ) -> Result<PutOutcome>;

    /// Remove an object
    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Presigned GET URL valid for `expiry`
    async fn presigned_get_object(&self, bucket: &str, key: &str, expiry: Duration)
        -> Result<String>;
}

/// [`ObjectStoreClient`] backed by `object_store`'s Amazon S3 implementation
///
/// An `AmazonS3` store is bound to a single bucket, so requests for any
/// other bucket are rejected. Buckets cannot be created through it.
pub struct S3Client {
    store: AmazonS3,
    bucket: String,
}

impl fmt::Debug for S3Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Client")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl S3Client {
    /// Build a client from a normalized configuration
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let endpoint = build_host_url(config);
        let endpoint = endpoint.trim_end_matches('/');

        let mut options = ClientOptions::new()
            .with_connect_timeout(config.connect_timeout())
            .with_allow_invalid_certificates(!config.reject_unauthorized());
        if !config.keep_alive() {
            options = options.with_pool_max_idle_per_host(0);
        }

        let retry = RetryConfig {
            max_retries: config.max_retries() as usize,
            backoff: BackoffConfig {
                init_backoff: config.retry_delay(),
                ..BackoffConfig::default()
            },
            ..RetryConfig::default()
        };

        debug!(
            endpoint,
            bucket = config.bucket(),
            max_retries = config.max_retries(),
            keep_alive = config.keep_alive(),
            "Building S3 client"
        );

        let store = AmazonS3Builder::new()
            .with_endpoint(endpoint)
            .with_bucket_name(config.bucket())
            .with_region(DEFAULT_REGION)
            .with_access_key_id(config.access_key())
            .with_secret_access_key(config.secret_key())
            .with_allow_http(!config.use_ssl())
            .with_virtual_hosted_style_request(false)
            .with_client_options(options)
            .with_retry(retry)
            .build()?;

        Ok(Self {
            store,
            bucket: config.bucket().to_string(),
        })
    }

    fn path(&self, bucket: &str, key: &str) -> Result<ObjectPath> {
        if bucket != self.bucket {
            return Err(ClientError::BucketMismatch {
                bound: self.bucket.clone(),
                requested: bucket.to_string(),
            });
        }
        Ok(ObjectPath::parse(key)?)
    }
}

fn attributes(metadata: &ObjectMetadata) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        AttributeValue::from(metadata.content_type.clone()),
    );
    for (name, value) in &metadata.user {
        attributes.insert(
            Attribute::Metadata(Cow::Owned(name.clone())),
            AttributeValue::from(value.clone()),
        );
    }
    attributes
}

#[async_trait]
impl ObjectStoreClient for S3Client {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        if bucket != self.bucket {
            return Ok(false);
        }
        match self.store.list(None).next().await {
            None | Some(Ok(_)) => Ok(true),
            Some(Err(object_store::Error::NotFound { .. })) => Ok(false),
            Some(Err(e)) if e.to_string().contains("NoSuchBucket") => Ok(false),
            Some(Err(e)) => Err(e.into()),
        }
    }

    async fn make_bucket(&self, bucket: &str) -> Result<()> {
        debug!(bucket, "Bucket creation requested");
        Err(ClientError::Unsupported("make_bucket"))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        size: Option<u64>,
        metadata: &ObjectMetadata,
    ) -> Result<PutOutcome> {
        let path = self.path(bucket, key)?;
        trace!(%path, ?size, content_type = %metadata.content_type, "PUT object");

        let options = PutOptions {
            attributes: attributes(metadata),
            ..PutOptions::default()
        };
        let result = self
            .store
            .put_opts(&path, PutPayload::from(body), options)
            .await?;

        Ok(PutOutcome {
            etag: result.e_tag,
        })
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.path(bucket, key)?;
        trace!(%path, "DELETE object");
        self.store.delete(&path).await?;
        Ok(())
    }

    async fn presigned_get_object(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
    ) -> Result<String> {
        let path = self.path(bucket, key)?;
        trace!(%path, expiry_secs = expiry.as_secs(), "Presigning GET");
        let url = self.store.signed_url(Method::GET, &path, expiry).await?;
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upvault_core::{normalize, RawConfig};

    fn config() -> StorageConfig {
        normalize(
            &RawConfig::new()
                .with_endpoint("127.0.0.1")
                .with_access_key("minioadmin")
                .with_secret_key("minioadmin")
                .with_bucket("media")
                .with_reject_unauthorized(false),
        )
        .unwrap()
    }

    #[test]
    fn test_attributes_carry_content_type_and_user_metadata() {
        let mut metadata = ObjectMetadata::new("image/png");
        metadata.user.insert("original-name".into(), "cat.png".into());
        let attributes = attributes(&metadata);
        assert_eq!(attributes.len(), 2);
        assert!(attributes.get(&Attribute::ContentType).is_some());
        assert!(attributes
            .get(&Attribute::Metadata(Cow::Borrowed("original-name")))
            .is_some());
    }

    #[test]
    fn test_client_rejects_foreign_bucket() {
        let client = S3Client::new(&config()).unwrap();
        assert!(matches!(
            client.path("other", "a.png"),
            Err(ClientError::BucketMismatch { .. })
        ));
        assert_eq!(client.path("media", "a/b.png").unwrap().as_ref(), "a/b.png");
    }

    #[tokio::test]
    async fn test_make_bucket_is_unsupported() {
        let client = S3Client::new(&config()).unwrap();
        assert!(matches!(
            client.make_bucket("media").await,
            Err(ClientError::Unsupported("make_bucket"))
        ));
    }

    #[tokio::test]
    async fn test_presign_is_offline() {
        let client = S3Client::new(&config()).unwrap();
        let url = client
            .presigned_get_object("media", "uploads/a.png", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("http://127.0.0.1:9000/media/uploads/a.png?"));
        assert!(url.contains("X-Amz-Expires=60"));
    }
}
