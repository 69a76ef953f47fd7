//! In-memory object store client

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;
use upvault_cloud::{ClientError, ObjectMetadata, ObjectStoreClient, PutOutcome, Result};

/// Host used in presigned URLs produced by the mock
pub const MOCK_HOST: &str = "http://mock.local";

/// A call received by the mock, in order of arrival
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    BucketExists {
        bucket: String,
    },
    MakeBucket {
        bucket: String,
    },
    Put {
        bucket: String,
        key: String,
        size: Option<u64>,
        content_type: String,
    },
    Remove {
        bucket: String,
        key: String,
    },
    Presign {
        bucket: String,
        key: String,
        expiry: Duration,
    },
}

/// An object held by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub metadata: ObjectMetadata,
    pub etag: String,
}

#[derive(Debug, Default)]
struct Failures {
    bucket_check: Option<String>,
    put: Option<String>,
    remove: Option<String>,
    presign: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    bucket_exists: bool,
    objects: BTreeMap<String, StoredObject>,
    calls: Vec<Call>,
    failures: Failures,
    next_etag: u64,
}

/// [`ObjectStoreClient`] that keeps objects in memory
///
/// Failures are injected per operation with a message, which is what the
/// adapter classifies, so `fail_put("connection refused")` behaves like an
/// unreachable endpoint.
#[derive(Debug)]
pub struct MockClient {
    bucket: String,
    state: Mutex<State>,
}

impl MockClient {
    /// Mock serving an existing `bucket`
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            state: Mutex::new(State {
                bucket_exists: true,
                ..State::default()
            }),
        }
    }

    /// Mock whose bucket has not been created
    pub fn without_bucket(bucket: impl Into<String>) -> Self {
        let mock = Self::new(bucket);
        mock.state.lock().bucket_exists = false;
        mock
    }

    pub fn fail_bucket_check(&self, message: impl Into<String>) {
        self.state.lock().failures.bucket_check = Some(message.into());
    }

    pub fn fail_put(&self, message: impl Into<String>) {
        self.state.lock().failures.put = Some(message.into());
    }

    pub fn fail_remove(&self, message: impl Into<String>) {
        self.state.lock().failures.remove = Some(message.into());
    }

    pub fn fail_presign(&self, message: impl Into<String>) {
        self.state.lock().failures.presign = Some(message.into());
    }

    /// Store an object directly, bypassing the call log
    pub fn insert(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        let mut state = self.state.lock();
        state.next_etag += 1;
        let etag = format!("\"mock-{}\"", state.next_etag);
        state.objects.insert(
            key.into(),
            StoredObject {
                body: body.into(),
                metadata: ObjectMetadata::new("application/octet-stream"),
                etag,
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.state.lock().objects.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().objects.keys().cloned().collect()
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Calls other than bucket checks, which the adapter issues in the background
    pub fn operations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::BucketExists { .. }))
            .collect()
    }

    fn check_bucket(&self, bucket: &str, exists: bool) -> Result<()> {
        if bucket != self.bucket || !exists {
            return Err(ClientError::Other(format!(
                "NoSuchBucket: The specified bucket `{}` does not exist",
                bucket
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStoreClient for MockClient {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let mut state = self.state.lock();
        state.calls.push(Call::BucketExists {
            bucket: bucket.to_string(),
        });
        if let Some(message) = &state.failures.bucket_check {
            return Err(ClientError::Other(message.clone()));
        }
        Ok(bucket == self.bucket && state.bucket_exists)
    }

    async fn make_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::MakeBucket {
            bucket: bucket.to_string(),
        });
        if bucket != self.bucket {
            return Err(ClientError::BucketMismatch {
                bound: self.bucket.clone(),
                requested: bucket.to_string(),
            });
        }
        if state.bucket_exists {
            return Err(ClientError::Other(format!(
                "BucketAlreadyOwnedByYou: `{}` already exists",
                bucket
            )));
        }
        state.bucket_exists = true;
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        size: Option<u64>,
        metadata: &ObjectMetadata,
    ) -> Result<PutOutcome> {
        let mut state = self.state.lock();
        state.calls.push(Call::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size,
            content_type: metadata.content_type.clone(),
        });
        if let Some(message) = &state.failures.put {
            return Err(ClientError::Other(message.clone()));
        }
        self.check_bucket(bucket, state.bucket_exists)?;

        state.next_etag += 1;
        let etag = format!("\"mock-{}\"", state.next_etag);
        state.objects.insert(
            key.to_string(),
            StoredObject {
                body,
                metadata: metadata.clone(),
                etag: etag.clone(),
            },
        );
        Ok(PutOutcome { etag: Some(etag) })
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Remove {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        if let Some(message) = &state.failures.remove {
            return Err(ClientError::Other(message.clone()));
        }
        self.check_bucket(bucket, state.bucket_exists)?;

        // S3 treats removing a missing key as success
        state.objects.remove(key);
        Ok(())
    }

    async fn presigned_get_object(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
    ) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.push(Call::Presign {
            bucket: bucket.to_string(),
            key: key.to_string(),
            expiry,
        });
        if let Some(message) = &state.failures.presign {
            return Err(ClientError::Other(message.clone()));
        }

        Ok(format!(
            "{}/{}/{}?X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Expires={}&X-Amz-Signature=mock",
            MOCK_HOST,
            bucket,
            key,
            expiry.as_secs()
        ))
    }
}
