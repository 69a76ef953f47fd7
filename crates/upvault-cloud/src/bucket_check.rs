//! Advisory bucket existence probe
//!
//! The result only feeds log messages. A failed or negative probe never
//! blocks construction or any operation.

use crate::client::ObjectStoreClient;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a probe result stays fresh
pub const PROBE_TTL: Duration = Duration::from_secs(5 * 60);

/// Cached bucket existence check
///
/// Every attempt is recorded, including failed ones, so an unreachable
/// store is asked at most once per TTL by the background refresh.
pub struct BucketProbe {
    client: Arc<dyn ObjectStoreClient>,
    bucket: String,
    ttl: Duration,
    /// Time of the last attempt and its answer (`None` when it failed)
    state: Mutex<Option<(Instant, Option<bool>)>>,
    refreshing: AtomicBool,
}

impl fmt::Debug for BucketProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketProbe")
            .field("bucket", &self.bucket)
            .field("ttl", &self.ttl)
            .field("state", &*self.state.lock())
            .field("refreshing", &self.refreshing.load(Ordering::Relaxed))
            .finish()
    }
}

/// Clears the in-flight flag when a refresh ends or is cancelled
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BucketProbe {
    pub fn new(client: Arc<dyn ObjectStoreClient>, bucket: impl Into<String>) -> Self {
        Self::with_ttl(client, bucket, PROBE_TTL)
    }

    pub fn with_ttl(
        client: Arc<dyn ObjectStoreClient>,
        bucket: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            ttl,
            state: Mutex::new(None),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Outcome of the last attempt, if it was made within the TTL
    fn fresh_attempt(&self) -> Option<Option<bool>> {
        let state = *self.state.lock();
        state
            .filter(|(attempted_at, _)| attempted_at.elapsed() < self.ttl)
            .map(|(_, exists)| exists)
    }

    /// Last answer, if it is still fresh
    pub fn cached(&self) -> Option<bool> {
        self.fresh_attempt().flatten()
    }

    /// Whether no attempt was made within the TTL and none is running
    pub fn is_stale(&self) -> bool {
        !self.refreshing.load(Ordering::Acquire) && self.fresh_attempt().is_none()
    }

    /// Claim the next background refresh
    ///
    /// Returns `false` when a refresh is already running or the last
    /// attempt, successful or not, is still fresh. A `true` result must be
    /// followed by [`refresh`](Self::refresh).
    pub fn begin_refresh(&self) -> bool {
        if self.fresh_attempt().is_some() {
            return false;
        }
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Run a refresh claimed with [`begin_refresh`](Self::begin_refresh)
    pub async fn refresh(&self) {
        let _guard = RefreshGuard(&self.refreshing);
        self.check().await;
    }

    /// Ask the store now and record the attempt
    ///
    /// Returns `None` when the store could not be asked.
    pub async fn check(&self) -> Option<bool> {
        let exists = match self.client.bucket_exists(&self.bucket).await {
            Ok(true) => {
                debug!(bucket = %self.bucket, "Bucket is reachable");
                Some(true)
            }
            Ok(false) => {
                warn!(
                    bucket = %self.bucket,
                    "Bucket does not exist; uploads will fail until it is created"
                );
                Some(false)
            }
            Err(e) => {
                warn!(bucket = %self.bucket, error = %e.describe(), "Bucket existence check failed");
                None
            }
        };
        *self.state.lock() = Some((Instant::now(), exists));
        exists
    }
}
