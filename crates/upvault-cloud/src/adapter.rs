//! The provider surface called by the host upload framework
//!
//! [`StorageAdapter`] combines the normalized configuration, the key and URL
//! builders from `upvault-core` and an [`ObjectStoreClient`]. Operations
//! compute values and report them back; the only mutation of the caller's
//! [`FileDescriptor`] happens in [`StorageAdapter::upload`].

use crate::bucket_check::BucketProbe;
use crate::client::{ObjectMetadata, ObjectStoreClient, S3Client};
use crate::content_type::content_type_for;
use crate::diagnostics::{base_context, classify, upload_context};
use crate::file::{
    FileContent, FileDescriptor, ProviderMetadata, SignedUrlOptions, UploadOutcome,
};
use bytes::Bytes;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, warn, Dispatch};
use upvault_core::{
    build_host_url, build_upload_path, classify_url, create_file_url,
    extract_file_path_from_url, has_presign_markers, match_object_key, ConfigError, Error,
    ErrorContext, KeyMatch, Result, StorageConfig, UrlOwnership,
};

/// Upper bound for the read buffer pre-allocated from a declared size
const MAX_PREALLOCATION: u64 = 8 * 1024 * 1024;

/// Per-operation detail: `info!` when the configuration asks for debug
/// output, `debug!` otherwise
macro_rules! detail {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// Builder for [`StorageAdapter`]
pub struct StorageAdapterBuilder {
    config: StorageConfig,
    client: Option<Arc<dyn ObjectStoreClient>>,
    dispatch: Option<Dispatch>,
    background_probe: bool,
}

impl fmt::Debug for StorageAdapterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAdapterBuilder")
            .field("config", &self.config)
            .field("client", &self.client.is_some())
            .field("dispatch", &self.dispatch.is_some())
            .field("background_probe", &self.background_probe)
            .finish()
    }
}

impl StorageAdapterBuilder {
    /// Use this client instead of connecting to the configured endpoint
    pub fn client(mut self, client: Arc<dyn ObjectStoreClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Route every log event of the adapter to `dispatch`
    ///
    /// Without one, events go to whatever subscriber is current.
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Whether the advisory bucket probe runs in the background (default: on)
    ///
    /// When off, the bucket is only checked through
    /// [`StorageAdapter::check_bucket`].
    pub fn background_probe(mut self, enabled: bool) -> Self {
        self.background_probe = enabled;
        self
    }

    /// Build the adapter
    ///
    /// Starts the advisory bucket probe when called inside a Tokio runtime.
    ///
    /// # Errors
    /// Fails with [`Error::Configuration`] when no client was supplied and
    /// the S3 client cannot be built from the configuration.
    pub fn build(self) -> Result<StorageAdapter> {
        let client = match self.client {
            Some(client) => client,
            None => {
                let s3 = S3Client::new(&self.config).map_err(|e| ConfigError::InvalidHostname {
                    endpoint: self.config.endpoint().to_string(),
                    reason: e.describe(),
                })?;
                Arc::new(s3) as Arc<dyn ObjectStoreClient>
            }
        };

        Ok(StorageAdapter::assemble(
            self.config,
            client,
            self.dispatch,
            self.background_probe,
        ))
    }
}

/// Upload, delete and signed URL operations against one bucket
pub struct StorageAdapter {
    config: Arc<StorageConfig>,
    client: Arc<dyn ObjectStoreClient>,
    host_url: String,
    probe: Arc<BucketProbe>,
    background_probe: bool,
    dispatch: Option<Dispatch>,
}

impl fmt::Debug for StorageAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAdapter")
            .field("config", &self.config)
            .field("host_url", &self.host_url)
            .field("probe", &self.probe)
            .finish_non_exhaustive()
    }
}

impl StorageAdapter {
    /// Start building an adapter for a normalized configuration
    pub fn builder(config: StorageConfig) -> StorageAdapterBuilder {
        StorageAdapterBuilder {
            config,
            client: None,
            dispatch: None,
            background_probe: true,
        }
    }

    /// Adapter over an existing client, logging to the current subscriber
    pub fn new(config: StorageConfig, client: Arc<dyn ObjectStoreClient>) -> Self {
        Self::assemble(config, client, None, true)
    }

    fn assemble(
        config: StorageConfig,
        client: Arc<dyn ObjectStoreClient>,
        dispatch: Option<Dispatch>,
        background_probe: bool,
    ) -> Self {
        let host_url = build_host_url(&config);
        let probe = Arc::new(BucketProbe::new(Arc::clone(&client), config.bucket()));
        let adapter = Self {
            config: Arc::new(config),
            client,
            host_url,
            probe,
            background_probe,
            dispatch,
        };

        adapter.in_scope(|| {
            debug!(
                host_url = %adapter.host_url,
                bucket = adapter.config.bucket(),
                private = adapter.config.is_private(),
                "Storage adapter ready"
            )
        });
        adapter.spawn_probe();
        adapter
    }

    /// Adapter connected to the configured S3-compatible endpoint
    pub fn connect(config: StorageConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// `scheme://endpoint[:port]/` of the store
    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    /// Whether files are served through signed URLs only
    pub fn is_private(&self) -> bool {
        self.config.is_private()
    }

    /// Last bucket probe result, if still fresh
    pub fn bucket_status(&self) -> Option<bool> {
        self.probe.cached()
    }

    /// Probe the bucket now and wait for the answer
    pub async fn check_bucket(&self) -> Option<bool> {
        self.scoped(self.probe.check()).await
    }

    fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    async fn scoped<F: Future>(&self, future: F) -> F::Output {
        match &self.dispatch {
            Some(dispatch) => future.with_subscriber(dispatch.clone()).await,
            None => future.await,
        }
    }

    /// Start a background probe unless one ran recently or is running
    fn spawn_probe(&self) {
        if !self.background_probe {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.in_scope(|| debug!("No async runtime, bucket probe skipped"));
            return;
        };
        if !self.probe.begin_refresh() {
            return;
        }

        let probe = Arc::clone(&self.probe);
        let task = async move {
            probe.refresh().await;
        };
        match &self.dispatch {
            Some(dispatch) => drop(handle.spawn(task.with_subscriber(dispatch.clone()))),
            None => drop(handle.spawn(task)),
        }
    }

    /// Upload a file
    ///
    /// On success `file.url` and `file.provider_metadata` are set and the
    /// same values are returned. The file's content is consumed either way.
    pub async fn upload(&self, file: &mut FileDescriptor) -> Result<UploadOutcome> {
        let content = file.take_content()?;
        let outcome = self.scoped(self.put_file(file, content)).await?;

        file.url = Some(outcome.url.clone());
        file.provider_metadata = Some(outcome.metadata.clone());
        Ok(outcome)
    }

    /// Same as [`upload`](Self::upload); kept for the host's stream upload hook
    pub async fn upload_stream(&self, file: &mut FileDescriptor) -> Result<UploadOutcome> {
        self.upload(file).await
    }

    async fn put_file(&self, file: &FileDescriptor, content: FileContent) -> Result<UploadOutcome> {
        let config = &*self.config;
        let bucket = config.bucket();
        let key = build_upload_path(file.path_parts(), config.folder())?;

        self.spawn_probe();

        let body = match content {
            FileContent::Buffer(bytes) => bytes,
            FileContent::Stream(mut stream) => {
                let capacity = file.size.unwrap_or(0).min(MAX_PREALLOCATION) as usize;
                let mut buf = Vec::with_capacity(capacity);
                let read = stream.read_to_end(&mut buf).await;
                drop(stream);
                read.map_err(|e| Error::Upload {
                    message: format!("failed to read upload stream: {}", e),
                    context: upload_context(config, file, Some(&key)),
                    remediation: None,
                })?;
                Bytes::from(buf)
            }
        };

        if let Some(size) = file.size {
            if size != body.len() as u64 {
                warn!(
                    key = %key,
                    declared = size,
                    actual = body.len(),
                    "Declared file size does not match content length"
                );
            }
        }

        let metadata = ObjectMetadata {
            content_type: content_type_for(&file.ext, file.mime.as_deref()),
            user: file.metadata.clone(),
        };
        detail!(
            config.debug(),
            key = %key,
            bucket,
            size = ?file.size,
            content_type = %metadata.content_type,
            "Uploading file"
        );

        match self
            .client
            .put_object(bucket, &key, body, file.size, &metadata)
            .await
        {
            Ok(put) => {
                let url = create_file_url(&key, &self.host_url, bucket);
                detail!(config.debug(), key = %key, url = %url, "Upload complete");
                Ok(UploadOutcome {
                    url,
                    metadata: ProviderMetadata {
                        key,
                        bucket: bucket.to_string(),
                        etag: put.etag,
                    },
                })
            }
            Err(e) => {
                let message = e.describe();
                let remediation = classify(&message, config);
                error!(
                    key = %key,
                    bucket,
                    error = %message,
                    hint = remediation.map(|r| r.hint()).unwrap_or("none"),
                    "Upload failed"
                );
                Err(Error::Upload {
                    message,
                    context: upload_context(config, file, Some(&key)),
                    remediation,
                })
            }
        }
    }

    /// Remove a previously uploaded file
    ///
    /// # Errors
    /// [`Error::Delete`] when the file has no URL, no object key can be
    /// recovered from it, or the store rejects the removal.
    pub async fn delete(&self, file: &FileDescriptor) -> Result<()> {
        self.scoped(self.remove_file(file)).await
    }

    async fn remove_file(&self, file: &FileDescriptor) -> Result<()> {
        let config = &*self.config;
        let bucket = config.bucket();
        let mut context = base_context(config).with("filename", &file.name);

        let Some(url) = file.url.as_deref().filter(|u| !u.trim().is_empty()) else {
            error!(filename = %file.name, "Cannot delete a file without a URL");
            return Err(Error::Delete {
                message: "file has no URL".to_string(),
                context,
            });
        };
        context.insert("url", url);

        let key = extract_file_path_from_url(url, &self.host_url, bucket).map_err(|e| {
            error!(url, error = %e, "Cannot recover object key for deletion");
            Error::Delete {
                message: e.to_string(),
                context: context.clone(),
            }
        })?;
        if key.is_empty() {
            return Err(Error::Delete {
                message: "URL points at the bucket, not an object".to_string(),
                context,
            });
        }
        context.insert("key", &key);

        detail!(config.debug(), key = %key, bucket, "Deleting object");
        if let Err(e) = self.client.remove_object(bucket, &key).await {
            let message = e.describe();
            error!(key = %key, bucket, error = %message, "Delete failed");
            return Err(Error::Delete { message, context });
        }
        detail!(config.debug(), key = %key, "Object deleted");
        Ok(())
    }

    /// URL the host should hand out for a file
    ///
    /// URLs outside the bucket and URLs that are already presigned (when no
    /// expiry is requested) come back unchanged. Everything else is presigned
    /// for `options.expires_in` seconds or the configured expiry.
    ///
    /// # Errors
    /// [`Error::SignedUrl`] when the file has no URL, the requested expiry is
    /// not positive, or presigning fails for a URL on the configured endpoint.
    /// A presign failure for a legacy-host URL returns the original URL.
    pub async fn get_signed_url(
        &self,
        file: &FileDescriptor,
        options: SignedUrlOptions,
    ) -> Result<String> {
        self.scoped(self.sign_file(file, options)).await
    }

    async fn sign_file(&self, file: &FileDescriptor, options: SignedUrlOptions) -> Result<String> {
        let config = &*self.config;
        let bucket = config.bucket();
        let mut context = base_context(config).with("filename", &file.name);
        let signed_error = |message: String, context: ErrorContext| Error::SignedUrl {
            message,
            context,
        };

        let Some(url) = file.url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Err(signed_error("file has no URL".to_string(), context));
        };
        context.insert("url", url);

        let ownership = classify_url(url, config.endpoint(), bucket);
        match ownership {
            UrlOwnership::Foreign => {
                detail!(config.debug(), url, "URL is outside the bucket, returned unchanged");
                return Ok(url.to_string());
            }
            UrlOwnership::LegacyHost => {
                // Any dotted hostname with the bucket in its path lands here
                warn!(
                    url,
                    endpoint = config.endpoint(),
                    "Accepting URL from a different host as a legacy record of this bucket"
                );
            }
            UrlOwnership::Owned => {}
        }

        if options.expires_in.is_none() && has_presign_markers(url) {
            detail!(config.debug(), url, "URL is already presigned");
            return Ok(url.to_string());
        }

        let expiry = match options.expires_in {
            None => config.expiry_secs(),
            Some(secs) if secs > 0 => secs as u64,
            Some(secs) => {
                context.insert("expires_in", secs);
                return Err(signed_error(
                    "expiry must be a positive number of seconds".to_string(),
                    context,
                ));
            }
        };
        context.insert("expiry", expiry);

        let key = match match_object_key(url, &self.host_url, bucket) {
            KeyMatch::Matched(key) if !key.is_empty() => key,
            _ if ownership == UrlOwnership::LegacyHost => {
                warn!(url, "No object key in legacy URL, returned unchanged");
                return Ok(url.to_string());
            }
            _ => {
                return Err(signed_error(
                    "no object key could be recovered from the URL".to_string(),
                    context,
                ))
            }
        };
        context.insert("key", &key);

        detail!(config.debug(), key = %key, expiry, "Presigning URL");
        match self
            .client
            .presigned_get_object(bucket, &key, Duration::from_secs(expiry))
            .await
        {
            Ok(signed) => Ok(signed),
            Err(e) if ownership == UrlOwnership::LegacyHost => {
                warn!(
                    key = %key,
                    error = %e.describe(),
                    "Presigning legacy URL failed, returning the original"
                );
                Ok(url.to_string())
            }
            Err(e) => {
                let message = e.describe();
                error!(key = %key, error = %message, "Presigning failed");
                Err(signed_error(message, context))
            }
        }
    }
}
