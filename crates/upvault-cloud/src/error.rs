use thiserror::Error;

/// Failures reported by an object store client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Invalid object key: {0}")]
    InvalidKey(#[from] object_store::path::Error),

    #[error("Client is bound to bucket `{bound}`, not `{requested}`")]
    BucketMismatch { bound: String, requested: String },

    #[error("`{0}` is not supported by this client")]
    Unsupported(&'static str),

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Full message including every underlying cause
    ///
    /// Transport errors usually carry the useful part (connection refused,
    /// certificate issues) several sources down.
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
