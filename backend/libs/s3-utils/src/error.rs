/// Error types for object storage operations
use thiserror::Error;

/// Result type for s3-utils operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Boxed error from the underlying transport
pub type TransportSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum StorageError {
    /// Client was built without its required credentials
    #[error("S3 client is not configured, missing: {}", missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    /// Request to the storage service failed
    #[error("S3 {operation} failed for s3://{bucket}/{key}: {source}")]
    Transport {
        operation: &'static str,
        bucket: String,
        key: String,
        #[source]
        source: TransportSource,
    },

    /// Object does not exist
    #[error("object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Unknown canned ACL name
    #[error("invalid ACL: {0}")]
    InvalidAcl(String),
}

impl StorageError {
    pub(crate) fn transport(
        operation: &'static str,
        bucket: &str,
        key: &str,
        source: impl Into<TransportSource>,
    ) -> Self {
        StorageError::Transport {
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn not_found(bucket: &str, key: &str) -> Self {
        StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}
