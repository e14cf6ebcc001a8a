//! Error types for the image nodes.

use s3_utils::StorageError;
use thiserror::Error;

/// Result type for node operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// Every failure aborts the current node invocation and is handed back to
/// the host unchanged.
#[derive(Error, Debug)]
pub enum NodeError {
    /// Object storage failure (configuration, transport or missing object).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Input bytes could not be decoded as an image.
    #[error("failed to decode image: {source}")]
    Decode {
        #[source]
        source: image::ImageError,
    },

    /// Output image could not be encoded.
    #[error("failed to encode {format}: {reason}")]
    Encode {
        format: &'static str,
        reason: String,
    },

    /// Decoded image has no pixels.
    #[error("image has zero width or height ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Parameter value out of range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Required parameter absent and no default declared.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// Parameter present with the wrong type.
    #[error("parameter {name} must be {expected}, got {actual}")]
    ParameterType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Tensor layout does not match what the operation needs.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Blocking worker task failed to complete.
    #[error("image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl NodeError {
    pub(crate) fn decode(source: image::ImageError) -> Self {
        NodeError::Decode { source }
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        NodeError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
