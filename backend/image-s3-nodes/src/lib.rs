//! Image S3 Nodes
//!
//! Plugin nodes for an image-generation pipeline host: square WebP
//! thumbnails, PNG uploads to an S3 bucket, and multi-frame downloads back
//! into the host's tensor format.

pub mod config;
pub mod error;
pub mod nodes;
pub mod tensor;
pub mod thumbnail;

// Public re-exports
pub use config::{NodesConfig, UploadConfig};
pub use error::{NodeError, Result};
pub use nodes::{ImageNode, NodeOutput, NodeParams, NodeRegistry, ParamValue, SavedObject};
pub use tensor::{ImageTensor, PixelFormat};
