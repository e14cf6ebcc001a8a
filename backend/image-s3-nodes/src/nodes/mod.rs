//! Pipeline host nodes
//!
//! Each node declares its inputs and outputs and exposes a single `execute`
//! entry point. The host looks nodes up by name through [`NodeRegistry`]:
//! - `ConvertPngToWebp` - square WebP thumbnail bytes
//! - `SaveImageToS3` - PNG upload of an image
//! - `LoadImageFromS3` - download and decode, one batch entry per frame
//! - `SaveThumbnailToS3` - thumbnail upload

pub mod convert;
pub mod load;
pub mod save;
pub mod save_thumbnail;
pub mod schema;

pub use convert::ConvertToThumbnailNode;
pub use load::LoadImageNode;
pub use save::SaveImageNode;
pub use save_thumbnail::SaveThumbnailNode;
pub use schema::{DefaultValue, InputSpec, NodeParams, NodeSchema, ParamKind, ParamValue};

use std::sync::Arc;

use bytes::Bytes;
use s3_utils::ObjectStore;
use tracing::debug;

use crate::config::UploadConfig;
use crate::error::Result;
use crate::tensor::ImageTensor;
use crate::thumbnail::ThumbnailProcessor;

/// Category every node is listed under
pub const CATEGORY: &str = "iw-image-s3";

/// Uploaded object summary
#[derive(Debug, Clone)]
pub struct SavedObject {
    pub bucket: String,
    pub key: String,
    pub content_type: &'static str,
    pub size: usize,
    /// Image to show in the host UI, if the node echoes its input
    pub preview: Option<ImageTensor>,
}

/// Value returned to the host
#[derive(Debug, Clone)]
pub enum NodeOutput {
    Image(ImageTensor),
    Encoded(Bytes),
    Saved(SavedObject),
}

impl NodeOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            NodeOutput::Image(_) => "image",
            NodeOutput::Encoded(_) => "encoded bytes",
            NodeOutput::Saved(_) => "saved object",
        }
    }
}

pub enum ImageNode {
    ConvertToThumbnail(ConvertToThumbnailNode),
    SaveImage(SaveImageNode),
    LoadImage(LoadImageNode),
    SaveThumbnail(SaveThumbnailNode),
}

impl ImageNode {
    pub fn name(&self) -> &'static str {
        match self {
            ImageNode::ConvertToThumbnail(_) => ConvertToThumbnailNode::NAME,
            ImageNode::SaveImage(_) => SaveImageNode::NAME,
            ImageNode::LoadImage(_) => LoadImageNode::NAME,
            ImageNode::SaveThumbnail(_) => SaveThumbnailNode::NAME,
        }
    }

    pub fn category(&self) -> &'static str {
        CATEGORY
    }

    /// Nodes whose effect is a side effect (or final result) rather than a
    /// value consumed downstream
    pub fn is_output_node(&self) -> bool {
        !matches!(self, ImageNode::LoadImage(_))
    }

    pub fn inputs_schema(&self) -> Vec<InputSpec> {
        match self {
            ImageNode::ConvertToThumbnail(_) => ConvertToThumbnailNode::inputs_schema(),
            ImageNode::SaveImage(_) => SaveImageNode::inputs_schema(),
            ImageNode::LoadImage(_) => LoadImageNode::inputs_schema(),
            ImageNode::SaveThumbnail(_) => SaveThumbnailNode::inputs_schema(),
        }
    }

    pub fn outputs_schema(&self) -> Vec<ParamKind> {
        match self {
            ImageNode::ConvertToThumbnail(_) => ConvertToThumbnailNode::outputs_schema(),
            ImageNode::SaveImage(_) => SaveImageNode::outputs_schema(),
            ImageNode::LoadImage(_) => LoadImageNode::outputs_schema(),
            ImageNode::SaveThumbnail(_) => SaveThumbnailNode::outputs_schema(),
        }
    }

    pub fn schema(&self) -> NodeSchema {
        NodeSchema {
            name: self.name(),
            category: self.category(),
            output_node: self.is_output_node(),
            inputs: self.inputs_schema(),
            outputs: self.outputs_schema(),
        }
    }

    /// Run the node. Absent inputs are filled from their schema defaults first.
    pub async fn execute(&self, mut params: NodeParams) -> Result<NodeOutput> {
        params.apply_defaults(&self.inputs_schema())?;
        debug!(node = self.name(), "Executing node");

        match self {
            ImageNode::ConvertToThumbnail(node) => node.execute(params).await,
            ImageNode::SaveImage(node) => node.execute(params).await,
            ImageNode::LoadImage(node) => node.execute(params).await,
            ImageNode::SaveThumbnail(node) => node.execute(params).await,
        }
    }
}

/// Every node of the pack, sharing one object store and one thumbnail processor
pub struct NodeRegistry {
    nodes: Vec<ImageNode>,
}

impl NodeRegistry {
    pub fn new(store: Arc<dyn ObjectStore>, upload: &UploadConfig) -> Self {
        let processor = Arc::new(ThumbnailProcessor::with_defaults());

        let nodes = vec![
            ImageNode::ConvertToThumbnail(ConvertToThumbnailNode::new(processor.clone())),
            ImageNode::SaveImage(SaveImageNode::new(store.clone(), upload.acl)),
            ImageNode::LoadImage(LoadImageNode::new(store.clone())),
            ImageNode::SaveThumbnail(SaveThumbnailNode::new(processor, store, upload.acl)),
        ];

        Self { nodes }
    }

    pub fn get(&self, name: &str) -> Option<&ImageNode> {
        self.nodes.iter().find(|node| node.name() == name)
    }

    pub fn nodes(&self) -> &[ImageNode] {
        &self.nodes
    }

    pub fn schemas(&self) -> Vec<NodeSchema> {
        self.nodes.iter().map(ImageNode::schema).collect()
    }

    /// Serialized schemas for the host
    pub fn describe(&self) -> serde_json::Value {
        serde_json::json!({ "nodes": self.schemas() })
    }
}
