//! `ConvertPngToWebp`: square WebP thumbnail of the input image.

use std::sync::Arc;

use tracing::debug;

use crate::error::{NodeError, Result};
use crate::thumbnail::{ThumbnailProcessor, ThumbnailSource, DEFAULT_THUMBNAIL_SIZE};
use crate::tensor::{single_frame, tensor_to_image};

use super::schema::{InputSpec, NodeParams, ParamKind, ParamValue};
use super::NodeOutput;

pub struct ConvertToThumbnailNode {
    processor: Arc<ThumbnailProcessor>,
}

impl ConvertToThumbnailNode {
    pub const NAME: &'static str = "ConvertPngToWebp";

    pub fn new(processor: Arc<ThumbnailProcessor>) -> Self {
        Self { processor }
    }

    pub fn inputs_schema() -> Vec<InputSpec> {
        vec![
            InputSpec::required("image", ParamKind::Image),
            InputSpec::int("resizing_width", i64::from(DEFAULT_THUMBNAIL_SIZE)),
            InputSpec::int("resizing_height", i64::from(DEFAULT_THUMBNAIL_SIZE)),
        ]
    }

    pub fn outputs_schema() -> Vec<ParamKind> {
        vec![ParamKind::Bytes]
    }

    pub async fn execute(&self, mut params: NodeParams) -> Result<NodeOutput> {
        let source = params.take("image")?;
        let width = params.take_dimension("resizing_width")?;
        let height = params.take_dimension("resizing_height")?;

        let source = thumbnail_source("image", source)?;
        let result = self
            .processor
            .clone()
            .generate_async(source, width, height)
            .await?;

        debug!(width, height, size = result.data.len(), "Converted image to WebP thumbnail");
        Ok(NodeOutput::Encoded(result.data))
    }
}

/// Accept either a single-image tensor or an already encoded buffer.
pub(crate) fn thumbnail_source(name: &str, value: ParamValue) -> Result<ThumbnailSource> {
    match value {
        ParamValue::Bytes(data) => Ok(ThumbnailSource::Encoded(data)),
        ParamValue::Image(batch) => {
            let bitmap = tensor_to_image(single_frame(&batch)?)?;
            Ok(ThumbnailSource::Decoded(bitmap))
        }
        other => Err(NodeError::ParameterType {
            name: name.to_string(),
            expected: "IMAGE or BYTES",
            actual: other.kind().as_str(),
        }),
    }
}
