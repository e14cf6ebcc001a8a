//! `SaveImageToS3`: PNG-encode the input image and upload it.

use std::sync::Arc;

use bytes::Bytes;
use s3_utils::{content_type_for, ObjectAcl, ObjectStore};
use tracing::info;

use crate::error::Result;
use crate::tensor::{encode_png, single_frame, tensor_to_image, ImageTensor};

use super::schema::{InputSpec, NodeParams, ParamKind};
use super::{NodeOutput, SavedObject};

pub struct SaveImageNode {
    store: Arc<dyn ObjectStore>,
    acl: ObjectAcl,
}

impl SaveImageNode {
    pub const NAME: &'static str = "SaveImageToS3";

    pub fn new(store: Arc<dyn ObjectStore>, acl: ObjectAcl) -> Self {
        Self { store, acl }
    }

    pub fn inputs_schema() -> Vec<InputSpec> {
        vec![
            InputSpec::required("image", ParamKind::Image),
            InputSpec::string("s3_bucket", "s3_bucket"),
            InputSpec::string("object_key", "object_key"),
        ]
    }

    pub fn outputs_schema() -> Vec<ParamKind> {
        Vec::new()
    }

    pub async fn execute(&self, mut params: NodeParams) -> Result<NodeOutput> {
        let image = params.take_image("image")?;
        let bucket = params.take_string("s3_bucket")?;
        let key = params.take_string("object_key")?;

        let (png, image) = tokio::task::spawn_blocking(move || -> Result<(Bytes, ImageTensor)> {
            let png = encode_png(&tensor_to_image(single_frame(&image)?)?)?;
            Ok((png, image))
        })
        .await??;

        let size = png.len();
        self.store.put(&bucket, &key, png, self.acl).await?;

        info!(bucket = %bucket, key = %key, size, "Saved image");
        Ok(NodeOutput::Saved(SavedObject {
            content_type: content_type_for(&key),
            bucket,
            key,
            size,
            preview: Some(image),
        }))
    }
}
