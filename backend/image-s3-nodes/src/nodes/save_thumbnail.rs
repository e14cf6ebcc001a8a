//! `SaveThumbnailToS3`: thumbnail-encode the input and upload the WebP bytes.

use std::sync::Arc;

use s3_utils::{content_type_for, ObjectAcl, ObjectStore};
use tracing::info;

use crate::error::Result;
use crate::thumbnail::{ThumbnailProcessor, DEFAULT_THUMBNAIL_SIZE};

use super::convert::thumbnail_source;
use super::schema::{InputSpec, NodeParams, ParamKind};
use super::{NodeOutput, SavedObject};

pub struct SaveThumbnailNode {
    processor: Arc<ThumbnailProcessor>,
    store: Arc<dyn ObjectStore>,
    acl: ObjectAcl,
}

impl SaveThumbnailNode {
    pub const NAME: &'static str = "SaveThumbnailToS3";

    pub fn new(
        processor: Arc<ThumbnailProcessor>,
        store: Arc<dyn ObjectStore>,
        acl: ObjectAcl,
    ) -> Self {
        Self {
            processor,
            store,
            acl,
        }
    }

    pub fn inputs_schema() -> Vec<InputSpec> {
        vec![
            InputSpec::required("image", ParamKind::Image),
            InputSpec::string("s3_bucket", "s3_bucket"),
            InputSpec::string("object_key", "object_key"),
            InputSpec::int("resizing_width", i64::from(DEFAULT_THUMBNAIL_SIZE)),
            InputSpec::int("resizing_height", i64::from(DEFAULT_THUMBNAIL_SIZE)),
        ]
    }

    pub fn outputs_schema() -> Vec<ParamKind> {
        Vec::new()
    }

    pub async fn execute(&self, mut params: NodeParams) -> Result<NodeOutput> {
        let source = thumbnail_source("image", params.take("image")?)?;
        let bucket = params.take_string("s3_bucket")?;
        let key = params.take_string("object_key")?;
        let width = params.take_dimension("resizing_width")?;
        let height = params.take_dimension("resizing_height")?;

        let thumbnail = self
            .processor
            .clone()
            .generate_async(source, width, height)
            .await?;

        let size = thumbnail.data.len();
        self.store.put(&bucket, &key, thumbnail.data, self.acl).await?;

        info!(bucket = %bucket, key = %key, width, height, size, "Saved thumbnail");
        Ok(NodeOutput::Saved(SavedObject {
            content_type: content_type_for(&key),
            bucket,
            key,
            size,
            preview: None,
        }))
    }
}
