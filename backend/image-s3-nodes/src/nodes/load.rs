//! `LoadImageFromS3`: download an object and decode every frame into a batch.

use std::sync::Arc;

use s3_utils::ObjectStore;
use tracing::info;

use crate::error::Result;
use crate::tensor::load_batch;

use super::schema::{InputSpec, NodeParams, ParamKind};
use super::NodeOutput;

pub struct LoadImageNode {
    store: Arc<dyn ObjectStore>,
}

impl LoadImageNode {
    pub const NAME: &'static str = "LoadImageFromS3";

    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn inputs_schema() -> Vec<InputSpec> {
        vec![
            InputSpec::string("s3_bucket", "s3_bucket"),
            InputSpec::string("object_key", "object_key"),
        ]
    }

    pub fn outputs_schema() -> Vec<ParamKind> {
        vec![ParamKind::Image]
    }

    pub async fn execute(&self, mut params: NodeParams) -> Result<NodeOutput> {
        let bucket = params.take_string("s3_bucket")?;
        let key = params.take_string("object_key")?;

        let buffer = self.store.get(&bucket, &key).await?;
        let batch = tokio::task::spawn_blocking(move || load_batch(buffer)).await??;

        info!(
            bucket = %bucket,
            key = %key,
            frames = batch.shape()[0],
            "Loaded image"
        );
        Ok(NodeOutput::Image(batch))
    }
}
