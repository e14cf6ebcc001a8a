/// In-process object store with the same contract as [`crate::S3Client`]
use crate::content_type::content_type_for;
use crate::error::{Result, StorageError};
use crate::operations::{ObjectAcl, ObjectStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::Cursor;
use tokio::sync::RwLock;
use tracing::debug;

/// An object held by [`InMemoryObjectStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: &'static str,
    pub acl: ObjectAcl,
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an object together with its content type and ACL
    pub async fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored objects across all buckets
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, bucket: &str, key: &str, data: Bytes, acl: ObjectAcl) -> Result<()> {
        let object = StoredObject {
            content_type: content_type_for(key),
            body: data,
            acl,
        };
        debug!(
            bucket = %bucket,
            key = %key,
            size = object.body.len(),
            content_type = object.content_type,
            "Storing object in memory"
        );

        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), object);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Cursor<Bytes>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| Cursor::new(object.body.clone()))
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }
}
