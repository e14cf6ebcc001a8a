/// Object storage utilities for the image pipeline nodes
///
/// Provides the S3 client wrapper, its credential configuration, content-type
/// resolution and an in-memory store implementing the same contract.
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, error, info};

pub mod config;
pub mod content_type;
pub mod error;
pub mod memory;
pub mod operations;

pub use config::S3Config;
pub use content_type::{content_type_for, DEFAULT_CONTENT_TYPE};
pub use error::{Result, StorageError};
pub use memory::{InMemoryObjectStore, StoredObject};
pub use operations::{ObjectAcl, ObjectStore};

const CREDENTIALS_PROVIDER_NAME: &str = "s3-utils";

/// S3 client wrapper
///
/// Construction never fails. A client built from an incomplete
/// [`S3Config`] logs the missing variables and rejects every operation with
/// [`StorageError::Configuration`].
#[derive(Clone)]
pub struct S3Client {
    client: Arc<Client>,
    config: S3Config,
    missing: Vec<&'static str>,
}

impl S3Client {
    /// Create new S3 client with the given credentials
    pub async fn new(config: S3Config) -> Self {
        let missing = config.missing();

        let mut builder = if missing.is_empty() {
            Self::configured_builder(&config).await
        } else {
            error!(
                missing = %missing.join(", "),
                "Missing required S3 environment variables"
            );
            Self::degraded_builder(&config)
        };

        if let Some(endpoint) = config.endpoint() {
            builder = builder.endpoint_url(endpoint);
        }
        builder = builder.force_path_style(config.force_path_style);

        debug!(
            region = config.region.as_deref().unwrap_or("<unset>"),
            endpoint = config.endpoint().unwrap_or("<default>"),
            "S3 client initialized"
        );

        Self {
            client: Arc::new(Client::from_conf(builder.build())),
            config,
            missing,
        }
    }

    /// Create new S3 client with configuration from environment
    pub async fn from_env() -> std::result::Result<Self, envy::Error> {
        let config = S3Config::from_env()?;
        Ok(Self::new(config).await)
    }

    async fn configured_builder(config: &S3Config) -> S3ConfigBuilder {
        let credentials = Credentials::new(
            config.access_key_id.clone().unwrap_or_default(),
            config.secret_access_key.clone().unwrap_or_default(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone().unwrap_or_default()))
            .credentials_provider(credentials)
            .load()
            .await;

        S3ConfigBuilder::from(&shared_config)
    }

    /// Builder that skips the provider chains so a half-configured client
    /// does not go looking for credentials elsewhere.
    fn degraded_builder(config: &S3Config) -> S3ConfigBuilder {
        let mut builder = S3ConfigBuilder::new().behavior_version(BehaviorVersion::latest());

        if let Some(region) = config.region.as_ref().filter(|r| !r.trim().is_empty()) {
            builder = builder.region(Region::new(region.clone()));
        }
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            builder = builder.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }

        builder
    }

    /// Get reference to underlying AWS S3 client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get S3 configuration
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Whether the client was built from a complete configuration
    pub fn is_configured(&self) -> bool {
        self.missing.is_empty()
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(StorageError::Configuration {
                missing: self.missing.clone(),
            })
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Client {
    async fn put(&self, bucket: &str, key: &str, data: Bytes, acl: ObjectAcl) -> Result<()> {
        self.ensure_configured()?;

        let content_type = content_type_for(key);
        let size = data.len();

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .acl(acl.into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::transport("PutObject", bucket, key, e))?;

        info!(
            bucket = %bucket,
            key = %key,
            size,
            content_type,
            acl = %acl,
            "Uploaded object to S3"
        );
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Cursor<Bytes>> {
        self.ensure_configured()?;

        let response = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(response) => response,
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    return Err(StorageError::not_found(bucket, key));
                }
                return Err(StorageError::transport("GetObject", bucket, key, e));
            }
        };

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::transport("GetObject", bucket, key, e))?
            .into_bytes();

        info!(
            bucket = %bucket,
            key = %key,
            size = body.len(),
            "Downloaded object from S3"
        );
        Ok(Cursor::new(body))
    }
}
