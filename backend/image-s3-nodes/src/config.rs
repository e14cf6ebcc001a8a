/// Configuration management for the image nodes
///
/// Loaded once at process start and passed to [`crate::NodeRegistry::new`].
use s3_utils::{ObjectAcl, S3Config};
use serde::Deserialize;

#[derive(Clone, Debug, Default)]
pub struct NodesConfig {
    pub s3: S3Config,
    pub upload: UploadConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UploadConfig {
    /// Canned ACL applied to every uploaded object (`S3_UPLOAD_ACL`)
    #[serde(rename = "s3_upload_acl", default, deserialize_with = "deserialize_acl")]
    pub acl: ObjectAcl,
}

impl NodesConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envy::Error> {
        Ok(NodesConfig {
            s3: S3Config::from_env()?,
            upload: envy::from_env::<UploadConfig>()?,
        })
    }
}

fn deserialize_acl<'de, D>(deserializer: D) -> Result<ObjectAcl, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
