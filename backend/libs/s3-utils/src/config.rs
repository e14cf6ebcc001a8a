/// S3 credential configuration
///
/// Built once at process start and handed to [`crate::S3Client::new`].
use serde::Deserialize;

/// Environment variable holding the access key
pub const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret key
pub const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable holding the region
pub const REGION_VAR: &str = "AWS_REGION_NAME";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Config {
    /// AWS access key id
    #[serde(rename = "aws_access_key_id")]
    pub access_key_id: Option<String>,
    /// AWS secret access key
    #[serde(rename = "aws_secret_access_key")]
    pub secret_access_key: Option<String>,
    /// AWS region
    #[serde(rename = "aws_region_name")]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores (e.g. MinIO)
    #[serde(rename = "s3_endpoint")]
    pub endpoint: Option<String>,
    /// Whether to use path-style addressing (needed by most custom endpoints)
    #[serde(rename = "s3_force_path_style", default)]
    pub force_path_style: bool,
}

impl S3Config {
    /// Load S3 configuration from environment variables (and `.env`, if present)
    ///
    /// Missing credentials are not an error here; see [`S3Config::missing`].
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env::<S3Config>()
    }

    /// Create a configuration with explicit static credentials
    pub fn with_credentials(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            region: Some(region.into()),
            endpoint: None,
            force_path_style: false,
        }
    }

    /// Names of the required environment variables that are unset or blank
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (ACCESS_KEY_VAR, &self.access_key_id),
            (SECRET_KEY_VAR, &self.secret_access_key),
            (REGION_VAR, &self.region),
        ]
        .into_iter()
        .filter(|(_, value)| !is_present(value))
        .map(|(name, _)| name)
        .collect()
    }

    /// Whether all required values are set
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Custom endpoint, ignoring blank values
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_config_has_nothing_missing() {
        let config = S3Config::with_credentials("AKIA", "secret", "ap-northeast-2");
        assert!(config.is_complete());
        assert!(config.missing().is_empty());
    }

    #[test]
    fn test_missing_reports_each_absent_variable() {
        let config = S3Config {
            access_key_id: Some("AKIA".to_string()),
            secret_access_key: None,
            region: Some("   ".to_string()),
            ..S3Config::default()
        };

        assert_eq!(config.missing(), vec![SECRET_KEY_VAR, REGION_VAR]);
        assert!(!config.is_complete());
    }

    #[test]
    fn test_default_config_is_missing_everything() {
        let config = S3Config::default();
        assert_eq!(
            config.missing(),
            vec![ACCESS_KEY_VAR, SECRET_KEY_VAR, REGION_VAR]
        );
    }

    #[test]
    fn test_blank_endpoint_is_ignored() {
        let mut config = S3Config::with_credentials("AKIA", "secret", "us-east-1");
        config.endpoint = Some(" ".to_string());
        assert_eq!(config.endpoint(), None);

        config.endpoint = Some("http://localhost:9000".to_string());
        assert_eq!(config.endpoint(), Some("http://localhost:9000"));
    }
}
