//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::compute::ComputeRequest;
use crate::storage::StorageRequest;

/// Provisioning configuration derived from environment variables,
/// configuration files, and CLI flags.
///
/// All remote calls in a run are scoped to `region`; the configuration is
/// loaded once per pipeline invocation and never mutated.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "SKYHOOK")]
pub struct ProvisionConfig {
    /// Provider region every remote call is issued against.
    #[ortho_config(default = "us-east-1".to_owned())]
    pub region: String,
    /// Keypair name ensured by the compute pipeline.
    #[ortho_config(default = "skyhook-key".to_owned())]
    pub key_name: String,
    /// Local path the private key material is persisted to on creation.
    #[ortho_config(default = "skyhook-key.pem".to_owned())]
    pub key_material_path: String,
    /// Name pattern used to resolve the base image.
    #[ortho_config(
        default = "ubuntu/images/hvm-ssd/ubuntu-focal-20.04-amd64-server-*".to_owned()
    )]
    pub image_name_pattern: String,
    /// Publisher/owner account the image catalog query is scoped to.
    /// Defaults to Canonical's account.
    #[ortho_config(default = "099720109477".to_owned())]
    pub image_owner: String,
    /// Machine size for the launched instance.
    #[ortho_config(default = "t3.micro".to_owned())]
    pub instance_type: String,
    /// Bucket name ensured by the storage pipeline.
    #[ortho_config(default = "skyhook-bucket".to_owned())]
    pub bucket: String,
    /// Optional location constraint applied when the bucket is created.
    pub bucket_location: Option<String>,
    /// Object key used for the round-trip verification.
    #[ortho_config(default = "test.txt".to_owned())]
    pub object_key: String,
    /// Local file uploaded during verification.
    #[ortho_config(default = "test.txt".to_owned())]
    pub upload_path: String,
    /// Local path the downloaded bytes are written to.
    #[ortho_config(default = "test-received.txt".to_owned())]
    pub download_path: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
    section: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        toml_key: &'static str,
        section: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            toml_key,
            section,
        }
    }
}

impl ProvisionConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to [{}] in skyhook.toml",
                metadata.description, metadata.env_var, metadata.toml_key, metadata.section
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("skyhook")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Builds the compute pipeline request from the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn as_compute_request(&self) -> Result<ComputeRequest, ConfigError> {
        self.validate()?;
        ComputeRequest::builder()
            .key_name(&self.key_name)
            .key_material_path(self.key_material_path.as_str())
            .image_name_pattern(&self.image_name_pattern)
            .image_owner(&self.image_owner)
            .instance_type(&self.instance_type)
            .build()
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Builds the storage pipeline request from the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn as_storage_request(&self) -> Result<StorageRequest, ConfigError> {
        self.validate()?;
        StorageRequest::builder()
            .bucket(&self.bucket)
            .location(self.bucket_location.clone())
            .key(&self.object_key)
            .upload_path(self.upload_path.as_str())
            .download_path(self.download_path.as_str())
            .build()
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.region,
            &FieldMetadata::new("provider region", "SKYHOOK_REGION", "region", "skyhook"),
        )?;
        Self::require_field(
            &self.key_name,
            &FieldMetadata::new("keypair name", "SKYHOOK_KEY_NAME", "key_name", "skyhook"),
        )?;
        Self::require_field(
            &self.key_material_path,
            &FieldMetadata::new(
                "private key path",
                "SKYHOOK_KEY_MATERIAL_PATH",
                "key_material_path",
                "skyhook",
            ),
        )?;
        Self::require_field(
            &self.image_name_pattern,
            &FieldMetadata::new(
                "image name pattern",
                "SKYHOOK_IMAGE_NAME_PATTERN",
                "image_name_pattern",
                "skyhook",
            ),
        )?;
        Self::require_field(
            &self.image_owner,
            &FieldMetadata::new(
                "image owner account",
                "SKYHOOK_IMAGE_OWNER",
                "image_owner",
                "skyhook",
            ),
        )?;
        Self::require_field(
            &self.instance_type,
            &FieldMetadata::new(
                "instance type",
                "SKYHOOK_INSTANCE_TYPE",
                "instance_type",
                "skyhook",
            ),
        )?;
        Self::require_field(
            &self.bucket,
            &FieldMetadata::new("bucket name", "SKYHOOK_BUCKET", "bucket", "skyhook"),
        )?;
        Self::require_field(
            &self.object_key,
            &FieldMetadata::new("object key", "SKYHOOK_OBJECT_KEY", "object_key", "skyhook"),
        )?;
        Self::require_field(
            &self.upload_path,
            &FieldMetadata::new(
                "upload source path",
                "SKYHOOK_UPLOAD_PATH",
                "upload_path",
                "skyhook",
            ),
        )?;
        Self::require_field(
            &self.download_path,
            &FieldMetadata::new(
                "download verification path",
                "SKYHOOK_DOWNLOAD_PATH",
                "download_path",
                "skyhook",
            ),
        )?;
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_fixture() -> ProvisionConfig {
        ProvisionConfig {
            region: "us-east-1".to_owned(),
            key_name: "skyhook-key".to_owned(),
            key_material_path: "skyhook-key.pem".to_owned(),
            image_name_pattern: "ubuntu/images/hvm-ssd/ubuntu-focal-20.04-amd64-server-*"
                .to_owned(),
            image_owner: "099720109477".to_owned(),
            instance_type: "t3.micro".to_owned(),
            bucket: "skyhook-bucket".to_owned(),
            bucket_location: None,
            object_key: "test.txt".to_owned(),
            upload_path: "test.txt".to_owned(),
            download_path: "test-received.txt".to_owned(),
        }
    }

    #[test]
    fn validate_accepts_complete_configuration() {
        assert!(config_fixture().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_bucket() {
        let mut config = config_fixture();
        config.bucket = String::from("  ");

        let err = config.validate().expect_err("blank bucket should fail");

        assert!(
            matches!(err, ConfigError::MissingField(ref message) if message.contains("SKYHOOK_BUCKET")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn as_compute_request_carries_image_filter() {
        let request = config_fixture()
            .as_compute_request()
            .unwrap_or_else(|err| panic!("build compute request: {err}"));

        assert_eq!(request.image.owner, "099720109477");
        assert_eq!(request.instance_type, "t3.micro");
    }

    #[test]
    fn as_storage_request_defaults_location_to_none() {
        let request = config_fixture()
            .as_storage_request()
            .unwrap_or_else(|err| panic!("build storage request: {err}"));

        assert_eq!(request.bucket, "skyhook-bucket");
        assert_eq!(request.location, None);
    }
}
