//! Capability abstraction for the remote compute API.
//!
//! The provisioning pipeline only depends on the four operations below, so a
//! test double can stand in for the provider without touching pipeline logic.

use std::future::Future;
use std::pin::Pin;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Future returned by capability trait operations.
pub type ApiFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Summary of an existing keypair as reported by the provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyPairSummary {
    /// Human-assigned name, unique within an account and region.
    pub name: String,
}

/// Keypair returned by a create call.
///
/// The private material is produced exactly once at creation time and can
/// never be retrieved from the provider again.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreatedKeyPair {
    /// Name the keypair was registered under.
    pub name: String,
    /// Server-generated private key material (PEM blob).
    pub material: String,
}

/// Catalog filter used to resolve a base image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageFilter {
    /// Name pattern matched against the catalog (provider wildcard syntax).
    pub name_pattern: String,
    /// Publisher/owner account the catalog is scoped to.
    pub owner: String,
}

/// Image entry returned by a catalog query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageSummary {
    /// Provider-assigned image identifier.
    pub id: String,
    /// Human-readable image name, when the provider reports one.
    pub name: Option<String>,
}

/// Parameters for a single instance launch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LaunchRequest {
    /// Image the instance boots from.
    pub image_id: String,
    /// Keypair name injected for SSH access.
    pub key_name: String,
    /// Machine size (for example `t3.micro`).
    pub instance_type: String,
    /// Number of instances requested. The pipeline always asks for one.
    pub count: i32,
}

impl LaunchRequest {
    /// Builds a launch request for exactly one instance.
    #[must_use]
    pub const fn single(image_id: String, key_name: String, instance_type: String) -> Self {
        Self {
            image_id,
            key_name,
            instance_type,
            count: 1,
        }
    }
}

/// Instance entry returned by a launch call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceSummary {
    /// Provider-assigned instance identifier.
    pub id: String,
}

/// Inputs for one compute provisioning run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComputeRequest {
    /// Keypair name to ensure.
    pub key_name: String,
    /// Local path the private key material is persisted to on creation.
    pub key_material_path: Utf8PathBuf,
    /// Catalog filter for the base image.
    pub image: ImageFilter,
    /// Machine size to launch.
    pub instance_type: String,
}

impl ComputeRequest {
    /// Starts a builder for a [`ComputeRequest`].
    #[must_use]
    pub fn builder() -> ComputeRequestBuilder {
        ComputeRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any string field is empty.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.key_name.is_empty() {
            return Err(RequestError::Validation("key_name".to_owned()));
        }
        if self.key_material_path.as_str().is_empty() {
            return Err(RequestError::Validation("key_material_path".to_owned()));
        }
        if self.image.name_pattern.is_empty() {
            return Err(RequestError::Validation("image_name_pattern".to_owned()));
        }
        if self.image.owner.is_empty() {
            return Err(RequestError::Validation("image_owner".to_owned()));
        }
        if self.instance_type.is_empty() {
            return Err(RequestError::Validation("instance_type".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`ComputeRequest`] that defers trimming and validation to
/// construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ComputeRequestBuilder {
    key_name: String,
    key_material_path: String,
    image_name_pattern: String,
    image_owner: String,
    instance_type: String,
}

impl ComputeRequestBuilder {
    /// Creates an empty builder; fields must be populated before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the keypair name.
    #[must_use]
    pub fn key_name(mut self, value: impl Into<String>) -> Self {
        self.key_name = value.into();
        self
    }

    /// Sets the local path for persisted key material.
    #[must_use]
    pub fn key_material_path(mut self, value: impl AsRef<Utf8Path>) -> Self {
        self.key_material_path = value.as_ref().to_string();
        self
    }

    /// Sets the image name pattern.
    #[must_use]
    pub fn image_name_pattern(mut self, value: impl Into<String>) -> Self {
        self.image_name_pattern = value.into();
        self
    }

    /// Sets the image owner/publisher account.
    #[must_use]
    pub fn image_owner(mut self, value: impl Into<String>) -> Self {
        self.image_owner = value.into();
        self
    }

    /// Sets the machine size.
    #[must_use]
    pub fn instance_type(mut self, value: impl Into<String>) -> Self {
        self.instance_type = value.into();
        self
    }

    /// Builds and validates the [`ComputeRequest`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any required field is empty.
    pub fn build(self) -> Result<ComputeRequest, RequestError> {
        let request = ComputeRequest {
            key_name: self.key_name.trim().to_owned(),
            key_material_path: Utf8PathBuf::from(self.key_material_path.trim()),
            image: ImageFilter {
                name_pattern: self.image_name_pattern.trim().to_owned(),
                owner: self.image_owner.trim().to_owned(),
            },
            instance_type: self.instance_type.trim().to_owned(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Errors raised while constructing pipeline requests.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a request is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
}

/// Minimal interface onto the remote compute service.
///
/// One provisioning run issues at most one call per operation; no call is
/// retried.
pub trait ComputeApi {
    /// Provider specific error type returned by the API.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lists keypairs registered under `name`.
    ///
    /// An absent keypair is the expected case during provisioning, so
    /// implementations must surface the provider's "not found" signal as an
    /// empty listing rather than an error.
    fn describe_key_pairs<'a>(
        &'a self,
        name: &'a str,
    ) -> ApiFuture<'a, Vec<KeyPairSummary>, Self::Error>;

    /// Registers a new keypair and returns its one-time private material.
    fn create_key_pair<'a>(&'a self, name: &'a str)
    -> ApiFuture<'a, CreatedKeyPair, Self::Error>;

    /// Queries the image catalog, preserving the provider's result order.
    fn describe_images<'a>(
        &'a self,
        filter: &'a ImageFilter,
    ) -> ApiFuture<'a, Vec<ImageSummary>, Self::Error>;

    /// Launches instances and returns them in provider order.
    fn run_instance<'a>(
        &'a self,
        launch: &'a LaunchRequest,
    ) -> ApiFuture<'a, Vec<InstanceSummary>, Self::Error>;
}
