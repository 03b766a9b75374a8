//! Capability abstraction for the remote bucket store.
//!
//! The storage pipeline depends only on `list/create/put/get`, so an
//! in-memory double can replace the provider in tests.

use camino::{Utf8Path, Utf8PathBuf};

use crate::compute::{ApiFuture, RequestError};

/// Bucket entry returned by a listing call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BucketSummary {
    /// Bucket name, globally unique within the provider namespace.
    pub name: String,
}

/// Receipt returned after an object upload.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PutReceipt {
    /// Entity tag reported by the provider, when available.
    pub e_tag: Option<String>,
}

/// Object content fetched from the store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectDownload {
    /// Downloaded bytes.
    pub bytes: Vec<u8>,
    /// Byte count the provider reported alongside the body, when available.
    /// This is compared against `bytes.len()` during verification.
    pub reported_len: Option<u64>,
}

/// Inputs for one storage provisioning run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StorageRequest {
    /// Bucket name to ensure.
    pub bucket: String,
    /// Optional location constraint applied when the bucket is created.
    pub location: Option<String>,
    /// Object key used for the round-trip verification.
    pub key: String,
    /// Local file whose bytes are uploaded.
    pub upload_path: Utf8PathBuf,
    /// Local path the downloaded bytes are written to.
    pub download_path: Utf8PathBuf,
}

impl StorageRequest {
    /// Starts a builder for a [`StorageRequest`].
    #[must_use]
    pub fn builder() -> StorageRequestBuilder {
        StorageRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any required field is empty.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.bucket.is_empty() {
            return Err(RequestError::Validation("bucket".to_owned()));
        }
        if self.key.is_empty() {
            return Err(RequestError::Validation("object_key".to_owned()));
        }
        if self.upload_path.as_str().is_empty() {
            return Err(RequestError::Validation("upload_path".to_owned()));
        }
        if self.download_path.as_str().is_empty() {
            return Err(RequestError::Validation("download_path".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`StorageRequest`] that defers trimming and validation to
/// construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StorageRequestBuilder {
    bucket: String,
    location: Option<String>,
    key: String,
    upload_path: String,
    download_path: String,
}

impl StorageRequestBuilder {
    /// Creates an empty builder; fields must be populated before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bucket name.
    #[must_use]
    pub fn bucket(mut self, value: impl Into<String>) -> Self {
        self.bucket = value.into();
        self
    }

    /// Sets the optional location constraint for bucket creation.
    #[must_use]
    pub fn location(mut self, value: Option<String>) -> Self {
        self.location = value;
        self
    }

    /// Sets the object key.
    #[must_use]
    pub fn key(mut self, value: impl Into<String>) -> Self {
        self.key = value.into();
        self
    }

    /// Sets the local upload source path.
    #[must_use]
    pub fn upload_path(mut self, value: impl AsRef<Utf8Path>) -> Self {
        self.upload_path = value.as_ref().to_string();
        self
    }

    /// Sets the local download verification path.
    #[must_use]
    pub fn download_path(mut self, value: impl AsRef<Utf8Path>) -> Self {
        self.download_path = value.as_ref().to_string();
        self
    }

    /// Builds and validates the [`StorageRequest`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any required field is empty.
    pub fn build(self) -> Result<StorageRequest, RequestError> {
        let request = StorageRequest {
            bucket: self.bucket.trim().to_owned(),
            location: self.location.map(|value| value.trim().to_owned()),
            key: self.key.trim().to_owned(),
            upload_path: Utf8PathBuf::from(self.upload_path.trim()),
            download_path: Utf8PathBuf::from(self.download_path.trim()),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Minimal interface onto the remote bucket store.
pub trait BucketStore {
    /// Provider specific error type returned by the store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lists every bucket owned by the account.
    fn list_buckets(&self) -> ApiFuture<'_, Vec<BucketSummary>, Self::Error>;

    /// Creates a bucket, optionally constrained to a location distinct from
    /// the account's default region.
    fn create_bucket<'a>(
        &'a self,
        name: &'a str,
        location: Option<&'a str>,
    ) -> ApiFuture<'a, (), Self::Error>;

    /// Stores `bytes` under `(bucket, key)`.
    fn put_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        bytes: Vec<u8>,
    ) -> ApiFuture<'a, PutReceipt, Self::Error>;

    /// Fetches the object at `(bucket, key)` into memory.
    fn get_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
    ) -> ApiFuture<'a, ObjectDownload, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_trims_and_keeps_location() {
        let request = StorageRequest::builder()
            .bucket(" skyhook-bucket ")
            .location(Some(" eu-west-1 ".to_owned()))
            .key("test.txt")
            .upload_path("test.txt")
            .download_path("test-received.txt")
            .build()
            .unwrap_or_else(|err| panic!("build request: {err}"));

        assert_eq!(request.bucket, "skyhook-bucket");
        assert_eq!(request.location.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn builder_rejects_missing_key() {
        let err = StorageRequest::builder()
            .bucket("skyhook-bucket")
            .upload_path("test.txt")
            .download_path("test-received.txt")
            .build()
            .expect_err("missing key should be rejected");

        assert_eq!(err, RequestError::Validation("object_key".to_owned()));
    }
}
