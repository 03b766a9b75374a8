//! Storage provisioning: ensure bucket → upload → download → verify.

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::info;

use crate::ensure::{Ensured, ensure_exists};
use crate::keyfile::{self, KeyfileError};
use crate::storage::{BucketStore, PutReceipt, StorageRequest};

/// Errors surfaced while provisioning and verifying the bucket.
#[derive(Debug, Error)]
pub enum StorageProvisionError<ApiError>
where
    ApiError: std::error::Error + 'static,
{
    /// Raised when the request is missing a required field.
    #[error("invalid storage request: {0}")]
    Validation(String),
    /// Raised when the bucket listing fails.
    #[error("failed to list buckets: {source}")]
    BucketList {
        /// Provider-specific error.
        #[source]
        source: ApiError,
    },
    /// Raised when bucket creation fails.
    #[error("failed to create bucket {name}: {source}")]
    BucketCreate {
        /// Bucket the create call was issued for.
        name: String,
        /// Provider-specific error.
        #[source]
        source: ApiError,
    },
    /// Raised when the local upload source cannot be read.
    #[error("failed to read upload source {path}: {source}")]
    ReadUpload {
        /// Local file that could not be read.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: KeyfileError,
    },
    /// Raised when the object upload fails.
    #[error("failed to upload object {key} to bucket {bucket}: {source}")]
    Upload {
        /// Target bucket.
        bucket: String,
        /// Object key.
        key: String,
        /// Provider-specific error.
        #[source]
        source: ApiError,
    },
    /// Raised when the object download fails.
    #[error("failed to download object {key} from bucket {bucket}: {source}")]
    Download {
        /// Source bucket.
        bucket: String,
        /// Object key.
        key: String,
        /// Provider-specific error.
        #[source]
        source: ApiError,
    },
    /// Raised when the provider-reported byte count disagrees with the
    /// downloaded buffer.
    #[error("downloaded {actual} bytes but the provider reported {reported}")]
    SizeMismatch {
        /// Byte count the provider reported.
        reported: u64,
        /// Byte count actually received.
        actual: u64,
    },
    /// Raised when the verification copy cannot be written locally.
    #[error("failed to write verification copy to {path}: {source}")]
    WriteDownload {
        /// Local path that could not be written.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: KeyfileError,
    },
}

impl<ApiError> From<crate::compute::RequestError> for StorageProvisionError<ApiError>
where
    ApiError: std::error::Error + 'static,
{
    fn from(value: crate::compute::RequestError) -> Self {
        match value {
            crate::compute::RequestError::Validation(field) => Self::Validation(field),
        }
    }
}

/// Runs the storage pipeline against a [`BucketStore`] implementation.
#[derive(Debug)]
pub struct StorageProvisioner<S> {
    store: S,
}

impl<S> StorageProvisioner<S>
where
    S: BucketStore,
{
    /// Creates a new provisioner.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Ensures the bucket exists by listing the account's buckets and
    /// creating only on an exact-name miss.
    ///
    /// Idempotence comes from the listing, not from provider-side conflict
    /// handling: a second call with the same name issues no create call.
    ///
    /// # Errors
    ///
    /// Returns [`StorageProvisionError`] when the listing or creation fails.
    pub async fn ensure_bucket(
        &self,
        request: &StorageRequest,
    ) -> Result<Ensured<String>, StorageProvisionError<S::Error>> {
        ensure_exists(
            || async {
                let buckets = self
                    .store
                    .list_buckets()
                    .await
                    .map_err(|source| StorageProvisionError::BucketList { source })?;
                Ok(buckets
                    .into_iter()
                    .map(|bucket| bucket.name)
                    .find(|name| name == &request.bucket))
            },
            || async {
                self.store
                    .create_bucket(&request.bucket, request.location.as_deref())
                    .await
                    .map_err(|source| StorageProvisionError::BucketCreate {
                        name: request.bucket.clone(),
                        source,
                    })?;
                Ok(request.bucket.clone())
            },
        )
        .await
    }

    /// Reads the local file at `path` and uploads its bytes under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageProvisionError`] when the local read or the upload
    /// fails.
    pub async fn upload(
        &self,
        request: &StorageRequest,
    ) -> Result<PutReceipt, StorageProvisionError<S::Error>> {
        let bytes = keyfile::read_bytes(&request.upload_path).map_err(|source| {
            StorageProvisionError::ReadUpload {
                path: request.upload_path.clone(),
                source,
            }
        })?;
        self.store
            .put_object(&request.bucket, &request.key, bytes)
            .await
            .map_err(|source| StorageProvisionError::Upload {
                bucket: request.bucket.clone(),
                key: request.key.clone(),
                source,
            })
    }

    /// Downloads the object into memory and verifies the provider-reported
    /// byte count against the received buffer.
    ///
    /// # Errors
    ///
    /// Returns [`StorageProvisionError::Download`] when the fetch fails and
    /// [`StorageProvisionError::SizeMismatch`] when the counts disagree.
    pub async fn download(
        &self,
        request: &StorageRequest,
    ) -> Result<Vec<u8>, StorageProvisionError<S::Error>> {
        let download = self
            .store
            .get_object(&request.bucket, &request.key)
            .await
            .map_err(|source| StorageProvisionError::Download {
                bucket: request.bucket.clone(),
                key: request.key.clone(),
                source,
            })?;

        let actual = u64::try_from(download.bytes.len()).unwrap_or(u64::MAX);
        if let Some(reported) = download.reported_len
            && reported != actual
        {
            return Err(StorageProvisionError::SizeMismatch { reported, actual });
        }
        Ok(download.bytes)
    }

    /// Runs the full storage workflow: ensure bucket, upload the configured
    /// local file, download it back, and persist the verification copy.
    ///
    /// A created-but-unused bucket left behind by a later step failure is not
    /// cleaned up (at-least-once-created semantics).
    ///
    /// # Errors
    ///
    /// Returns [`StorageProvisionError`] from the first failing step; later
    /// steps are skipped.
    pub async fn provision_and_verify(
        &self,
        request: &StorageRequest,
    ) -> Result<(), StorageProvisionError<S::Error>> {
        request.validate()?;

        let ensured = self.ensure_bucket(request).await?;
        if ensured.was_created() {
            info!(bucket = %request.bucket, "bucket created");
        } else {
            info!(bucket = %request.bucket, "bucket already exists");
        }

        let receipt = self.upload(request).await?;
        info!(
            bucket = %request.bucket,
            key = %request.key,
            e_tag = receipt.e_tag.as_deref().unwrap_or("-"),
            "object uploaded"
        );

        let bytes = self.download(request).await?;
        keyfile::write_bytes(&request.download_path, &bytes).map_err(|source| {
            StorageProvisionError::WriteDownload {
                path: request.download_path.clone(),
                source,
            }
        })?;
        info!(
            key = %request.key,
            path = %request.download_path,
            bytes = bytes.len(),
            "round-trip verified and copy persisted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    use camino::Utf8PathBuf;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::compute::ApiFuture;
    use crate::storage::{BucketSummary, ObjectDownload};

    #[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
    #[error("fake store failure: {0}")]
    struct FakeStoreError(&'static str);

    #[derive(Debug, Default)]
    struct FakeState {
        buckets: Vec<String>,
        objects: HashMap<(String, String), Vec<u8>>,
        create_calls: u32,
        misreport_len: Option<u64>,
    }

    #[derive(Debug, Default)]
    struct FakeBucketStore {
        state: Mutex<FakeState>,
    }

    impl FakeBucketStore {
        fn with_buckets(names: &[&str]) -> Self {
            Self {
                state: Mutex::new(FakeState {
                    buckets: names.iter().map(|name| (*name).to_owned()).collect(),
                    ..FakeState::default()
                }),
            }
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl BucketStore for &FakeBucketStore {
        type Error = FakeStoreError;

        fn list_buckets(&self) -> ApiFuture<'_, Vec<BucketSummary>, Self::Error> {
            Box::pin(async move {
                Ok(self
                    .lock()
                    .buckets
                    .iter()
                    .map(|name| BucketSummary { name: name.clone() })
                    .collect())
            })
        }

        fn create_bucket<'a>(
            &'a self,
            name: &'a str,
            _location: Option<&'a str>,
        ) -> ApiFuture<'a, (), Self::Error> {
            Box::pin(async move {
                let mut state = self.lock();
                state.create_calls += 1;
                state.buckets.push(name.to_owned());
                Ok(())
            })
        }

        fn put_object<'a>(
            &'a self,
            bucket: &'a str,
            key: &'a str,
            bytes: Vec<u8>,
        ) -> ApiFuture<'a, PutReceipt, Self::Error> {
            Box::pin(async move {
                self.lock()
                    .objects
                    .insert((bucket.to_owned(), key.to_owned()), bytes);
                Ok(PutReceipt {
                    e_tag: Some(String::from("\"fake-etag\"")),
                })
            })
        }

        fn get_object<'a>(
            &'a self,
            bucket: &'a str,
            key: &'a str,
        ) -> ApiFuture<'a, ObjectDownload, Self::Error> {
            Box::pin(async move {
                let state = self.lock();
                let bytes = state
                    .objects
                    .get(&(bucket.to_owned(), key.to_owned()))
                    .cloned()
                    .ok_or_else(|| FakeStoreError("no such object"))?;
                let reported_len = state
                    .misreport_len
                    .or_else(|| u64::try_from(bytes.len()).ok());
                Ok(ObjectDownload {
                    bytes,
                    reported_len,
                })
            })
        }
    }

    fn request_for(tmp: &TempDir, bucket: &str) -> StorageRequest {
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
            .unwrap_or_else(|err| panic!("temp path should be utf8: {}", err.display()));
        StorageRequest::builder()
            .bucket(bucket)
            .key("test.txt")
            .upload_path(dir.join("test.txt"))
            .download_path(dir.join("test-received.txt"))
            .build()
            .unwrap_or_else(|err| panic!("build request: {err}"))
    }

    fn seed_upload(request: &StorageRequest, bytes: &[u8]) {
        keyfile::write_bytes(&request.upload_path, bytes)
            .unwrap_or_else(|err| panic!("seed upload file: {err}"));
    }

    #[rstest]
    #[case::absent_bucket_is_created("testing-bucket-03", 1)]
    #[case::existing_bucket_is_left_alone("testing-bucket-02", 0)]
    #[tokio::test]
    async fn ensure_bucket_creates_only_on_name_miss(
        #[case] bucket: &str,
        #[case] expected_creates: u32,
    ) {
        let store = FakeBucketStore::with_buckets(&["testing-bucket-01", "testing-bucket-02"]);
        let provisioner = StorageProvisioner::new(&store);
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let request = request_for(&tmp, bucket);

        let ensured = provisioner
            .ensure_bucket(&request)
            .await
            .unwrap_or_else(|err| panic!("ensure bucket: {err}"));

        assert_eq!(ensured.was_created(), expected_creates == 1);
        assert_eq!(store.lock().create_calls, expected_creates);
    }

    #[tokio::test]
    async fn ensure_bucket_twice_creates_once() {
        let store = FakeBucketStore::default();
        let provisioner = StorageProvisioner::new(&store);
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let request = request_for(&tmp, "skyhook-bucket");

        let first = provisioner
            .ensure_bucket(&request)
            .await
            .unwrap_or_else(|err| panic!("first ensure: {err}"));
        let second = provisioner
            .ensure_bucket(&request)
            .await
            .unwrap_or_else(|err| panic!("second ensure: {err}"));

        assert!(first.was_created());
        assert!(!second.was_created());
        assert_eq!(store.lock().create_calls, 1);
    }

    #[tokio::test]
    async fn round_trip_preserves_bytes() {
        let store = FakeBucketStore::default();
        let provisioner = StorageProvisioner::new(&store);
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let request = request_for(&tmp, "skyhook-bucket");
        seed_upload(&request, b"hello from skyhook\n");

        provisioner
            .provision_and_verify(&request)
            .await
            .unwrap_or_else(|err| panic!("provision and verify: {err}"));

        let received = keyfile::read_bytes(&request.download_path)
            .unwrap_or_else(|err| panic!("read verification copy: {err}"));
        assert_eq!(received, b"hello from skyhook\n");
    }

    #[tokio::test]
    async fn size_mismatch_surfaces_distinct_error() {
        let store = FakeBucketStore::default();
        store.lock().misreport_len = Some(999);
        let provisioner = StorageProvisioner::new(&store);
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let request = request_for(&tmp, "skyhook-bucket");
        seed_upload(&request, b"short body");

        let err = provisioner
            .provision_and_verify(&request)
            .await
            .expect_err("mismatched counts should fail");

        assert!(
            matches!(
                err,
                StorageProvisionError::SizeMismatch {
                    reported: 999,
                    actual: 10
                }
            ),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn missing_upload_source_short_circuits() {
        let store = FakeBucketStore::default();
        let provisioner = StorageProvisioner::new(&store);
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let request = request_for(&tmp, "skyhook-bucket");

        let err = provisioner
            .provision_and_verify(&request)
            .await
            .expect_err("missing upload source should fail");

        assert!(matches!(err, StorageProvisionError::ReadUpload { .. }));
        // The bucket was still ensured before the failing step.
        assert_eq!(store.lock().create_calls, 1);
    }
}
