//! S3-backed implementation of the bucket-store capability.

use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

use super::AwsApiError;
use crate::compute::ApiFuture;
use crate::storage::{BucketStore, BucketSummary, ObjectDownload, PutReceipt};

/// Bucket store backed by the S3 API.
#[derive(Clone, Debug)]
pub struct S3BucketStore {
    client: Client,
}

impl S3BucketStore {
    /// Connects a client scoped to `region` using the default credential
    /// chain.
    pub async fn connect(region: &str) -> Self {
        let config = super::sdk_config_for_region(region).await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Wraps an already-configured client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl BucketStore for S3BucketStore {
    type Error = AwsApiError;

    fn list_buckets(&self) -> ApiFuture<'_, Vec<BucketSummary>, Self::Error> {
        Box::pin(async move {
            let output = self
                .client
                .list_buckets()
                .send()
                .await
                .map_err(|err| AwsApiError::api("ListBuckets", DisplayErrorContext(&err)))?;

            Ok(output
                .buckets()
                .iter()
                .filter_map(|bucket| {
                    bucket.name().map(|name| BucketSummary {
                        name: name.to_owned(),
                    })
                })
                .collect())
        })
    }

    fn create_bucket<'a>(
        &'a self,
        name: &'a str,
        location: Option<&'a str>,
    ) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let mut call = self.client.create_bucket().bucket(name);
            if let Some(constraint) = location {
                call = call.create_bucket_configuration(
                    CreateBucketConfiguration::builder()
                        .location_constraint(BucketLocationConstraint::from(constraint))
                        .build(),
                );
            }
            call.send()
                .await
                .map_err(|err| AwsApiError::api("CreateBucket", DisplayErrorContext(&err)))?;
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
            let output = self
                .client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(bytes))
                .send()
                .await
                .map_err(|err| AwsApiError::api("PutObject", DisplayErrorContext(&err)))?;

            Ok(PutReceipt {
                e_tag: output.e_tag().map(ToOwned::to_owned),
            })
        })
    }

    fn get_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
    ) -> ApiFuture<'a, ObjectDownload, Self::Error> {
        Box::pin(async move {
            let output = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| AwsApiError::api("GetObject", DisplayErrorContext(&err)))?;

            // The provider reports the byte count separately from the body;
            // the pipeline compares the two during verification.
            let reported_len = output
                .content_length()
                .and_then(|len| u64::try_from(len).ok());
            let data = output
                .body
                .collect()
                .await
                .map_err(|err| AwsApiError::body("GetObject", err))?;

            Ok(ObjectDownload {
                bytes: data.into_bytes().to_vec(),
                reported_len,
            })
        })
    }
}
