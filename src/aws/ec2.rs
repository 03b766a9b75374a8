//! EC2-backed implementation of the compute capability.

use aws_sdk_ec2::Client;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ec2::types::{Filter, InstanceType};

use super::AwsApiError;
use crate::compute::{
    ApiFuture, ComputeApi, CreatedKeyPair, ImageFilter, ImageSummary, InstanceSummary,
    KeyPairSummary, LaunchRequest,
};

/// Error code EC2 returns when a named keypair does not exist. This is the
/// expected-absent signal during provisioning, not a failure.
const KEY_PAIR_NOT_FOUND: &str = "InvalidKeyPair.NotFound";

/// Compute capability backed by the EC2 API.
#[derive(Clone, Debug)]
pub struct Ec2Compute {
    client: Client,
}

impl Ec2Compute {
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

fn is_key_pair_not_found(err: &impl ProvideErrorMetadata) -> bool {
    err.code() == Some(KEY_PAIR_NOT_FOUND)
}

impl ComputeApi for Ec2Compute {
    type Error = AwsApiError;

    fn describe_key_pairs<'a>(
        &'a self,
        name: &'a str,
    ) -> ApiFuture<'a, Vec<KeyPairSummary>, Self::Error> {
        Box::pin(async move {
            match self.client.describe_key_pairs().key_names(name).send().await {
                Ok(output) => Ok(output
                    .key_pairs()
                    .iter()
                    .filter_map(|pair| {
                        pair.key_name().map(|key_name| KeyPairSummary {
                            name: key_name.to_owned(),
                        })
                    })
                    .collect()),
                Err(err) if is_key_pair_not_found(&err) => Ok(Vec::new()),
                Err(err) => Err(AwsApiError::api(
                    "DescribeKeyPairs",
                    DisplayErrorContext(&err),
                )),
            }
        })
    }

    fn create_key_pair<'a>(
        &'a self,
        name: &'a str,
    ) -> ApiFuture<'a, CreatedKeyPair, Self::Error> {
        Box::pin(async move {
            let output = self
                .client
                .create_key_pair()
                .key_name(name)
                .send()
                .await
                .map_err(|err| AwsApiError::api("CreateKeyPair", DisplayErrorContext(&err)))?;

            let key_name = output
                .key_name()
                .ok_or_else(|| AwsApiError::missing_field("CreateKeyPair", "keyName"))?
                .to_owned();
            let material = output
                .key_material()
                .ok_or_else(|| AwsApiError::missing_field("CreateKeyPair", "keyMaterial"))?
                .to_owned();
            Ok(CreatedKeyPair {
                name: key_name,
                material,
            })
        })
    }

    fn describe_images<'a>(
        &'a self,
        filter: &'a ImageFilter,
    ) -> ApiFuture<'a, Vec<ImageSummary>, Self::Error> {
        Box::pin(async move {
            let output = self
                .client
                .describe_images()
                .filters(
                    Filter::builder()
                        .name("name")
                        .values(&filter.name_pattern)
                        .build(),
                )
                .owners(&filter.owner)
                .send()
                .await
                .map_err(|err| AwsApiError::api("DescribeImages", DisplayErrorContext(&err)))?;

            Ok(output
                .images()
                .iter()
                .filter_map(|image| {
                    image.image_id().map(|id| ImageSummary {
                        id: id.to_owned(),
                        name: image.name().map(ToOwned::to_owned),
                    })
                })
                .collect())
        })
    }

    fn run_instance<'a>(
        &'a self,
        launch: &'a LaunchRequest,
    ) -> ApiFuture<'a, Vec<InstanceSummary>, Self::Error> {
        Box::pin(async move {
            let output = self
                .client
                .run_instances()
                .image_id(&launch.image_id)
                .key_name(&launch.key_name)
                .instance_type(InstanceType::from(launch.instance_type.as_str()))
                .min_count(launch.count)
                .max_count(launch.count)
                .send()
                .await
                .map_err(|err| AwsApiError::api("RunInstances", DisplayErrorContext(&err)))?;

            Ok(output
                .instances()
                .iter()
                .filter_map(|instance| {
                    instance.instance_id().map(|id| InstanceSummary { id: id.to_owned() })
                })
                .collect())
        })
    }
}
