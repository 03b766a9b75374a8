//! AWS implementations of the compute and bucket-store capabilities.
//!
//! Each pipeline owns its own client handle; the shared SDK configuration is
//! resolved once per pipeline invocation and threaded explicitly.

mod ec2;
mod error;
mod s3;

use aws_config::{BehaviorVersion, Region, SdkConfig};

pub use ec2::Ec2Compute;
pub use error::AwsApiError;
pub use s3::S3BucketStore;

/// Resolves the shared SDK configuration for `region` using the default
/// credential chain.
pub async fn sdk_config_for_region(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_owned()))
        .load()
        .await
}
