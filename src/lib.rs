//! Core library for the Skyhook provisioning tool.
//!
//! The crate exposes capability abstractions for a remote compute API and a
//! bucket store, plus two idempotent provisioning pipelines built on the
//! shared ensure → identify → use idiom (ensure keypair → launch instance;
//! ensure bucket → upload → download → verify).

pub mod aws;
pub mod cli;
pub mod compute;
pub mod config;
pub mod ensure;
pub mod keyfile;
pub mod provision;
pub mod storage;
#[cfg(test)]
pub mod test_helpers;

pub use compute::{
    ApiFuture, ComputeApi, ComputeRequest, ComputeRequestBuilder, CreatedKeyPair, ImageFilter,
    ImageSummary, InstanceSummary, KeyPairSummary, LaunchRequest, RequestError,
};
pub use config::{ConfigError, ProvisionConfig};
pub use ensure::{Ensured, ensure_exists};
pub use keyfile::{KeyMaterialStore, KeyfileError, OwnerOnlyKeyfile};
pub use provision::{
    ComputeProvisionError, ComputeProvisioner, StorageProvisionError, StorageProvisioner,
};
pub use storage::{
    BucketStore, BucketSummary, ObjectDownload, PutReceipt, StorageRequest, StorageRequestBuilder,
};
