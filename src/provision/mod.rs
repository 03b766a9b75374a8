//! Idempotent provisioning pipelines.
//!
//! Both pipelines are independent, hold no shared state, and execute their
//! remote calls strictly in sequence. The orchestrating binary invokes the
//! compute pipeline first and the storage pipeline afterwards regardless of
//! the compute outcome.

mod compute;
mod storage;

pub use compute::{ComputeProvisionError, ComputeProvisioner};
pub use storage::{StorageProvisionError, StorageProvisioner};
