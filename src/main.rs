//! Binary entry point for the Skyhook CLI.

use std::env;
use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use skyhook::aws::{Ec2Compute, S3BucketStore};
use skyhook::cli::{Cli, ProvisionCommand};
use skyhook::{ComputeProvisioner, OwnerOnlyKeyfile, ProvisionConfig, StorageProvisioner};

#[cfg(test)]
mod test_helpers;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Provision(command) => provision_command(&command).await,
    }
}

/// Runs both pipelines sequentially. The storage pipeline executes
/// regardless of the compute outcome; only a compute failure makes the
/// process exit non-zero.
async fn provision_command(args: &ProvisionCommand) -> Result<i32, CliError> {
    if let Some(result) = fake_provision_from_env() {
        return result;
    }

    let mut config =
        ProvisionConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    apply_overrides(&mut config, args);

    let compute_ok = run_compute(&config).await;
    run_storage(&config).await;

    Ok(if compute_ok { 0 } else { 1 })
}

fn apply_overrides(config: &mut ProvisionConfig, args: &ProvisionCommand) {
    if let Some(region) = &args.region {
        config.region.clone_from(region);
    }
    if let Some(instance_type) = &args.instance_type {
        config.instance_type.clone_from(instance_type);
    }
    if let Some(bucket) = &args.bucket {
        config.bucket.clone_from(bucket);
    }
}

async fn run_compute(config: &ProvisionConfig) -> bool {
    let request = match config.as_compute_request() {
        Ok(request) => request,
        Err(err) => {
            error!("compute provisioning failed: {err}");
            return false;
        }
    };

    let api = Ec2Compute::connect(&config.region).await;
    let provisioner = ComputeProvisioner::new(api, OwnerOnlyKeyfile::new());
    match provisioner.provision(&request).await {
        Ok(instance_id) => {
            info!(instance_id = %instance_id, "new instance provisioned");
            true
        }
        Err(err) => {
            error!("compute provisioning failed: {err}");
            false
        }
    }
}

async fn run_storage(config: &ProvisionConfig) {
    let request = match config.as_storage_request() {
        Ok(request) => request,
        Err(err) => {
            warn!("storage provisioning failed: {err}");
            return;
        }
    };

    let store = S3BucketStore::connect(&config.region).await;
    let provisioner = StorageProvisioner::new(store);
    match provisioner.provision_and_verify(&request).await {
        Ok(()) => info!(bucket = %request.bucket, "storage round-trip verified"),
        Err(err) => warn!("storage provisioning failed: {err}"),
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

fn fake_provision_from_env() -> Option<Result<i32, CliError>> {
    let mode = env::var("SKYHOOK_FAKE_PROVISION_MODE").ok()?;
    match mode.as_str() {
        "ok" => {
            writeln!(io::stdout(), "instance provisioned: i-0fake").ok();
            Some(Ok(0))
        }
        "compute-fail" => {
            writeln!(io::stderr(), "compute provisioning failed: fake").ok();
            Some(Ok(1))
        }
        "storage-fail" => {
            writeln!(io::stderr(), "storage provisioning failed: fake").ok();
            Some(Ok(0))
        }
        "config-fail" => Some(Err(CliError::Config(String::from("fake")))),
        _ => None,
    }
}
