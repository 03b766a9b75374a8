//! Command-line interface definitions for the `skyhook` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `skyhook` binary.
#[derive(Debug, Parser)]
#[command(
    name = "skyhook",
    about = "Provision a cloud instance and a storage bucket on demand",
    arg_required_else_help = true
)]
pub enum Cli {
    /// Run both provisioning pipelines: compute first, then storage.
    #[command(
        name = "provision",
        about = "Ensure keypair, launch an instance, then ensure bucket and verify an object round-trip"
    )]
    Provision(ProvisionCommand),
}

/// Arguments for the `skyhook provision` subcommand.
#[derive(Debug, Parser)]
pub struct ProvisionCommand {
    /// Override the provider region for this run.
    ///
    /// Every remote call in both pipelines is scoped to this region. When
    /// omitted the configured default applies.
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,
    /// Override the instance machine size (for example `t3.micro`).
    #[arg(long, value_name = "TYPE")]
    pub instance_type: Option<String>,
    /// Override the bucket name to ensure and verify against.
    #[arg(long, value_name = "BUCKET")]
    pub bucket: Option<String>,
}
