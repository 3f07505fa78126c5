//! Createleaseblob command - make sure the lease blob exists.

use anyhow::Result;
use azlease_core::{LeaseTargetProvisioner, Operation, OperationResult};
use clap::Args;

use super::common::{TargetArgs, connect, invalid};
use crate::Config;

/// Subcommand name, used for help output.
pub const NAME: &str = "createleaseblob";

/// Arguments for the createleaseblob command.
#[derive(Debug, Args)]
pub struct CreateLeaseBlobArgs {
    /// Lease target.
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Execute the createleaseblob command.
///
/// # Errors
///
/// Returns an error if arguments are invalid or no token can be obtained.
/// Storage failures are reported in the result instead.
pub async fn execute(args: CreateLeaseBlobArgs, config: &Config) -> Result<OperationResult> {
    let target = args.target.target(config).map_err(invalid(NAME))?;
    let cloud = args.target.cloud().map_err(invalid(NAME))?;
    let backend = connect(&args.target, &cloud, config).await?;

    let outcome = LeaseTargetProvisioner::new(backend, &config.engine)
        .provision(&target)
        .await;
    Ok(OperationResult::report(
        Operation::CreateLeaseBlob,
        &target,
        outcome,
    ))
}
