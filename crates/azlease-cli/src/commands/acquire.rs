//! Acquire command - try to become leader.

use std::sync::Arc;

use anyhow::Result;
use azlease_core::{
    AcquireRequest, AcquireWait, LeaseAcquirer, LeaseDuration, Operation, OperationResult,
    RetryBudget, TokioPause,
};
use clap::Args;

use super::common::{TargetArgs, connect, invalid};
use crate::Config;
use crate::exit::ArgumentError;

/// Subcommand name, used for help output.
pub const NAME: &str = "acquire";

/// Arguments for the acquire command.
#[derive(Debug, Args)]
pub struct AcquireArgs {
    /// Lease target.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Lease duration in seconds, between 15 and 60.
    #[arg(long = "leaseduration", default_value_t = 60, allow_negative_numbers = true)]
    pub lease_duration: i64,

    /// Number of acquire attempts.
    #[arg(long = "retries", default_value_t = 1, allow_negative_numbers = true)]
    pub retries: i64,

    /// Seconds to wait between attempts, between 0 and 59.
    #[arg(long = "waittimesec", default_value_t = 0, allow_negative_numbers = true)]
    pub wait_time_sec: i64,
}

impl AcquireArgs {
    fn request(&self) -> Result<AcquireRequest, ArgumentError> {
        Ok(AcquireRequest {
            duration: LeaseDuration::from_secs(self.lease_duration)?,
            retries: RetryBudget::new(self.retries)?,
            wait: AcquireWait::from_secs(self.wait_time_sec)?,
        })
    }
}

/// Execute the acquire command.
///
/// # Errors
///
/// Returns an error if arguments are invalid or no token can be obtained.
/// Lease failures are reported in the result instead.
pub async fn execute(args: AcquireArgs, config: &Config) -> Result<OperationResult> {
    let target = args.target.target(config).map_err(invalid(NAME))?;
    let request = args.request().map_err(invalid(NAME))?;
    let cloud = args.target.cloud().map_err(invalid(NAME))?;
    let backend = connect(&args.target, &cloud, config).await?;

    let outcome = LeaseAcquirer::new(backend, Arc::new(TokioPause))
        .acquire(&target, request)
        .await;
    Ok(OperationResult::report(Operation::Acquire, &target, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::ExitCode;
    use crate::{Cli, Commands};
    use clap::Parser;

    fn parse(extra: &[&str]) -> AcquireArgs {
        let mut argv = vec!["azbloblease", "acquire"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Some(Commands::Acquire(args)) => args,
            other => panic!("expected acquire, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let request = parse(&[]).request().unwrap();
        assert_eq!(request, AcquireRequest::default());
    }

    #[test]
    fn checks_in_flag_order() {
        let err = parse(&["--leaseduration", "61", "--retries", "0"])
            .request()
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::LeaseDuration);

        let err = parse(&["--retries", "0", "--waittimesec", "60"])
            .request()
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::RetryCount);

        let err = parse(&["--waittimesec", "-1"]).request().unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::AcquireWait);
    }
}
