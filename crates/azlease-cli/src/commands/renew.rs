//! Renew command - stay leader for a fixed number of iterations.

use std::sync::Arc;

use anyhow::Result;
use azlease_core::{
    IterationCount, LeaseRenewer, LeaseToken, Operation, OperationResult, RenewRequest, RenewWait,
    StderrDiagnostics, TokioPause,
};
use clap::Args;

use super::common::{TargetArgs, connect, invalid};
use crate::Config;
use crate::exit::{ArgumentError, ExitCode};

/// Subcommand name, used for help output.
pub const NAME: &str = "renew";

/// Arguments for the renew command.
#[derive(Debug, Args)]
pub struct RenewArgs {
    /// Lease target.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Lease id returned by acquire.
    #[arg(long = "leaseid")]
    pub lease_id: Option<String>,

    /// Number of renewals.
    #[arg(long = "iterations", default_value_t = 20, allow_negative_numbers = true)]
    pub iterations: i64,

    /// Seconds to wait after each renewal, between 1 and 59. Ideally half
    /// the lease duration.
    #[arg(long = "waittimesec", default_value_t = 30, allow_negative_numbers = true)]
    pub wait_time_sec: i64,
}

impl RenewArgs {
    fn token(&self) -> Result<LeaseToken, ArgumentError> {
        self.lease_id
            .as_deref()
            .and_then(|id| id.parse().ok())
            .ok_or(ArgumentError::Missing {
                flag: "leaseid",
                code: ExitCode::MissingLeaseId,
            })
    }

    fn request(&self) -> Result<RenewRequest, ArgumentError> {
        Ok(RenewRequest {
            iterations: IterationCount::new(self.iterations)?,
            wait: RenewWait::from_secs(self.wait_time_sec)?,
        })
    }
}

/// Execute the renew command.
///
/// # Errors
///
/// Returns an error if arguments are invalid or no token can be obtained.
/// Renewal failures are reported in the result instead.
pub async fn execute(args: RenewArgs, config: &Config) -> Result<OperationResult> {
    let target = args.target.target(config).map_err(invalid(NAME))?;
    let token = args.token().map_err(invalid(NAME))?;
    let request = args.request().map_err(invalid(NAME))?;
    let cloud = args.target.cloud().map_err(invalid(NAME))?;
    let backend = connect(&args.target, &cloud, config).await?;

    let outcome = LeaseRenewer::new(backend, Arc::new(TokioPause), Arc::new(StderrDiagnostics))
        .renew(&target, &token, request)
        .await;
    Ok(OperationResult::report(Operation::Renew, &target, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Commands};
    use clap::Parser;

    fn parse(extra: &[&str]) -> RenewArgs {
        let mut argv = vec!["azbloblease", "renew"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Some(Commands::Renew(args)) => args,
            other => panic!("expected renew, got {other:?}"),
        }
    }

    #[test]
    fn blank_lease_id_is_missing() {
        let err = parse(&["--leaseid", "  "]).token().unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::MissingLeaseId);
        assert!(parse(&[]).token().is_err());
    }

    #[test]
    fn lease_id_is_trimmed() {
        let token = parse(&["--leaseid", " 5e1c2a40-0000-4000-8000-000000000000 "])
            .token()
            .unwrap();
        assert_eq!(token.as_str(), "5e1c2a40-0000-4000-8000-000000000000");
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        let err = parse(&["--iterations", "0"]).request().unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::Iterations);

        let err = parse(&["--waittimesec", "0"]).request().unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::RenewWait);

        let err = parse(&["--waittimesec", "60"]).request().unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::RenewWait);
    }
}
