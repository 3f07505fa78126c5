//! Process exit codes and the errors that map onto them.
//!
//! Invocations that reach the engine always exit `0` and carry their status
//! in the printed result. Non-zero codes are reserved for failures before
//! the engine runs.

use azlease_azure::{CloudConfigError, CredentialError};
use azlease_core::ValidationError;

/// Exit code taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// A result was printed.
    Success = 0,
    /// Local failure unrelated to the input, such as a runtime that failed to start.
    Internal = 1,
    /// Unparseable arguments, unknown or missing subcommand.
    InvalidArgument = 100,
    /// `--resourcegroupname` missing.
    MissingResourceGroup = 110,
    /// `--accountname` missing.
    MissingAccountName = 120,
    /// `--container` missing.
    MissingContainer = 130,
    /// `--leaseduration` out of range.
    LeaseDuration = 140,
    /// `--leaseid` missing.
    MissingLeaseId = 150,
    /// `--subscriptionid` missing.
    MissingSubscription = 160,
    /// `--retries` below one or above `u32::MAX`.
    RetryCount = 170,
    /// Acquire `--waittimesec` out of range.
    AcquireWait = 180,
    /// Unknown `--environment`.
    InvalidCloud = 200,
    /// Cloud file given for a built-in cloud.
    CloudFileOnlyForCustomCloud = 210,
    /// `CUSTOMCLOUD` without a cloud file.
    CloudFileRequired = 220,
    /// Cloud file does not exist.
    CloudFileNotFound = 230,
    /// Cloud file unreadable or malformed.
    CloudFileInvalid = 240,
    /// No token could be obtained.
    Authentication = 300,
    /// `--iterations` below one or above `u32::MAX`.
    Iterations = 500,
    /// Renew `--waittimesec` out of range.
    RenewWait = 501,
}

impl ExitCode {
    /// Numeric process exit code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Input rejected before any network activity.
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    /// A required string flag is absent or blank.
    #[error("missing required argument --{flag}")]
    Missing {
        /// Flag name.
        flag: &'static str,
        /// Code to exit with.
        code: ExitCode,
    },

    /// A numeric flag is out of range.
    #[error(transparent)]
    Parameter(#[from] ValidationError),

    /// Cloud selection is invalid.
    #[error(transparent)]
    Cloud(#[from] CloudConfigError),
}

impl ArgumentError {
    /// Exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Missing { code, .. } => *code,
            Self::Parameter(e) => match e {
                ValidationError::LeaseDuration { .. } => ExitCode::LeaseDuration,
                ValidationError::RetryCount { .. } => ExitCode::RetryCount,
                ValidationError::AcquireWait { .. } => ExitCode::AcquireWait,
                ValidationError::IterationCount { .. } => ExitCode::Iterations,
                ValidationError::RenewWait { .. } => ExitCode::RenewWait,
                ValidationError::Empty { .. } => ExitCode::InvalidArgument,
            },
            Self::Cloud(e) => match e {
                CloudConfigError::UnknownEnvironment(_) => ExitCode::InvalidCloud,
                CloudConfigError::FileOnlyForCustom => ExitCode::CloudFileOnlyForCustomCloud,
                CloudConfigError::FileRequired => ExitCode::CloudFileRequired,
                CloudConfigError::FileNotFound { .. } => ExitCode::CloudFileNotFound,
                CloudConfigError::Read { .. } | CloudConfigError::Malformed { .. } => {
                    ExitCode::CloudFileInvalid
                }
            },
        }
    }
}

/// Failure that ends an invocation without a result.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid input for a subcommand.
    #[error("{source}")]
    Argument {
        /// Subcommand whose help is printed.
        command: &'static str,
        /// What was wrong.
        #[source]
        source: ArgumentError,
    },

    /// The eager token check failed.
    #[error("an error occurred while obtaining token credential: {0}")]
    Authentication(#[source] CredentialError),
}

impl CliError {
    /// Exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Argument { source, .. } => source.exit_code(),
            Self::Authentication(_) => ExitCode::Authentication,
        }
    }
}

/// Exit code for a failed invocation.
///
/// Anything that is not a [`CliError`] happened after the input was accepted
/// and maps to [`ExitCode::Internal`].
#[must_use]
pub fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    error
        .downcast_ref::<CliError>()
        .map_or(ExitCode::Internal, CliError::exit_code)
}
