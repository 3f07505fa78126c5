//! # azlease-cli
//!
//! Leader election on top of Azure Blob Storage leases.
//!
//! ## Commands
//!
//! - `azbloblease createleaseblob` - Create the blob used for leasing
//! - `azbloblease acquire` - Acquire a lease and print its id
//! - `azbloblease renew` - Keep a held lease alive
//! - `azbloblease version` - Print the version
//!
//! ## Output
//!
//! Every invocation that reaches Azure prints one JSON result on stdout and
//! exits `0`, whatever the result status. Logs, renewal diagnostics and
//! argument errors go to stderr.
//!
//! ## Configuration
//!
//! - `AZLEASE_LOG_FORMAT` - `pretty` (default) or `json`
//! - `RUST_LOG` - log filter (default: `warn`)
//! - `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` - service
//!   principal for the default credential chain

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod commands;
pub mod exit;

use azlease_core::{EngineConfig, LogFormat};
use clap::{Parser, Subcommand};

/// azbloblease - leader election based on Azure Blob Storage blob leases.
#[derive(Debug, Parser)]
#[command(name = "azbloblease")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "AZLEASE_LOG_FORMAT",
        value_enum,
        default_value = "pretty"
    )]
    pub log_format: LogFormatArg,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            log_format: self.log_format.into(),
            engine: EngineConfig::default(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Creates a blob to be used for the lease process.
    #[command(name = "createleaseblob")]
    CreateLeaseBlob(commands::createleaseblob::CreateLeaseBlobArgs),
    /// Acquires a lease.
    Acquire(commands::acquire::AcquireArgs),
    /// Renews a lease.
    Renew(commands::renew::RenewArgs),
    /// Prints the version.
    Version,
}

/// Log format flag values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable logs.
    #[default]
    Pretty,
    /// JSON logs.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Log output format.
    pub log_format: LogFormat,
    /// Engine settings.
    pub engine: EngineConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_acquire_flags() {
        let cli = Cli::parse_from([
            "azbloblease",
            "--log-format",
            "json",
            "acquire",
            "--subscriptionid",
            "sub",
            "--resourcegroupname",
            "rg",
            "--accountname",
            "acct",
            "--container",
            "Leases",
            "--leaseduration",
            "30",
            "--retries",
            "5",
            "--waittimesec",
            "2",
        ]);

        assert_eq!(cli.config().log_format, LogFormat::Json);
        let Some(Commands::Acquire(args)) = cli.command else {
            panic!("expected acquire");
        };
        assert_eq!(args.target.subscription_id.as_deref(), Some("sub"));
        assert_eq!(args.target.container.as_deref(), Some("Leases"));
        assert_eq!(args.target.environment, "AZUREPUBLICCLOUD");
        assert_eq!(args.lease_duration, 30);
        assert_eq!(args.retries, 5);
        assert_eq!(args.wait_time_sec, 2);
    }

    #[test]
    fn test_cli_renew_defaults() {
        let cli = Cli::parse_from(["azbloblease", "renew", "--leaseid", "abc"]);
        let Some(Commands::Renew(args)) = cli.command else {
            panic!("expected renew");
        };
        assert_eq!(args.lease_id.as_deref(), Some("abc"));
        assert_eq!(args.iterations, 20);
        assert_eq!(args.wait_time_sec, 30);
        assert!(args.target.blob_name.is_none());
    }

    #[test]
    fn test_cli_accepts_negative_numbers() {
        let cli = Cli::parse_from(["azbloblease", "acquire", "--waittimesec", "-1"]);
        let Some(Commands::Acquire(args)) = cli.command else {
            panic!("expected acquire");
        };
        assert_eq!(args.wait_time_sec, -1);
    }

    #[test]
    fn test_cli_without_subcommand() {
        let cli = Cli::parse_from(["azbloblease"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_identity_flags() {
        let cli = Cli::parse_from([
            "azbloblease",
            "createleaseblob",
            "--managed-identity-id",
            "client-id",
            "--use-system-managed-identity",
            "--custom-cloudconfig-file",
            "/tmp/cloud.json",
        ]);
        let Some(Commands::CreateLeaseBlob(args)) = cli.command else {
            panic!("expected createleaseblob");
        };
        assert_eq!(args.target.managed_identity_id.as_deref(), Some("client-id"));
        assert!(args.target.use_system_managed_identity);
        assert_eq!(
            args.target.custom_cloud_config_file.as_deref(),
            Some(std::path::Path::new("/tmp/cloud.json"))
        );
    }
}
