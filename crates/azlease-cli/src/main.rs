//! azbloblease - leader election based on Azure Blob Storage blob leases.
//!
//! The main entry point for the `azbloblease` binary.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;

use azlease_cli::exit::{CliError, ExitCode, exit_code_for};
use azlease_cli::{Cli, Commands, commands};
use azlease_core::{VERSION, init_logging};

fn main() {
    std::process::exit(run().code());
}

fn run() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success,
                _ => ExitCode::InvalidArgument,
            };
        }
    };
    let config = cli.config();
    init_logging(config.log_format, "warn");

    let Some(command) = cli.command else {
        print_usage();
        return ExitCode::InvalidArgument;
    };

    let outcome = match command {
        Commands::Version => {
            println!("{VERSION}");
            return ExitCode::Success;
        }
        Commands::CreateLeaseBlob(args) => block_on(commands::createleaseblob::execute(args, &config)),
        Commands::Acquire(args) => block_on(commands::acquire::execute(args, &config)),
        Commands::Renew(args) => block_on(commands::renew::execute(args, &config)),
    };

    match outcome.and_then(|result| result.to_json().context("Failed to serialize result")) {
        Ok(json) => {
            println!("{json}");
            ExitCode::Success
        }
        Err(e) => report(&e),
    }
}

fn block_on<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;
    runtime.block_on(future)
}

fn report(error: &anyhow::Error) -> ExitCode {
    let Some(cli_error) = error.downcast_ref::<CliError>() else {
        eprintln!("error: {error:#}");
        return exit_code_for(error);
    };

    match cli_error {
        CliError::Argument { command, source } => {
            eprintln!("{command}");
            eprintln!("{}: {source}", "error".red().bold());
            let mut cli = Cli::command();
            if let Some(sub) = cli.find_subcommand_mut(*command) {
                eprintln!("{}", sub.render_help());
            }
        }
        CliError::Authentication(_) => eprintln!("{cli_error}"),
    }
    exit_code_for(error)
}

fn print_usage() {
    let header = format!(
        "azbloblease - CLI tool to help on leader elections based on Azure Blob Storage blob leasing process - v{VERSION}"
    );
    eprintln!("{}", header.bold());
    eprintln!();
    eprintln!("{}", Cli::command().render_long_help());
    eprintln!("Outputs");
    eprintln!("    stdout - json result of createleaseblob, acquire and renew");
    eprintln!("    stderr - logs, renewal diagnostics and error messages");
}
