//! Workspace automation tasks.
//!
//! Run with: `cargo xtask <command>`

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

/// Library crates whose stdout belongs to the binary's JSON result.
const QUIET_CRATES: &[&str] = &["azlease-core", "azlease-azure"];

#[derive(Parser)]
#[command(name = "xtask", about = "azlease workspace automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks locally
    Ci,
    /// Validate workspace conventions
    Lint,
    /// Generate coverage report
    Coverage,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci => run_ci(),
        Commands::Lint => run_lint(),
        Commands::Coverage => run_coverage(),
    }
}

fn run_ci() -> Result<()> {
    println!("Running CI checks...\n");

    run_lint()?;
    run_cmd("cargo", &["fmt", "--check"])?;
    run_cmd("cargo", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
    run_cmd("cargo", &["test", "--workspace"])?;
    run_cmd("cargo", &["doc", "--workspace", "--no-deps"])?;

    println!("\nAll CI checks passed!");
    Ok(())
}

fn run_lint() -> Result<()> {
    println!("Validating workspace conventions...\n");

    for entry in std::fs::read_dir("crates").context("Failed to list crates/")? {
        let path = entry?.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !name.starts_with("azlease-") {
            anyhow::bail!("Crate '{name}' does not follow azlease-* naming");
        }

        let manifest = read(&path.join("Cargo.toml"))?;
        if !manifest.contains("[lints]\nworkspace = true") {
            anyhow::bail!("Crate '{name}' does not inherit workspace lints");
        }

        let lib = path.join("src/lib.rs");
        if lib.exists() && !read(&lib)?.contains("#![forbid(unsafe_code)]") {
            anyhow::bail!("Crate '{name}' does not forbid unsafe code");
        }

        if QUIET_CRATES.contains(&name.as_str()) {
            check_no_stdout(&name, &path.join("src"))?;
        }
    }

    println!("All conventions validated!");
    Ok(())
}

/// Rejects `println!` outside test modules.
fn check_no_stdout(name: &str, dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            check_no_stdout(name, &path)?;
            continue;
        }
        let source = read(&path)?;
        let body = source.split("#[cfg(test)]").next().unwrap_or_default();
        if body.contains("println!") {
            anyhow::bail!(
                "Crate '{name}' writes to stdout in {}; use tracing or stderr",
                path.display()
            );
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn run_coverage() -> Result<()> {
    run_cmd("cargo", &["llvm-cov", "--workspace", "--html"])?;
    println!("\nCoverage report: target/llvm-cov/html/index.html");
    Ok(())
}

fn run_cmd(cmd: &str, args: &[&str]) -> Result<()> {
    println!("$ {} {}", cmd, args.join(" "));
    let status = Command::new(cmd)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run: {} {}", cmd, args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("Command failed: {} {}", cmd, args.join(" "));
    }
    Ok(())
}
