//! Argument validation through the real binary.
//!
//! Every case here fails before any credential or network call, so the tests
//! are hermetic.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_azbloblease"))
}

/// Runs the binary and returns `(exit_code, stdout, stderr)`.
fn run(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(bin())
        .args(args)
        .env_remove("AZURE_TENANT_ID")
        .env_remove("AZURE_CLIENT_ID")
        .env_remove("AZURE_CLIENT_SECRET")
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to spawn azbloblease");
    (
        output.status.code().expect("terminated by signal"),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

/// Exit codes above 255 are truncated to a byte on Unix.
fn os_code(code: i32) -> i32 {
    if cfg!(unix) { code & 0xff } else { code }
}

const TARGET: [&str; 8] = [
    "--subscriptionid",
    "00000000-0000-0000-0000-000000000000",
    "--resourcegroupname",
    "rg",
    "--accountname",
    "acct",
    "--container",
    "leases",
];

fn with_target(command: &str, extra: &[&str]) -> Vec<String> {
    std::iter::once(command)
        .chain(TARGET)
        .chain(extra.iter().copied())
        .map(str::to_string)
        .collect()
}

fn run_owned(args: &[String]) -> (i32, String, String) {
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    run(&refs)
}

#[test]
fn version_prints_crate_version() {
    let (code, stdout, _) = run(&["version"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn no_subcommand_prints_usage() {
    let (code, stdout, stderr) = run(&[]);
    assert_eq!(code, 100);
    assert!(stdout.is_empty());
    assert!(stderr.contains("azbloblease"));
    assert!(stderr.contains("createleaseblob"));
}

#[test]
fn unknown_subcommand_is_invalid_argument() {
    let (code, _, _) = run(&["release"]);
    assert_eq!(code, 100);
}

#[test]
fn missing_identity_arguments_in_order() {
    let (code, _, stderr) = run(&["createleaseblob"]);
    assert_eq!(code, 160);
    assert!(stderr.contains("createleaseblob"));

    let (code, _, _) = run(&["acquire", "--subscriptionid", "sub"]);
    assert_eq!(code, 110);

    let (code, _, _) = run(&[
        "acquire",
        "--subscriptionid",
        "sub",
        "--resourcegroupname",
        "rg",
    ]);
    assert_eq!(code, 120);

    let (code, _, _) = run(&[
        "renew",
        "--subscriptionid",
        "sub",
        "--resourcegroupname",
        "rg",
        "--accountname",
        "acct",
    ]);
    assert_eq!(code, 130);
}

#[test]
fn acquire_numeric_bounds() {
    let cases: [(&[&str], i32); 6] = [
        (&["--leaseduration", "14"], 140),
        (&["--leaseduration", "61"], 140),
        (&["--retries", "0"], 170),
        (&["--retries", "4294967296"], 170),
        (&["--waittimesec", "-1"], 180),
        (&["--waittimesec", "60"], 180),
    ];
    for (extra, expected) in cases {
        let (code, stdout, _) = run_owned(&with_target("acquire", extra));
        assert_eq!(code, os_code(expected), "acquire {extra:?}");
        assert!(stdout.is_empty());
    }
}

#[test]
fn renew_requires_lease_id_before_numbers() {
    let (code, _, _) = run_owned(&with_target("renew", &["--iterations", "0"]));
    assert_eq!(code, 150);
}

#[test]
fn renew_numeric_bounds() {
    let cases: [(&[&str], i32); 4] = [
        (&["--leaseid", "abc", "--iterations", "0"], 500),
        (&["--leaseid", "abc", "--iterations", "4294967296"], 500),
        (&["--leaseid", "abc", "--waittimesec", "0"], 501),
        (&["--leaseid", "abc", "--waittimesec", "60"], 501),
    ];
    for (extra, expected) in cases {
        let (code, _, _) = run_owned(&with_target("renew", extra));
        assert_eq!(code, os_code(expected), "renew {extra:?}");
    }
}

#[test]
fn cloud_environment_rules() {
    let (code, _, _) = run_owned(&with_target(
        "createleaseblob",
        &["--environment", "AZUREGERMANCLOUD"],
    ));
    assert_eq!(code, 200);

    let (code, _, _) = run_owned(&with_target(
        "createleaseblob",
        &["--custom-cloudconfig-file", "cloud.json"],
    ));
    assert_eq!(code, 210);

    let (code, _, _) = run_owned(&with_target(
        "createleaseblob",
        &["--environment", "customcloud"],
    ));
    assert_eq!(code, 220);

    let (code, _, _) = run_owned(&with_target(
        "createleaseblob",
        &[
            "--environment",
            "CUSTOMCLOUD",
            "--custom-cloudconfig-file",
            "/nonexistent/azlease/cloud.json",
        ],
    ));
    assert_eq!(code, 230);
}

#[test]
fn malformed_cloud_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let (code, _, stderr) = run_owned(&with_target(
        "acquire",
        &["--environment", "CUSTOMCLOUD", "--custom-cloudconfig-file", &path],
    ));
    assert_eq!(code, 240);
    assert!(stderr.contains("invalid custom cloud config file"));
}
