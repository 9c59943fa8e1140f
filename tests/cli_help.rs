use std::process::Command;

#[test]
fn test_help_mentions_config_files() {
    let bin = env!("CARGO_BIN_EXE_beam");

    let output = Command::new(bin).arg("--help").output().unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("beam.json, beam.toml or beam.yaml"),
        "help output should mention the config file names; got:\n{}",
        stdout
    );
    assert!(stdout.contains("up"));
    assert!(stdout.contains("down"));
}

#[test]
fn test_up_help_lists_transfer_flags() {
    let bin = env!("CARGO_BIN_EXE_beam");

    let output = Command::new(bin).args(["up", "--help"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--remote",
        "--branch",
        "--working-copy",
        "--dry-run",
        "--delete",
        "--no-checksum",
        "--exportdir",
        "--yes",
    ] {
        assert!(stdout.contains(flag), "missing {flag} in:\n{stdout}");
    }
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    let bin = env!("CARGO_BIN_EXE_beam");

    let output = Command::new(bin).output().unwrap();

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}
