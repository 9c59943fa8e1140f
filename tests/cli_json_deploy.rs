#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

fn fake_rsync(bin_dir: &Path) {
    let script = bin_dir.join("rsync");
    fs::write(
        &script,
        "#!/bin/sh\n\
         echo \"args: $*\" >&2\n\
         echo 'sending incremental file list'\n\
         echo '<f+++++++++ index.php'\n\
         echo 'cd+++++++++ assets/'\n\
         echo '<fcs.p..... assets/app.css'\n\
         exit 0\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn test_dry_run_emits_ndjson_event_stream() {
    let dir = tempdir().unwrap();
    let bin_dir = dir.path().join("bin");
    fs::create_dir(&bin_dir).unwrap();
    fake_rsync(&bin_dir);

    let site = dir.path().join("site");
    fs::create_dir(&site).unwrap();
    fs::write(
        site.join("beam.json"),
        r#"{
  "servers": {
    "staging": { "host": "staging.example.com", "user": "deploy", "webroot": "/var/www" }
  },
  "commands": [
    { "phase": "post", "location": "local", "command": "echo built" }
  ]
}"#,
    )
    .unwrap();

    let path = format!(
        "{}:{}",
        bin_dir.display(),
        std::env::var("PATH").unwrap_or_default()
    );
    let output = Command::new(env!("CARGO_BIN_EXE_beam"))
        .current_dir(&site)
        .env("PATH", path)
        .args(["up", "--remote", "staging", "--working-copy", "--dry-run", "--json"])
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "beam failed:\nstdout:\n{stdout}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let events: Vec<Value> = stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let names: Vec<&str> = events.iter().filter_map(|e| e["event"].as_str()).collect();

    assert_eq!(names.first(), Some(&"start"));
    assert_eq!(names.last(), Some(&"complete"));
    let transfer = names.iter().position(|n| *n == "transfer_start").unwrap();
    let post = names.iter().position(|n| *n == "phase_start").unwrap();
    assert!(transfer < post, "post commands must follow the transfer: {names:?}");

    assert!(events
        .iter()
        .any(|e| e["event"] == "output" && e["line"] == "built"));
    assert!(events
        .iter()
        .any(|e| e["event"] == "output" && e["line"] == "sending incremental file list"));

    let complete = events.last().unwrap();
    assert_eq!(complete["dry_run"], true);
    assert_eq!(complete["total"], 3);
    assert_eq!(complete["counts"]["sent"], 2);
    assert_eq!(complete["counts"]["created"], 1);
}
