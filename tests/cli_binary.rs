//! Runs the `cts-harness` binary and checks what reaches stderr.

#![cfg(feature = "cli")]

use std::path::Path;
use std::process::{Command, Output};

fn harness(dir: &Path, args: &[&str], vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cts-harness"));
    cmd.current_dir(dir).args(args).env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("CTS_HARNESS_") {
            cmd.env_remove(key);
        }
    }
    cmd.envs(vars.iter().copied());
    cmd.output().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_invalid_env_override_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = harness(dir.path(), &["--list"], &[("CTS_HARNESS_THREADS", "many")]);

    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("CTS_HARNESS_THREADS=many"), "{err}");
}

#[test]
fn test_verbose_flag_lists_active_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let output = harness(dir.path(), &["-v", "--list"], &[("CTS_HARNESS_TIMEOUT", "7")]);

    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("env override CTS_HARNESS_TIMEOUT=7"), "{err}");
}

#[test]
fn test_verbose_from_config_file_raises_log_level() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cts-harness.toml"), "verbose = true\n").unwrap();
    let output = harness(dir.path(), &["--list"], &[("CTS_HARNESS_TIMEOUT", "7")]);

    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("env override CTS_HARNESS_TIMEOUT=7"), "{err}");
}

#[test]
fn test_quiet_run_hides_active_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let output = harness(dir.path(), &["--list"], &[("CTS_HARNESS_TIMEOUT", "7")]);

    assert!(output.status.success());
    assert!(!stderr(&output).contains("env override"));
}

#[test]
fn test_unknown_exact_name_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = harness(dir.path(), &["--exact", "no_such_test"], &[]);

    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.contains("error: No registered test named 'no_such_test'"), "{err}");
    assert!(err.contains("note: no tests were run; check cts-harness.toml"), "{err}");
}
