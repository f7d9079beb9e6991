//! Exit status of the `keyledger` binary on a machine with no store settings

use keyledger_cli::{EXIT_CONFIG, EXIT_INVALID_INPUT};
use std::process::{Command, Output};

fn keyledger(args: &[&str]) -> Output {
    // Empty environment and a fresh working directory, so no .env is found
    let workdir = tempfile::tempdir().expect("Failed to create temp dir");
    Command::new(env!("CARGO_BIN_EXE_keyledger"))
        .args(args)
        .env_clear()
        .current_dir(workdir.path())
        .output()
        .expect("Failed to run keyledger")
}

#[test]
fn test_invalid_duration_without_config_is_invalid_input() {
    for args in [
        &["create", "abc"][..],
        &["create", "-5", "note"][..],
        &["create-package", "forever"][..],
    ] {
        let output = keyledger(args);
        assert_eq!(
            output.status.code(),
            Some(i32::from(EXIT_INVALID_INPUT)),
            "{:?}",
            args
        );
        assert!(output.stdout.is_empty());
        assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid input"));
    }
}

#[test]
fn test_valid_request_without_config_is_config_error() {
    let output = keyledger(&["create", "24", "trial"]);

    assert_eq!(output.status.code(), Some(i32::from(EXIT_CONFIG)));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration"));
}
