//! Runs the binary to check how it treats the command line.

use std::process::{Command, Stdio};

#[test]
fn test_arguments_are_logged_and_ignored() {
    let log = std::env::temp_dir().join(format!("barconsole-cli-{}.log", std::process::id()));

    let output = Command::new(env!("CARGO_BIN_EXE_barconsole"))
        .arg("--verbose")
        .env("BARCONSOLE_PROGRAM", "/nonexistent/bar-program")
        .env("BARCONSOLE_LOG", &log)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .unwrap();

    let contents = std::fs::read_to_string(&log).unwrap_or_default();
    std::fs::remove_file(&log).ok();

    // The session still fails (no bar program, maybe no tty), but not
    // because of the argument.
    assert_ne!(output.status.code(), Some(2));
    assert!(
        contents.contains("ignoring arguments [\"--verbose\"]"),
        "log was: {contents}"
    );
}
