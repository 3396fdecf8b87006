//! End-to-end checks of the `patchy` binary: output and exit codes.

use std::path::PathBuf;
use std::process::{Command, Output};

fn patchy(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_patchy"))
        .args(args)
        .output()
        .expect("failed to launch patchy")
}

fn write_temp(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("patchy-cli-{}-{}", std::process::id(), name));
    std::fs::write(&path, bytes).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn bare_invocation_is_a_usage_error() {
    let output = patchy(&[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn run_halt_only_program() {
    let path = write_temp("halt.bin", &[0x00, 0x00]);

    let output = patchy(&["run", path.to_str().unwrap()]);
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("Program is 2 bytes long, 1 Instructions"));
    assert_eq!(out.matches("Dumping Patchy Core").count(), 1);
}

#[test]
fn run_long_program_reaches_halt() {
    let mut bytes = [0x50u8, 0x01].repeat(10_001);
    bytes.extend_from_slice(&[0x00, 0x00]);
    let path = write_temp("long.bin", &bytes);

    let output = patchy(&["run", path.to_str().unwrap()]);
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).matches("Dumping Patchy Core").count(), 1);
}

#[test]
fn run_rejects_odd_trailing_byte() {
    let path = write_temp("odd.bin", &[0x00, 0x00, 0x46]);

    let output = patchy(&["run", path.to_str().unwrap()]);
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
    assert!(!stdout(&output).contains("Dumping"));
}

#[test]
fn run_rejects_reserved_opcode() {
    let path = write_temp("reserved.bin", &[0x70, 0x00]);

    let output = patchy(&["run", path.to_str().unwrap()]);
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("reserved opcode"));
}

#[test]
fn run_over_cycle_limit_fails() {
    // ldl 0,1 then rst: never halts
    let path = write_temp("loop.bin", &[0x50, 0x01, 0x10, 0x00]);

    let output = patchy(&["run", path.to_str().unwrap(), "--max-cycles", "50"]);
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("stopped after 50 instructions"));
}

#[test]
fn run_missing_program_argument() {
    let output = patchy(&["run"]);
    assert_eq!(output.status.code(), Some(2));
}
