//! Smoke tests for the `flowgen` binary.
//!
//! Each test writes a manifest into a temp dir and runs one subcommand on it.

use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

const MANIFEST: &str = r#"
name = "mylib"

[[activity]]
name = "greeter"
settings = [{ fieldName = "greeting", fieldType = "string" }]
input = [{ fieldName = "AnInputString", fieldType = "string" }]
output = [{ fieldName = "when", fieldType = "datetime" }]

[[function]]
name = "add"
category = "math"
returnType = "int"
arguments = [{ argName = "a", argType = "int" }, { argName = "b", argType = "int" }]
"#;

fn flowgen() -> Command {
    Command::new(env!("CARGO_BIN_EXE_flowgen"))
}

fn write_manifest(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("extension.toml");
    std::fs::write(&path, content).expect("failed to write manifest");
    path
}

fn run(args: &[&str], manifest: &PathBuf) -> Output {
    flowgen()
        .args(args)
        .arg(manifest)
        .output()
        .expect("failed to execute flowgen")
}

// ── Help ─────────────────────────────────────────────────────────────────────

#[test]
fn binary_responds_to_help() {
    let output = flowgen().arg("--help").output().expect("failed to execute flowgen");
    assert!(output.status.success(), "flowgen --help should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("describe"));
    assert!(stdout.contains("render"));
    assert!(stdout.contains("check"));
}

// ── Subcommands ──────────────────────────────────────────────────────────────

#[test]
fn describe_prints_descriptors() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, MANIFEST);
    let output = run(&["describe"], &manifest);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let descriptors: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(descriptors[0]["ref"], "mylib/activity/greeter");
    assert_eq!(descriptors[0]["type"], "flowgen:activity");
    assert_eq!(descriptors[1]["ref"], "math.add");
    assert_eq!(descriptors[1]["return"], "int");
}

#[test]
fn render_prints_contract_and_function_source() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, MANIFEST);
    let output = run(&["render"], &manifest);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pub struct GreeterSettings {"));
    assert!(stdout.contains("pub struct GreeterInput {"));
    assert!(stdout.contains("pub AnInputString: String,"));
    assert!(stdout.contains("pub struct AddFunc;"));
    assert!(stdout.contains("let a: i64 = match"));
}

#[test]
fn render_keeps_type_names_apart_across_artifacts() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(
        &dir,
        r#"
name = "mylib"

[[activity]]
name = "greeter"
input = [{ fieldName = "who", fieldType = "string" }]

[[activity]]
name = "stamper"
input = [{ fieldName = "when", fieldType = "datetime" }]

[[trigger]]
name = "ticker"
output = [{ fieldName = "at", fieldType = "datetime" }]
"#,
    );
    let output = run(&["render"], &manifest);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for type_name in [
        "GreeterInput",
        "GreeterOutput",
        "StamperInput",
        "StamperOutput",
        "TickerSettings",
        "TickerHandlerSettings",
        "TickerOutput",
    ] {
        let declaration = format!("pub struct {type_name} {{");
        assert_eq!(stdout.matches(&declaration).count(), 1, "{type_name}");
    }
    assert!(!stdout.contains("pub struct Input {"));
}

#[test]
fn render_fails_when_artifact_names_share_a_type_name() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(
        &dir,
        "name = \"mylib\"\n[[activity]]\nname = \"greeter\"\n[[trigger]]\nname = \"Greeter\"\n",
    );
    let output = run(&["render"], &manifest);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GreeterSettings"), "stderr: {stderr}");
}

#[test]
fn check_lists_registered_references() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, MANIFEST);
    let output = run(&["check"], &manifest);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["mylib/activity/greeter", "math.add"]);
}

#[test]
fn check_fails_on_duplicate_artifacts() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(
        &dir,
        "name = \"mylib\"\n[[activity]]\nname = \"twice\"\n[[activity]]\nname = \"twice\"\n",
    );
    let output = run(&["check"], &manifest);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already registered"), "stderr: {stderr}");
}

#[test]
fn missing_manifest_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let output = run(&["describe"], &dir.path().join("absent.toml"));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load manifest"), "stderr: {stderr}");
}
