use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn make_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before UNIX_EPOCH")
        .as_nanos();
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("argentry-integ-{prefix}-{pid}-{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn argentry() -> Command {
    Command::new(env!("CARGO_BIN_EXE_argentry"))
}

const COPY_DECLARATION: &str = r#"{
    "program": "copy",
    "entries": [
        {"kind": "positional", "name": "sources", "help": "Files to copy", "multi": true, "type": "list<path>"},
        {"kind": "positional", "name": "dest", "help": "Destination", "type": "path"},
        {"kind": "keyword", "name": "jobs", "keys": "j,jobs", "help": "Parallel jobs", "default": "1", "type": "uint"},
        {"kind": "flag", "name": "force", "keys": "f,force", "help": "Overwrite existing files"},
        {"kind": "flag", "name": "verbose", "keys": "v,verbose", "help": "Chatty output"}
    ]
}"#;

fn write_declaration(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("declaration.json");
    fs::write(&path, content).expect("failed to write declaration");
    path
}

fn run_parse(schema: &Path, extra: &[&str], argv: &[&str]) -> Output {
    argentry()
        .arg("parse")
        .arg("--schema")
        .arg(schema)
        .args(extra)
        .arg("--")
        .args(argv)
        .output()
        .expect("failed to run argentry parse")
}

#[test]
fn help_works() {
    let out = argentry()
        .arg("--help")
        .output()
        .expect("failed to run argentry --help");
    assert!(
        out.status.success(),
        "argentry --help failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("parse") && stdout.contains("usage"),
        "unexpected help output:\n{stdout}"
    );
}

#[test]
fn parse_prints_json_values() {
    let dir = make_temp_dir("parse-json");
    let schema = write_declaration(&dir, COPY_DECLARATION);

    let out = run_parse(&schema, &["--json"], &["a.txt", "b.txt", "-fv", "-j", "4", "out/"]);
    assert!(
        out.status.success(),
        "argentry parse failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );

    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout is not JSON");
    assert_eq!(report["program"], "copy");
    assert_eq!(report["values"]["sources"], serde_json::json!(["a.txt", "b.txt"]));
    assert_eq!(report["values"]["dest"], "out/");
    assert_eq!(report["values"]["jobs"], 4);
    assert_eq!(report["values"]["force"], true);
    assert_eq!(report["values"]["verbose"], true);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_prints_plain_listing_with_defaults() {
    let dir = make_temp_dir("parse-plain");
    let schema = write_declaration(&dir, COPY_DECLARATION);

    let out = run_parse(&schema, &[], &["a.txt", "out/"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("-j,--jobs : 1"), "unexpected output:\n{stdout}");
    assert!(stdout.contains("-f,--force : false"), "unexpected output:\n{stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_help_flag_exits_successfully_despite_errors() {
    let dir = make_temp_dir("parse-help");
    let schema = write_declaration(&dir, COPY_DECLARATION);

    let out = run_parse(&schema, &[], &["--jobs", "many", "--help"]);
    assert!(out.status.success(), "help should exit 0: {}", out.status);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("Usage: copy arg_0... arg_1"), "{stdout}");
    assert!(stdout.contains("Overwrite existing files"), "{stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_reports_every_error_and_fails() {
    let dir = make_temp_dir("parse-errors");
    let schema = write_declaration(&dir, COPY_DECLARATION);

    let out = run_parse(&schema, &[], &["--jobs", "many"]);
    assert!(!out.status.success(), "expected failure");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("could not convert \"many\""), "{stderr}");
    assert!(stderr.contains("Argument missing: arg_1"), "{stderr}");
    assert!(out.stdout.is_empty());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_reports_unrecognized_keys_without_failing() {
    let dir = make_temp_dir("parse-unknown");
    let schema = write_declaration(&dir, COPY_DECLARATION);

    let out = run_parse(&schema, &["--json"], &["--bogus", "a", "b"]);
    assert!(out.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout is not JSON");
    assert_eq!(report["unrecognized"], serde_json::json!(["bogus"]));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unrecognised commandline argument"), "{stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn usage_renders_declaration() {
    let dir = make_temp_dir("usage");
    let schema = write_declaration(&dir, COPY_DECLARATION);

    let out = argentry()
        .arg("usage")
        .arg("--schema")
        .arg(&schema)
        .arg("--program")
        .arg("cp2")
        .output()
        .expect("failed to run argentry usage");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("Usage: cp2 "), "{stdout}");
    assert!(stdout.contains("Parallel jobs [default: 1]"), "{stdout}");
    assert!(stdout.contains("-h,--help"), "{stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_declaration_is_rejected() {
    let dir = make_temp_dir("bad-decl");
    let schema = write_declaration(&dir, r#"{"entries":[{"kind":"flag"}]}"#);

    let out = run_parse(&schema, &[], &[]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("need at least one key"), "{stderr}");

    let _ = fs::remove_dir_all(&dir);
}
