//! End-to-end CLI integration tests
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "").unwrap();
        fs::write(
            dir.path().join("labels.json"),
            r#"{"0x401000": "main", "0x401008": "helper"}"#,
        )
        .unwrap();
        let program: Vec<u32> = (0x401000..0x401010).collect();
        fs::write(
            dir.path().join("hello.json"),
            serde_json::json!({ "program": program, "exit_code": 4 }).to_string(),
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn storage(&self) -> PathBuf {
        self.path("bps")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("emu-debug").unwrap();
        cmd.arg("--config").arg(self.path("config.toml"));
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn break_cmd(&self, args: &[&str]) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("break")
            .args(args)
            .arg("--session")
            .arg("hello")
            .arg("--storage-dir")
            .arg(self.storage());
        cmd
    }
}

fn stored(dir: &Path) -> String {
    fs::read_to_string(dir.join("hello.json")).unwrap()
}

#[test]
fn add_by_label_then_list() {
    let ws = Workspace::new();
    let labels = ws.path("labels.json");
    ws.break_cmd(&["add", "main", "--labels", labels.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Breakpoint set at"));

    assert_eq!(stored(&ws.storage()), r#"[{"address":4198400}]"#);

    ws.break_cmd(&["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0x00401000"));
}

#[test]
fn json_log_format_emits_structured_lines() {
    let ws = Workspace::new();
    ws.break_cmd(&["add", "401004", "-v", "--log-format", "json"])
        .assert()
        .success()
        .stderr(predicate::str::contains(r#""level":"DEBUG""#))
        .stderr(predicate::str::contains("Adding breakpoint 0x00401004"));
}

#[test]
fn add_by_hex_without_labels() {
    let ws = Workspace::new();
    ws.break_cmd(&["add", "401004", "--one-shot"]).assert().success();
    assert_eq!(stored(&ws.storage()), r#"[{"address":4198404,"oneShot":true}]"#);
}

#[test]
fn unresolvable_target_fails_without_writing() {
    let ws = Workspace::new();
    ws.break_cmd(&["add", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot resolve"));
    assert!(!ws.storage().join("hello.json").exists());
}

#[test]
fn toggle_and_remove() {
    let ws = Workspace::new();
    ws.break_cmd(&["add", "401004"]).assert().success();
    ws.break_cmd(&["toggle", "0x401004"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));
    assert_eq!(stored(&ws.storage()), r#"[{"address":4198404,"disabled":true}]"#);

    ws.break_cmd(&["remove", "401004"]).assert().success();
    assert_eq!(stored(&ws.storage()), "[]");

    ws.break_cmd(&["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No breakpoints set for hello"));
}

#[test]
fn toggle_missing_breakpoint_fails() {
    let ws = Workspace::new();
    ws.break_cmd(&["toggle", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No breakpoint at 0x00000010"));
}

#[test]
fn resolve_prints_address() {
    let ws = Workspace::new();
    let labels = ws.path("labels.json");
    ws.cmd()
        .args(["resolve", "helper", "--labels", labels.to_str().unwrap()])
        .assert()
        .success()
        .stdout("0x00401008\n");
}

#[test]
fn run_stops_at_persisted_breakpoint() {
    let ws = Workspace::new();
    ws.break_cmd(&["add", "401008"]).assert().success();

    let trace = ws.path("hello.json");
    let assert = ws
        .cmd()
        .arg("run")
        .arg("--trace")
        .arg(&trace)
        .arg("--storage-dir")
        .arg(ws.storage())
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], r#""Ok""#);

    let state: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(state["State"]["instruction_pointer"], 0x401008);
    assert_eq!(state["State"]["running"], false);
    assert_eq!(state["State"]["breakpoints"][0]["address"], 0x401008);
}

#[test]
fn run_script_runs_to_exit() {
    let ws = Workspace::new();
    let script = ws.path("script.jsonl");
    fs::write(
        &script,
        "# resolve, consume a one-shot, then finish\n\
         {\"AddBreakByName\": {\"name\": \"helper\"}}\n\
         {\"RunTo\": {\"address\": 4198404}}\n\
         {\"RemoveBreakpoint\": {\"address\": 4198408}}\n\
         \"Start\"\n",
    )
    .unwrap();
    let labels = ws.path("labels.json");

    let assert = ws
        .cmd()
        .arg("run")
        .arg("--trace")
        .arg(ws.path("hello.json"))
        .arg("--labels")
        .arg(&labels)
        .arg("--script")
        .arg(&script)
        .arg("--storage-dir")
        .arg(ws.storage())
        .assert()
        .success()
        .stderr(predicate::str::contains("program exited with code 4"));
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], r#"{"Resolved":4198408}"#);
    assert_eq!(lines.len(), 5);

    let state: serde_json::Value = serde_json::from_str(lines[4]).unwrap();
    assert_eq!(state["State"]["instruction_count"], 16);
    assert_eq!(stored(&ws.storage()), "[]");
}

#[test]
fn run_rejects_malformed_trace() {
    let ws = Workspace::new();
    let bad = ws.path("bad.json");
    fs::write(&bad, r#"{"program": [1, "two"]}"#).unwrap();
    ws.cmd()
        .arg("run")
        .arg("--trace")
        .arg(&bad)
        .arg("--storage-dir")
        .arg(ws.storage())
        .assert()
        .failure()
        .stderr(predicate::str::contains("program[1]"));
}
