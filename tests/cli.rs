//! Smoke tests for the php-reflect binary.

use std::io::Write;
use std::process::Command;

fn write_fixture(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".php")
        .tempfile()
        .expect("create fixture");
    file.write_all(content.as_bytes()).expect("write fixture");
    file
}

#[test]
fn dumps_a_text_listing() {
    let fixture = write_fixture(
        "<?php
        function greet(string $name, $mark = '!') {}
        class Door { public function open(bool $wide = true) {} }
        ",
    );
    let output = Command::new(env!("CARGO_BIN_EXE_php-reflect"))
        .arg(fixture.path())
        .output()
        .expect("run php-reflect");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("function greet(string $name, $mark = '!')"));
    assert!(stdout.contains("class Door"));
    assert!(stdout.contains("method open(bool $wide = true)"));
}

#[test]
fn dumps_json() {
    let fixture = write_fixture("<?php function answer($n = 42) {}");
    let output = Command::new(env!("CARGO_BIN_EXE_php-reflect"))
        .arg("--json")
        .arg(fixture.path())
        .output()
        .expect("run php-reflect");

    assert!(output.status.success());
    let dump: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON dump");
    let functions = dump["functions"].as_array().unwrap();
    let answer = functions
        .iter()
        .find(|f| f["name"] == "answer")
        .expect("answer function in dump");
    assert_eq!(answer["parameters"][0]["name"], "n");
    assert_eq!(
        answer["parameters"][0]["default"]["evaluation"]["Value"],
        serde_json::json!(42)
    );
}

#[test]
fn parse_errors_fail_the_run_but_still_report() {
    let fixture = write_fixture("<?php function broken(int) {} function ok($a) {}");
    let output = Command::new(env!("CARGO_BIN_EXE_php-reflect"))
        .arg(fixture.path())
        .output()
        .expect("run php-reflect");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing parameter name"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("function ok($a)"));
}
