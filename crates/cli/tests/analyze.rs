use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn setup_project() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path().join("src");
    write(&root, "pkg/__init__.py", "");
    write(
        &root,
        "pkg/a.py",
        "\"\"\"Entry point.\"\"\"\nimport pkg.b as b\nfrom pkg.c import *\n\nb.bar()\nb.bar()\nb.bar()\nqux()\n",
    );
    write(&root, "pkg/b.py", "def bar():\n    return 1\n");
    write(&root, "pkg/c.py", "def qux():\n    return 2\n");
    write(&root, "pkg/tests/test_a.py", "import pkg.a\n");
    write(&root, "pkg/tests/__init__.py", "");
    temp
}

#[allow(deprecated)]
fn modview(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("modview").expect("binary");
    cmd.current_dir(workdir).arg("--quiet");
    cmd
}

fn run_json(workdir: &Path, args: &[&str]) -> Value {
    let output = modview(workdir).args(args).output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn analyze_json_reports_call_weights() {
    let temp = setup_project();
    let body = run_json(temp.path(), &["analyze", "src", "--format", "json", "--skip", "tests"]);

    assert_eq!(body["pkg.a"]["dependencies"]["pkg.b"], 3);
    assert_eq!(body["pkg.a"]["dependencies"]["pkg.c"], 1);
    assert_eq!(body["pkg.b"]["LOC"], 2);
    assert!(body.get("pkg.tests.test_a").is_none());
}

#[test]
fn settings_file_controls_aggregation() {
    let temp = setup_project();
    write(
        temp.path(),
        "settings.json",
        r#"{"skip_analyze": ["tests"], "depth": 1}"#,
    );

    let body = run_json(temp.path(), &["analyze", "src", "--format", "json"]);

    let object = body.as_object().unwrap();
    assert_eq!(object.keys().collect::<Vec<_>>(), vec!["pkg"]);
    assert_eq!(body["pkg"]["dependencies"], serde_json::json!({}));
}

#[test]
fn html_is_written_to_the_default_file() {
    let temp = setup_project();

    modview(temp.path())
        .args(["analyze", "src"])
        .assert()
        .success();

    let html = fs::read_to_string(temp.path().join("module_view.html")).unwrap();
    assert!(html.contains("vis.Network"));
    assert!(html.contains("\"id\":\"pkg.a\""));
}

#[test]
fn dot_output_goes_to_stdout() {
    let temp = setup_project();

    modview(temp.path())
        .args(["analyze", "src", "--format", "dot"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph {"))
        .stdout(predicate::str::contains("label=\"3\""));
}

#[test]
fn broken_file_fails_unless_skipped() {
    let temp = setup_project();
    write(&temp.path().join("src"), "pkg/broken.py", "def oops(:\n    pass\n");

    modview(temp.path())
        .args(["analyze", "src", "--format", "json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.py"));

    let body = run_json(
        temp.path(),
        &["analyze", "src", "--format", "json", "--skip-unparsable"],
    );
    assert_eq!(body["pkg.a"]["dependencies"]["pkg.b"], 3);
    assert!(body.get("pkg.broken").is_none());
}

#[test]
fn facts_dump_lists_closed_exports() {
    let temp = setup_project();
    write(&temp.path().join("src"), "pkg/d.py", "from pkg.c import *\n");

    let body = run_json(temp.path(), &["facts", "src"]);

    assert_eq!(body["pkg.d"]["exports"], serde_json::json!(["qux"]));
    assert_eq!(body["pkg.a"]["method_calls"]["b.bar"], 3);
    assert_eq!(body["pkg.a"]["LOC"], 6);
    assert_eq!(body["pkg"]["is_package"], true);
}

#[test]
fn render_rebuilds_from_a_document() {
    let temp = setup_project();
    let out = temp.path().join("deps.json");

    modview(temp.path())
        .args(["analyze", "src", "--format", "json", "--output"])
        .arg(&out)
        .assert()
        .success();

    modview(temp.path())
        .args(["render", "deps.json", "--format", "dot", "--output", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pkg.b"));
}

#[test]
fn missing_root_is_an_error() {
    let temp = tempdir().unwrap();

    modview(temp.path())
        .args(["analyze", "does-not-exist", "--format", "json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist"));
}
