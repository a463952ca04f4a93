use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(relative)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("schemac-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn schemac(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_schemac"));
    command.current_dir(dir).env("RUST_LOG", "warn");
    command
}

#[test]
fn compiles_fixture_to_text_and_json() {
    let dir = scratch_dir("petstore");
    let input = dir.join("petstore.yaml");
    fs::copy(repo_path("fixtures/petstore.yaml"), &input).expect("copy fixture");

    let status = schemac(&dir)
        .arg("--raw")
        .arg(&input)
        .status()
        .expect("run schemac");
    assert!(status.success());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("petstore.json")).expect("json output"))
            .expect("parse json output");
    assert_eq!(json["info"]["title"], "Swagger Petstore");
    assert_eq!(
        json["paths"]["path"][0]["name"],
        serde_json::json!("/pets")
    );

    let text = fs::read_to_string(dir.join("petstore.text")).expect("text output");
    assert!(text.starts_with("swagger: \"2.0\"\n"));
    assert!(text.contains("info {\n  title: \"Swagger Petstore\"\n"));

    let raw = fs::read_to_string(dir.join("petstore.raw")).expect("raw output");
    assert!(raw.starts_with("mapping ("));
}

#[test]
fn dangling_reference_fails_the_run() {
    let dir = scratch_dir("dangling");
    let text = fs::read_to_string(repo_path("fixtures/petstore.yaml"))
        .expect("fixture")
        .replace("#/responses/Error", "#/responses/Missing");
    let input = dir.join("broken.yaml");
    fs::write(&input, text).expect("write input");

    let status = schemac(&dir)
        .arg("--errors")
        .arg(&input)
        .status()
        .expect("run schemac");
    assert!(!status.success());
    assert!(!dir.join("broken.json").exists());

    let errors = fs::read_to_string(dir.join("broken.errors")).expect("errors output");
    assert!(errors.contains("[unresolved_reference]"));
    assert!(errors.contains("#/responses/Missing"));

    let status = schemac(&dir)
        .arg("--keep-refs")
        .arg(&input)
        .status()
        .expect("run schemac");
    assert!(status.success());
}

#[test]
fn lists_bundled_classes() {
    let dir = scratch_dir("classes");
    let output = schemac(&dir)
        .arg("--list-classes")
        .output()
        .expect("run schemac");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout.lines().collect();
    assert!(names.contains(&"Document"));
    assert!(names.contains(&"ParametersItem"));
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}
