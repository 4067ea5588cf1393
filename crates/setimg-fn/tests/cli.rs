//! The `setimg` binary: files, stdin/stdout and exit status

use pretty_assertions::assert_eq;
use serde_yaml::Value;
use setimg_test_utils::{config_map_value, resource_list_yaml, ManifestBuilder};
use std::io::Write as _;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn setimg() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_setimg"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn input_list(function_config: Option<Value>) -> String {
    let items = vec![
        ManifestBuilder::new("apps/v1", "Deployment", "web")
            .container("app", "nginx:1.20.2")
            .build_value(),
        config_map_value("image-rules", &[("name", "nginx"), ("newTag", "1.21.6")]),
    ];
    resource_list_yaml(&items, function_config)
}

fn rules_ref() -> Value {
    config_map_value("fn-config", &[("name", "image-rules")])
}

fn run_stdin(cmd: &mut Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn stdin_to_stdout() {
    let out = run_stdin(&mut setimg(), &input_list(Some(rules_ref())));
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let list: Value = serde_yaml::from_str(&stdout).unwrap();
    assert_eq!(
        list["items"][0]["spec"]["template"]["spec"]["containers"][0]["image"].as_str(),
        Some("nginx:1.21.6")
    );
    assert_eq!(
        list["results"][0]["message"].as_str(),
        Some("set image from nginx:1.20.2 to nginx:1.21.6")
    );
}

#[test]
fn files_and_fn_config_override() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.yaml");
    let output = dir.path().join("out.yaml");
    let fn_config = dir.path().join("fn.yaml");
    std::fs::write(&input, input_list(None)).unwrap();
    std::fs::write(&fn_config, serde_yaml::to_string(&rules_ref()).unwrap()).unwrap();

    let status = setimg()
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--fn-config")
        .arg(&fn_config)
        .arg("--parallel")
        .status()
        .unwrap();
    assert!(status.success());

    let list: Value = serde_yaml::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(list["functionConfig"]["metadata"]["name"].as_str(), Some("fn-config"));
    assert_eq!(list["results"].as_sequence().map(Vec::len), Some(1));
}

#[test]
fn json_output() {
    let out = run_stdin(setimg().args(["--format", "json"]), &input_list(Some(rules_ref())));
    assert!(out.status.success());
    let list: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(list["kind"], "ResourceList");
}

#[test]
fn config_error_exits_nonzero_with_output() {
    let bad: Value = serde_yaml::from_str("apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n").unwrap();
    let out = run_stdin(&mut setimg(), &input_list(Some(bad)));

    assert_eq!(out.status.code(), Some(1));
    let list: Value = serde_yaml::from_slice(&out.stdout).unwrap();
    assert_eq!(list["results"][0]["severity"].as_str(), Some("error"));
}

#[test]
fn fatal_error_writes_nothing() {
    let items = vec![ManifestBuilder::new("v1", "Pod", "p").container("app", "").build_value()];
    let config: Value = serde_yaml::from_str(
        "apiVersion: fn.kpt.dev/v1alpha1\nkind: SetImageFromConfigMap\nsetImageInfo:\n  name: nginx\n",
    )
    .unwrap();
    let out = run_stdin(&mut setimg(), &resource_list_yaml(&items, Some(config)));

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("image reference is empty"));
}

#[test]
fn malformed_input_fails() {
    let out = run_stdin(&mut setimg(), "kind: NotAList\n");
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to read ResourceList"));
}
