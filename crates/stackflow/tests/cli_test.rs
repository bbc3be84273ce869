#![allow(deprecated)] // Command::cargo_bin

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

fn stackflow() -> Command {
    let mut cmd = Command::cargo_bin("stackflow").unwrap();
    cmd.env_remove("STACKFLOW_STACK")
        .env_remove("STACKFLOW_CONFIG_PATH");
    cmd
}

#[test]
fn test_cli_help() {
    stackflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("graph"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("outputs"))
        .stdout(predicate::str::contains("destroy"));
}

#[test]
fn test_list_programs() {
    stackflow()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("aks-cluster"))
        .stdout(predicate::str::contains("gke-cluster"))
        .stdout(predicate::str::contains("serverless-api"));
}

#[test]
fn test_up_help_mentions_stack_env() {
    stackflow()
        .args(["up", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--stack"))
        .stdout(predicate::str::contains("STACKFLOW_STACK"));
}

#[test]
fn test_graph_requires_stack() {
    let project = TestProject::new();
    stackflow()
        .arg("--root")
        .arg(project.path())
        .args(["graph", "aks-cluster"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No stack selected"));
}

#[test]
fn test_graph_prints_json() {
    let project = TestProject::new();
    let output = stackflow()
        .arg("--root")
        .arg(project.path())
        .args(["graph", "aks-cluster"])
        .env("STACKFLOW_STACK", "dev")
        .output()
        .unwrap();
    assert!(output.status.success());

    let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(graph["stack"], "dev");
    assert_eq!(graph["resources"][0]["name"], "rg");
    assert_eq!(
        graph["resources"][0]["properties"]["resourceGroupName"],
        "rg-aks-dev"
    );
}

#[test]
fn test_unknown_program() {
    stackflow()
        .args(["graph", "eks-cluster", "-s", "dev"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown program"));
}

#[test]
fn test_up_then_outputs() {
    let project = TestProject::new();
    project.write_stack_config("dev", "config:\n  aws:region: eu-west-1\n");

    stackflow()
        .arg("--root")
        .arg(project.path())
        .args(["up", "serverless-api", "-s", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7 created"))
        .stdout(predicate::str::contains("serverless-api-dev-items"));

    let output = stackflow()
        .arg("--root")
        .arg(project.path())
        .args(["outputs", "organization/serverless-api/dev", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let outputs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outputs["region"], "eu-west-1");
    assert_eq!(outputs["table_name"], "serverless-api-dev-items");
}

#[test]
fn test_outputs_of_unknown_stack() {
    let project = TestProject::new();
    stackflow()
        .arg("--root")
        .arg(project.path())
        .args(["outputs", "organization/serverless-api/nowhere"])
        .assert()
        .failure();
}

#[test]
fn test_outputs_reference_cannot_leave_state_dir() {
    let project = TestProject::new();
    std::fs::create_dir_all(project.path().join(".stackflow/stacks")).unwrap();
    std::fs::write(
        project.path().join("dev.json"),
        r#"{"version":1,"project":"x","stack":"dev","updated_at":"2024-01-01T00:00:00Z","resources":[],"outputs":{"leak":"outside"}}"#,
    )
    .unwrap();

    stackflow()
        .arg("--root")
        .arg(project.path())
        .args(["outputs", "../../dev", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("leak").not())
        .stderr(predicate::str::contains("invalid stack reference"));
}

#[test]
fn test_destroy_requires_confirmation() {
    let project = TestProject::new();
    stackflow()
        .arg("--root")
        .arg(project.path())
        .args(["destroy", "serverless-api", "-s", "dev"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}
