mod common;

use common::TestProject;
use serde_json::json;
use serial_test::serial;
use stackflow::programs::{AksCluster, GkeCluster, ServerlessApi};
use stackflow_core::{
    ConfigStore, Kubeconfig, Program, ProgramContext, PropertyValue, ResourceGraph,
    ResourceOptions, StackError, StackName, run_program,
};
use stackflow_cloud_azure::resources::{ResourceGroup, ResourceGroupArgs};
use stackflow_core::Tags;

fn gcp_config() -> ConfigStore {
    ConfigStore::from_pairs([("gcp:project", "acme")]).unwrap()
}

fn run(program: &dyn Program, stack: &str, config: ConfigStore) -> ResourceGraph {
    run_program(program, StackName::new(stack).unwrap(), config).unwrap()
}

fn known_name(graph: &ResourceGraph, logical: &str, key: &str) -> String {
    graph
        .get(logical)
        .unwrap()
        .properties
        .known_str(key)
        .unwrap()
}

/// One property of a declaration whose other inputs may still be deferred
fn known_property(graph: &ResourceGraph, logical: &str, key: &str) -> serde_json::Value {
    graph
        .get(logical)
        .unwrap()
        .properties
        .get(key)
        .and_then(PropertyValue::known_value)
        .unwrap()
}

/// Generated physical names embed the stack verbatim
#[test]
fn test_names_embed_stack_verbatim() {
    let graph = run(&AksCluster, "dev", ConfigStore::new());
    assert_eq!(known_name(&graph, "rg", "resourceGroupName"), "rg-aks-dev");
    assert_eq!(known_name(&graph, "aksCluster", "resourceName"), "aks-dev");
    assert_eq!(known_name(&graph, "aksCluster", "dnsPrefix"), "aks-dev");
    assert_eq!(known_name(&graph, "keyVault", "vaultName"), "kv-dev");
    assert_eq!(known_name(&graph, "cosmosAccount", "accountName"), "cosmos-dev");

    let graph = run(&ServerlessApi, "qa", ConfigStore::new());
    assert_eq!(
        known_name(&graph, "serverless-api-handler", "name"),
        "serverless-api-qa-handler"
    );

    let graph = run(&GkeCluster, "dev", gcp_config());
    assert_eq!(known_name(&graph, "network", "name"), "gke-net-dev");
    assert_eq!(known_name(&graph, "subnet", "name"), "gke-subnet-dev");
    assert_eq!(known_name(&graph, "cluster", "name"), "gke-dev");
    assert_eq!(known_name(&graph, "db", "name"), "pg-dev");
}

/// Optional values fall back to documented defaults
#[test]
fn test_config_defaults() {
    let graph = run(&AksCluster, "dev", ConfigStore::new());
    assert_eq!(known_property(&graph, "rg", "location"), json!("eastus"));
    assert_eq!(
        known_property(&graph, "keyVault", "properties")["tenantId"],
        json!("TENANT_ID")
    );

    let graph = run(&GkeCluster, "dev", gcp_config());
    assert_eq!(known_property(&graph, "subnet", "region"), json!("us-central1"));
    assert_eq!(known_property(&graph, "cluster", "location"), json!("us-central1"));
    assert_eq!(known_property(&graph, "db", "region"), json!("us-central1"));
}

/// Values from a stack configuration file override the defaults
#[test]
#[serial]
fn test_stack_config_file_overrides_defaults() {
    let project = TestProject::new();
    project.write_stack_config(
        "dev",
        "config:\n  aks-cluster:location: westeurope\n  aks-cluster:tenantId: 1111\n",
    );

    temp_env::with_var_unset("STACKFLOW_CONFIG_PATH", || {
        let graph = run(&AksCluster, "dev", project.load_config("dev"));
        assert_eq!(known_property(&graph, "rg", "location"), json!("westeurope"));
        assert_eq!(
            known_property(&graph, "keyVault", "properties")["tenantId"],
            json!("1111")
        );
    });
}

/// STACKFLOW_CONFIG_PATH points at a configuration file outside the project
#[test]
#[serial]
fn test_config_path_env_override() {
    let project = TestProject::new();
    let elsewhere = TestProject::new();
    let path = elsewhere.path().join("custom.yaml");
    std::fs::write(&path, "config:\n  gcp:project: other\n  gcp:region: asia-east1\n").unwrap();

    temp_env::with_var("STACKFLOW_CONFIG_PATH", Some(&path), || {
        let graph = run(&GkeCluster, "dev", project.load_config("dev"));
        assert_eq!(known_property(&graph, "cluster", "location"), json!("asia-east1"));
        assert_eq!(
            known_property(&graph, "cluster", "workloadIdentityConfig")["workloadPool"],
            json!("other.svc.id.goog")
        );
    });
}

/// Two declarations with one logical name fail deterministically
#[test]
fn test_duplicate_logical_name_fails() {
    for _ in 0..3 {
        let mut ctx =
            ProgramContext::new("aks-cluster", StackName::new("dev").unwrap(), ConfigStore::new());
        let args = || ResourceGroupArgs {
            resource_group_name: "rg-aks-dev".into(),
            location: "eastus".into(),
            tags: Tags::new(),
        };
        ResourceGroup::new(&mut ctx, "rg", args(), ResourceOptions::default()).unwrap();
        let err = ResourceGroup::new(&mut ctx, "rg", args(), ResourceOptions::default())
            .unwrap_err();
        assert!(matches!(err, StackError::DuplicateDeclaration { .. }));
    }
}

/// A malformed literal name aborts the program run
#[test]
fn test_invalid_resource_group_name_aborts() {
    let err = run_program(
        &AksCluster,
        StackName::new("dev.").unwrap(),
        ConfigStore::new(),
    );
    // `rg-aks-dev.` ends in a period
    assert!(matches!(err, Err(StackError::InvalidName { .. })));
}

/// Exports of the bundled programs
#[test]
fn test_program_exports() {
    let graph = run(&ServerlessApi, "dev", ConfigStore::new());
    let exports: Vec<&str> = graph.exports().keys().map(String::as_str).collect();
    assert_eq!(exports, ["api_url", "lambda_function_name", "region", "table_name"]);

    let graph = run(&GkeCluster, "dev", gcp_config());
    let exports: Vec<&str> = graph.exports().keys().map(String::as_str).collect();
    assert_eq!(
        exports,
        [
            "clusterEndpoint",
            "clusterName",
            "dbConnectionName",
            "kubeconfig",
            "networkName",
            "subnetworkName"
        ]
    );
}

/// The kubeconfig parses back with a single context for the cluster
#[test]
fn test_gke_kubeconfig_structure() {
    use std::collections::HashMap;

    let graph = run(&GkeCluster, "dev", gcp_config());
    let cluster = graph.get("cluster").unwrap();
    let mut outputs = HashMap::new();
    outputs.insert(
        cluster.urn.clone(),
        json!({
            "name": "gke-dev",
            "endpoint": "34.70.1.2",
            "masterAuth": { "clusterCaCertificate": "Q0VSVA==" },
        }),
    );

    let document = graph.exports()["kubeconfig"].resolve(&outputs).unwrap();
    let kubeconfig = Kubeconfig::parse(document.as_str().unwrap()).unwrap();
    assert_eq!(kubeconfig.contexts.len(), 1);
    assert_eq!(kubeconfig.contexts[0].name, "acme_us-central1_gke-dev");
    kubeconfig.validate("acme_us-central1_gke-dev").unwrap();
}
