mod common;

use common::TestProject;
use serde_json::{Value, json};
use stackflow::local_engine;
use stackflow::programs::{AksCluster, GkeCluster, ServerlessApi};
use stackflow_cloud::{CloudError, StepOp};
use stackflow_core::{
    ConfigStore, Kubeconfig, Program, ProgramContext, Result, StackName, StackReference,
    run_program,
};

async fn deploy(
    project: &TestProject,
    program: &dyn Program,
    stack: &str,
    config: ConfigStore,
) -> stackflow_cloud::UpResult {
    let engine = local_engine(&project.path(), &config);
    let graph = run_program(program, StackName::new(stack).unwrap(), config).unwrap();
    engine.up(&graph).await.unwrap()
}

fn gcp_config(extra: &[(&str, &str)]) -> ConfigStore {
    let mut pairs = vec![("gcp:project", "acme")];
    pairs.extend_from_slice(extra);
    ConfigStore::from_pairs(pairs).unwrap()
}

/// Reads every export of `serverless-api/dev` through a stack reference
struct ExportMirror;

impl Program for ExportMirror {
    fn name(&self) -> &str {
        "mirror"
    }

    fn description(&self) -> &str {
        "re-exports another stack"
    }

    fn run(&self, ctx: &mut ProgramContext) -> Result<()> {
        let source = StackReference::new(ctx, "organization/serverless-api/dev")?;
        for name in ["api_url", "table_name", "lambda_function_name", "region"] {
            ctx.export(name, source.get_output(name))?;
        }
        ctx.export("missing", source.get_output("does_not_exist"))?;
        Ok(())
    }
}

#[tokio::test]
async fn test_serverless_api_deploys() {
    let project = TestProject::new();
    let result = deploy(&project, &ServerlessApi, "dev", ConfigStore::new()).await;

    assert_eq!(result.operation.steps_by_op(StepOp::Create).len(), 7);
    assert_eq!(result.outputs["table_name"], json!("serverless-api-dev-items"));
    assert_eq!(
        result.outputs["lambda_function_name"],
        json!("serverless-api-dev-handler")
    );
    assert_eq!(result.outputs["region"], json!("us-east-1"));
    let url = result.outputs["api_url"].as_str().unwrap();
    assert!(url.starts_with("https://"));
    assert!(url.ends_with(".execute-api.us-east-1.amazonaws.com/dev/"));
    assert!(project.state_file("serverless-api", "dev").exists());
}

#[tokio::test]
async fn test_exports_round_trip_through_stack_reference() {
    let project = TestProject::new();
    let source = deploy(&project, &ServerlessApi, "dev", ConfigStore::new()).await;
    let mirror = deploy(&project, &ExportMirror, "dev", ConfigStore::new()).await;

    for name in ["api_url", "table_name", "lambda_function_name", "region"] {
        assert_eq!(mirror.outputs[name], source.outputs[name], "export {}", name);
    }
    assert_eq!(mirror.outputs["missing"], Value::Null);
}

#[tokio::test]
async fn test_second_up_is_unchanged() {
    let project = TestProject::new();
    deploy(&project, &AksCluster, "dev", ConfigStore::new()).await;
    let second = deploy(&project, &AksCluster, "dev", ConfigStore::new()).await;

    assert!(!second.operation.has_changes());
    assert_eq!(second.operation.steps_by_op(StepOp::Same).len(), 4);
    assert_eq!(
        second.outputs["kubeconfig"],
        json!("az aks get-credentials --resource-group rg-aks-dev --name aks-dev")
    );
}

#[tokio::test]
async fn test_config_change_updates_resources() {
    let project = TestProject::new();
    deploy(&project, &AksCluster, "dev", ConfigStore::new()).await;
    let config = ConfigStore::from_pairs([("aks-cluster:location", "westus2")]).unwrap();
    let second = deploy(&project, &AksCluster, "dev", config).await;

    // location flows from the resource group into every other resource
    assert_eq!(second.operation.steps_by_op(StepOp::Update).len(), 4);
}

#[tokio::test]
async fn test_gke_kubeconfig_is_valid() {
    let project = TestProject::new();
    let result = deploy(&project, &GkeCluster, "dev", gcp_config(&[])).await;

    let document = result.outputs["kubeconfig"].as_str().unwrap();
    let kubeconfig = Kubeconfig::parse(document).unwrap();
    kubeconfig.validate("acme_us-central1_gke-dev").unwrap();
    assert_eq!(kubeconfig.contexts.len(), 1);
    assert_eq!(
        kubeconfig.clusters[0].cluster.server,
        format!("https://{}", result.outputs["clusterEndpoint"].as_str().unwrap())
    );
    assert_eq!(result.outputs["dbConnectionName"], json!("acme:us-central1:pg-dev"));
}

#[tokio::test]
async fn test_gke_reuses_network_of_another_stack() {
    let project = TestProject::new();
    deploy(&project, &GkeCluster, "shared", gcp_config(&[])).await;

    let config = gcp_config(&[("gke-cluster:networkStack", "organization/gke-cluster/shared")]);
    let result = deploy(&project, &GkeCluster, "dev", config).await;
    assert_eq!(result.outputs["networkName"], json!("gke-net-shared"));
    assert_eq!(result.outputs["subnetworkName"], json!("gke-subnet-shared"));
}

#[tokio::test]
async fn test_missing_network_stack_fails() {
    let project = TestProject::new();
    let config = gcp_config(&[("gke-cluster:networkStack", "organization/gke-cluster/nowhere")]);
    let engine = local_engine(&project.path(), &config);
    let graph = run_program(&GkeCluster, StackName::new("dev").unwrap(), config).unwrap();

    let err = engine.up(&graph).await.unwrap_err();
    assert!(matches!(err, CloudError::StackNotFound(_)));
}

#[tokio::test]
async fn test_production_stack_cannot_be_destroyed() {
    let project = TestProject::new();
    deploy(&project, &GkeCluster, "production", gcp_config(&[])).await;

    let engine = local_engine(&project.path(), &ConfigStore::new());
    let err = engine
        .destroy("gke-cluster", &StackName::new("production").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, CloudError::ProtectedResource(_)));
}

#[tokio::test]
async fn test_destroy_clears_outputs() {
    let project = TestProject::new();
    deploy(&project, &ServerlessApi, "dev", ConfigStore::new()).await;

    let engine = local_engine(&project.path(), &ConfigStore::new());
    let operation = engine
        .destroy("serverless-api", &StackName::new("dev").unwrap())
        .await
        .unwrap();
    assert_eq!(operation.steps_by_op(StepOp::Delete).len(), 7);

    let outputs = engine
        .stack_outputs(&"organization/serverless-api/dev".parse().unwrap())
        .await
        .unwrap();
    assert!(outputs.is_empty());
}
