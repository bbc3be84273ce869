//! Kubeconfig documents for GKE clusters

use crate::container::Cluster;
use serde_json::Value;
use stackflow_core::{ClusterAccess, ExecConfig, Output, render_kubeconfig};

pub const GKE_AUTH_PLUGIN: &str = "gke-gcloud-auth-plugin";
pub const EXEC_API_VERSION: &str = "client.authentication.k8s.io/v1beta1";

/// Context name `gcloud container clusters get-credentials` would write
pub fn gke_context_name(project: &str, location: &str, cluster: &str) -> String {
    format!("{}_{}_{}", project, location, cluster)
}

pub fn gke_exec_config() -> ExecConfig {
    ExecConfig {
        api_version: EXEC_API_VERSION.to_string(),
        command: GKE_AUTH_PLUGIN.to_string(),
        args: Vec::new(),
        install_hint: Some(format!(
            "Install {} for use with kubectl by following \
             https://cloud.google.com/kubernetes-engine/docs/how-to/cluster-access-for-kubectl#install_plugin",
            GKE_AUTH_PLUGIN
        )),
        provide_cluster_info: true,
    }
}

/// Kubeconfig for `cluster`, available once its endpoint and CA are known
pub fn gke_kubeconfig(project: &str, location: &str, cluster: &Cluster) -> Output<String> {
    let project = project.to_string();
    let location = location.to_string();
    Output::<Value>::all([
        cluster.name().into_expr(),
        cluster.endpoint().into_expr(),
        cluster.cluster_ca_certificate().into_expr(),
    ])
    .try_apply(move |values: Vec<Value>| {
        let field = |index: usize, what: &str| {
            values
                .get(index)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| format!("cluster {} is not available", what))
        };
        let name = field(0, "name")?;
        let endpoint = field(1, "endpoint")?;
        let ca = field(2, "CA certificate")?;

        let access = ClusterAccess {
            context_name: gke_context_name(&project, &location, &name),
            server: format!("https://{}", endpoint),
            certificate_authority_data: ca,
            exec: gke_exec_config(),
        };
        render_kubeconfig(&access).map_err(|e| e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ClusterArgs, ReleaseChannel};
    use serde_json::json;
    use stackflow_core::{
        ConfigStore, Kubeconfig, ProgramContext, Resource, ResourceOptions, StackName, Tags,
    };
    use std::collections::HashMap;

    fn cluster(ctx: &mut ProgramContext) -> Cluster {
        Cluster::new(
            ctx,
            "cluster",
            ClusterArgs {
                name: "gke-dev".into(),
                location: "us-central1".into(),
                network: "net".into(),
                subnetwork: "subnet".into(),
                remove_default_node_pool: true,
                initial_node_count: 1,
                release_channel: ReleaseChannel::Regular,
                workload_pool: None,
                ip_allocation_policy: None,
                deletion_protection: false,
                resource_labels: Tags::new(),
            },
            ResourceOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_context_name() {
        assert_eq!(
            gke_context_name("acme", "us-central1", "gke-dev"),
            "acme_us-central1_gke-dev"
        );
    }

    #[test]
    fn test_kubeconfig_is_deferred_until_cluster_outputs() {
        let mut ctx =
            ProgramContext::new("gke", StackName::new("dev").unwrap(), ConfigStore::new());
        let cluster = cluster(&mut ctx);
        let kubeconfig = gke_kubeconfig("acme", "us-central1", &cluster);
        assert!(!kubeconfig.is_known());
        assert!(kubeconfig.dependencies().contains(cluster.urn()));

        let mut outputs = HashMap::new();
        outputs.insert(
            cluster.urn().clone(),
            json!({
                "name": "gke-dev",
                "endpoint": "34.68.10.20",
                "masterAuth": { "clusterCaCertificate": "LS0tLS1CRUdJTi0tLS0t" },
            }),
        );
        let document = kubeconfig.resolve(&outputs).unwrap();
        let parsed = Kubeconfig::parse(&document).unwrap();
        parsed.validate("acme_us-central1_gke-dev").unwrap();
        assert_eq!(parsed.clusters[0].cluster.server, "https://34.68.10.20");
        assert_eq!(
            parsed.users[0].user.exec.as_ref().unwrap().command,
            GKE_AUTH_PLUGIN
        );
    }

    #[test]
    fn test_missing_endpoint_fails_resolution() {
        let mut ctx =
            ProgramContext::new("gke", StackName::new("dev").unwrap(), ConfigStore::new());
        let cluster = cluster(&mut ctx);
        let kubeconfig = gke_kubeconfig("acme", "us-central1", &cluster);

        let mut outputs = HashMap::new();
        outputs.insert(cluster.urn().clone(), json!({ "name": "gke-dev" }));
        assert!(kubeconfig.resolve(&outputs).is_err());
    }
}
