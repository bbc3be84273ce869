//! GKE cluster with a Cloud SQL PostgreSQL instance

use stackflow_cloud_gcp::compute::{Network, NetworkArgs, SecondaryRange, Subnetwork, SubnetworkArgs};
use stackflow_cloud_gcp::container::{
    Cluster, ClusterArgs, IpAllocationPolicy, NodeConfig, NodePool, NodePoolArgs, ReleaseChannel,
};
use stackflow_cloud_gcp::sql::{
    AvailabilityType, BackupConfiguration, DatabaseInstance, DatabaseInstanceArgs, Settings,
};
use stackflow_cloud_gcp::gke_kubeconfig;
use stackflow_core::{
    Output, Program, ProgramContext, ResourceOptions, Result, StackReference, Tags, stack_scoped,
};

pub const PODS_RANGE: &str = "pods";
pub const SERVICES_RANGE: &str = "services";
pub const NODE_MACHINE_TYPE: &str = "e2-standard-4";
pub const DATABASE_VERSION: &str = "POSTGRES_15";

/// Stack whose resources get deletion protection
pub const PRODUCTION_STACK: &str = "production";

const NODE_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

pub struct GkeCluster;

/// Network and subnetwork names, either declared here or read from another stack
struct NetworkNames {
    network: Output<String>,
    subnetwork: Output<String>,
}

impl GkeCluster {
    fn declare_network(ctx: &mut ProgramContext, region: &str) -> Result<NetworkNames> {
        let stack = ctx.stack().clone();
        let network = Network::new(
            ctx,
            "network",
            NetworkArgs {
                name: stack_scoped("gke-net", &stack).into(),
                auto_create_subnetworks: false,
            },
            ResourceOptions::default(),
        )?;
        let subnet = Subnetwork::new(
            ctx,
            "subnet",
            SubnetworkArgs {
                name: stack_scoped("gke-subnet", &stack).into(),
                network: network.name(),
                region: region.to_string(),
                ip_cidr_range: "10.0.0.0/20".to_string(),
                secondary_ip_ranges: vec![
                    SecondaryRange::new(PODS_RANGE, "10.4.0.0/14"),
                    SecondaryRange::new(SERVICES_RANGE, "10.8.0.0/20"),
                ],
                private_ip_google_access: true,
            },
            ResourceOptions::default(),
        )?;
        Ok(NetworkNames {
            network: network.name(),
            subnetwork: subnet.name(),
        })
    }

    fn referenced_network(ctx: &mut ProgramContext, reference: &str) -> Result<NetworkNames> {
        let network_stack = StackReference::new(ctx, reference)?;
        Ok(NetworkNames {
            network: Output::from_expr(network_stack.require_output("networkName").into_expr()),
            subnetwork: Output::from_expr(
                network_stack.require_output("subnetworkName").into_expr(),
            ),
        })
    }
}

impl Program for GkeCluster {
    fn name(&self) -> &str {
        "gke-cluster"
    }

    fn description(&self) -> &str {
        "GKE cluster with Cloud SQL for PostgreSQL"
    }

    fn run(&self, ctx: &mut ProgramContext) -> Result<()> {
        let gcp = ctx.config_for(stackflow_cloud_gcp::PACKAGE);
        let project = gcp.require("project")?;
        let region = stackflow_cloud_gcp::region(&gcp);
        let network_stack = ctx.config().get("networkStack");

        let stack = ctx.stack().clone();
        let protect = stack.as_str() == PRODUCTION_STACK;
        let labels = Tags::standard(&stack).to_labels();

        let network = match network_stack {
            Some(reference) => Self::referenced_network(ctx, &reference)?,
            None => Self::declare_network(ctx, &region)?,
        };

        let cluster = Cluster::new(
            ctx,
            "cluster",
            ClusterArgs {
                name: stack_scoped("gke", &stack).into(),
                location: region.clone(),
                network: network.network.clone(),
                subnetwork: network.subnetwork.clone(),
                remove_default_node_pool: true,
                initial_node_count: 1,
                release_channel: ReleaseChannel::Regular,
                workload_pool: Some(format!("{}.svc.id.goog", project)),
                ip_allocation_policy: Some(IpAllocationPolicy {
                    cluster_secondary_range_name: PODS_RANGE.to_string(),
                    services_secondary_range_name: SERVICES_RANGE.to_string(),
                }),
                deletion_protection: protect,
                resource_labels: labels.clone(),
            },
            ResourceOptions::new().protect(protect),
        )?;

        NodePool::new(
            ctx,
            "primary-pool",
            NodePoolArgs {
                name: "primary-pool".into(),
                cluster: cluster.name(),
                location: region.clone(),
                node_count: None,
                autoscaling: Some((1, 5)),
                node_config: NodeConfig {
                    machine_type: NODE_MACHINE_TYPE.to_string(),
                    disk_size_gb: 100,
                    oauth_scopes: NODE_SCOPES.iter().map(|s| s.to_string()).collect(),
                    labels: labels.clone(),
                },
                auto_repair: true,
                auto_upgrade: true,
            },
            ResourceOptions::default(),
        )?;

        let db = DatabaseInstance::new(
            ctx,
            "db",
            DatabaseInstanceArgs {
                name: stack_scoped("pg", &stack).into(),
                database_version: DATABASE_VERSION.to_string(),
                region: region.clone(),
                settings: Settings {
                    tier: "db-custom-2-7680".to_string(),
                    availability_type: if protect {
                        AvailabilityType::Regional
                    } else {
                        AvailabilityType::Zonal
                    },
                    backup_configuration: BackupConfiguration {
                        enabled: true,
                        point_in_time_recovery_enabled: true,
                        start_time: Some("03:00".to_string()),
                    },
                    user_labels: labels,
                },
                deletion_protection: protect,
            },
            ResourceOptions::new().protect(protect),
        )?;

        ctx.export("networkName", network.network)?;
        ctx.export("subnetworkName", network.subnetwork)?;
        ctx.export("clusterName", cluster.name())?;
        ctx.export("clusterEndpoint", cluster.endpoint())?;
        ctx.export("dbConnectionName", db.connection_name())?;
        ctx.export("kubeconfig", gke_kubeconfig(&project, &region, &cluster))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stackflow_core::{
        ConfigStore, PropertyValue, ResourceGraph, STACK_REFERENCE_TYPE, StackError, StackName,
        run_program,
    };

    fn config(extra: &[(&str, &str)]) -> ConfigStore {
        let mut pairs = vec![("gcp:project", "acme")];
        pairs.extend_from_slice(extra);
        ConfigStore::from_pairs(pairs).unwrap()
    }

    fn run(stack: &str, config: ConfigStore) -> Result<ResourceGraph> {
        run_program(&GkeCluster, StackName::new(stack)?, config)
    }

    #[test]
    fn test_project_is_required() {
        let err = run("dev", ConfigStore::new()).unwrap_err();
        assert!(matches!(err, StackError::Config(_)));
    }

    #[test]
    fn test_region_defaults_to_us_central1() {
        let graph = run("dev", config(&[])).unwrap();
        let cluster = &graph.get("cluster").unwrap().properties;
        assert_eq!(cluster.known_str("location").as_deref(), Some("us-central1"));

        let graph = run("dev", config(&[("gcp:region", "europe-west4")])).unwrap();
        let db = graph.get("db").unwrap().properties.known_value().unwrap();
        assert_eq!(db["region"], json!("europe-west4"));
    }

    #[test]
    fn test_production_is_protected() {
        let graph = run("production", config(&[])).unwrap();
        let cluster = graph.get("cluster").unwrap();
        assert!(cluster.options.protect);
        assert_eq!(
            cluster
                .properties
                .get("deletionProtection")
                .and_then(PropertyValue::known_value),
            Some(json!(true))
        );

        let graph = run("dev", config(&[])).unwrap();
        assert!(!graph.get("db").unwrap().options.protect);
    }

    #[test]
    fn test_network_stack_replaces_network() {
        let graph = run(
            "dev",
            config(&[("gke-cluster:networkStack", "organization/gke-cluster/shared")]),
        )
        .unwrap();
        assert!(graph.get("network").is_none());
        assert!(graph.get("subnet").is_none());

        let reference = graph.by_type(STACK_REFERENCE_TYPE)[0];
        assert_eq!(reference.name, "organization/gke-cluster/shared");
        assert!(graph.get("cluster").unwrap().dependencies.contains(&reference.urn));
    }

    #[test]
    fn test_kubeconfig_export_depends_on_cluster() {
        let graph = run("dev", config(&[])).unwrap();
        let cluster = graph.get("cluster").unwrap();
        let kubeconfig = &graph.exports()["kubeconfig"];
        assert!(kubeconfig.known_value().is_none());
        assert!(kubeconfig.dependencies().contains(&cluster.urn));
    }
}
