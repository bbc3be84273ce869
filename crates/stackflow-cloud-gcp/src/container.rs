//! GKE clusters and node pools

use crate::compute::check_gcp_name;
use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, StackError, Tags,
};

pub const CLUSTER: &str = "gcp:container:Cluster";
pub const NODE_POOL: &str = "gcp:container:NodePool";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReleaseChannel {
    Rapid,
    #[default]
    Regular,
    Stable,
}

impl ReleaseChannel {
    fn as_str(self) -> &'static str {
        match self {
            ReleaseChannel::Rapid => "RAPID",
            ReleaseChannel::Regular => "REGULAR",
            ReleaseChannel::Stable => "STABLE",
        }
    }
}

/// Secondary ranges of the subnetwork used for pods and services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAllocationPolicy {
    pub cluster_secondary_range_name: String,
    pub services_secondary_range_name: String,
}

#[derive(Debug, Clone)]
pub struct ClusterArgs {
    pub name: Output<String>,
    /// Region or zone
    pub location: String,
    pub network: Output<String>,
    pub subnetwork: Output<String>,
    /// Drop the default pool once the cluster exists; pools are managed separately
    pub remove_default_node_pool: bool,
    pub initial_node_count: u32,
    pub release_channel: ReleaseChannel,
    /// `<project>.svc.id.goog` enables workload identity
    pub workload_pool: Option<String>,
    pub ip_allocation_policy: Option<IpAllocationPolicy>,
    pub deletion_protection: bool,
    pub resource_labels: Tags,
}

impl ResourceArgs for ClusterArgs {
    fn resource_type(&self) -> &'static str {
        CLUSTER
    }

    fn into_properties(self) -> Result<PropertyMap> {
        if self.initial_node_count == 0 {
            return Err(StackError::InvalidArgs(
                "a cluster needs an initial node count of at least 1".to_string(),
            ));
        }
        if let Some(pool) = self.workload_pool.as_deref().filter(|p| !p.ends_with(".svc.id.goog")) {
            return Err(StackError::InvalidArgs(format!(
                "workload pool '{}' must be <project>.svc.id.goog",
                pool
            )));
        }

        let props = PropertyMap::new()
            .with("name", self.name)
            .with("location", self.location)
            .with("network", self.network)
            .with("subnetwork", self.subnetwork)
            .with("removeDefaultNodePool", self.remove_default_node_pool)
            .with("initialNodeCount", self.initial_node_count)
            .with(
                "releaseChannel",
                PropertyMap::new().with("channel", self.release_channel.as_str()),
            )
            .with_opt(
                "workloadIdentityConfig",
                self.workload_pool
                    .map(|pool| PropertyMap::new().with("workloadPool", pool)),
            )
            .with_opt(
                "ipAllocationPolicy",
                self.ip_allocation_policy.map(|p| {
                    PropertyMap::new()
                        .with("clusterSecondaryRangeName", p.cluster_secondary_range_name)
                        .with("servicesSecondaryRangeName", p.services_secondary_range_name)
                }),
            )
            .with("deletionProtection", self.deletion_protection)
            .with("resourceLabels", self.resource_labels.to_labels());
        check_gcp_name(&props, "cluster")?;
        Ok(props)
    }
}

#[derive(Debug, Clone)]
pub struct Cluster {
    handle: ResourceHandle,
}

impl Cluster {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: ClusterArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let handle = ctx.register(name, args, options)?;
        Ok(Self { handle })
    }

    pub fn name(&self) -> Output<String> {
        self.handle.output("name")
    }

    pub fn location(&self) -> Output<String> {
        self.handle.output("location")
    }

    /// API server address, without scheme
    pub fn endpoint(&self) -> Output<String> {
        self.handle.output("endpoint")
    }

    /// Base64 encoded CA certificate
    pub fn cluster_ca_certificate(&self) -> Output<String> {
        self.handle
            .output_path(&["masterAuth", "clusterCaCertificate"])
    }
}

impl Resource for Cluster {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub machine_type: String,
    pub disk_size_gb: u32,
    pub oauth_scopes: Vec<String>,
    pub labels: Tags,
}

#[derive(Debug, Clone)]
pub struct NodePoolArgs {
    pub name: Output<String>,
    pub cluster: Output<String>,
    pub location: String,
    pub node_count: Option<u32>,
    /// (min, max) nodes per zone
    pub autoscaling: Option<(u32, u32)>,
    pub node_config: NodeConfig,
    pub auto_repair: bool,
    pub auto_upgrade: bool,
}

impl ResourceArgs for NodePoolArgs {
    fn resource_type(&self) -> &'static str {
        NODE_POOL
    }

    fn into_properties(self) -> Result<PropertyMap> {
        if let Some((min, max)) = self.autoscaling.filter(|(min, max)| min > max || *max == 0) {
            return Err(StackError::InvalidArgs(format!(
                "node pool autoscaling {}..{} is empty",
                min, max
            )));
        }
        if self.node_config.disk_size_gb < 10 {
            return Err(StackError::InvalidArgs(format!(
                "node disk size {} GB is below the 10 GB minimum",
                self.node_config.disk_size_gb
            )));
        }

        let config = PropertyMap::new()
            .with("machineType", self.node_config.machine_type)
            .with("diskSizeGb", self.node_config.disk_size_gb)
            .with("oauthScopes", self.node_config.oauth_scopes)
            .with("labels", self.node_config.labels.to_labels());

        let props = PropertyMap::new()
            .with("name", self.name)
            .with("cluster", self.cluster)
            .with("location", self.location)
            .with_opt("nodeCount", self.node_count)
            .with_opt(
                "autoscaling",
                self.autoscaling.map(|(min, max)| {
                    PropertyMap::new()
                        .with("minNodeCount", min)
                        .with("maxNodeCount", max)
                }),
            )
            .with("nodeConfig", config)
            .with(
                "management",
                PropertyMap::new()
                    .with("autoRepair", self.auto_repair)
                    .with("autoUpgrade", self.auto_upgrade),
            );
        check_gcp_name(&props, "node pool")?;
        Ok(props)
    }
}

#[derive(Debug, Clone)]
pub struct NodePool {
    handle: ResourceHandle,
}

impl NodePool {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: NodePoolArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let handle = ctx.register(name, args, options)?;
        Ok(Self { handle })
    }

    pub fn name(&self) -> Output<String> {
        self.handle.output("name")
    }
}

impl Resource for NodePool {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
