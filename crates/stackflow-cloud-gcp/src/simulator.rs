//! Local Google Cloud simulator
//!
//! Fabricates self links, endpoints and certificates without calling GCP.

use crate::{PACKAGE, compute, container, sql};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use stackflow_cloud::simulate::stable_hex;
use stackflow_cloud::{
    AuthStatus, CloudError, ProvisionRequest, ProvisionResponse, ResourceProvider, ResourceState,
    Result,
};
use stackflow_core::Config;

pub const SIMULATED_PROJECT: &str = "stackflow-local";

pub struct GcpSimulator {
    project: String,
    region: String,
}

impl GcpSimulator {
    pub fn new(project: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
        }
    }

    /// Project and region from the `gcp` config namespace
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config
                .get("project")
                .unwrap_or_else(|| SIMULATED_PROJECT.to_string()),
            crate::region(config),
        )
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn self_link(&self, path: &str) -> String {
        format!(
            "https://www.googleapis.com/compute/v1/projects/{}/{}",
            self.project, path
        )
    }

    fn network(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let name = request.require_str("name")?;
        let path = format!("global/networks/{}", name);
        Ok(ProvisionResponse::new(format!("projects/{}/{}", self.project, path))
            .with_output("selfLink", self.self_link(&path)))
    }

    fn subnetwork(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let name = request.require_str("name")?;
        let region = request.get_str("region").unwrap_or(&self.region);
        let path = format!("regions/{}/subnetworks/{}", region, name);
        Ok(ProvisionResponse::new(format!("projects/{}/{}", self.project, path))
            .with_output("selfLink", self.self_link(&path))
            .with_output("gatewayAddress", gateway_address(request.get_str("ipCidrRange"))))
    }

    fn cluster(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let name = request.require_str("name")?;
        let location = request.require_str("location")?;
        let seed = stable_hex(&request.urn.to_string(), 4);
        let octets = u16::from_str_radix(&seed, 16).unwrap_or(0).to_be_bytes();
        let endpoint = format!("34.{}.{}.{}", 64 + octets[0] % 64, octets[1], 2 + octets[0] % 250);

        let pem = format!(
            "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
            stable_hex(name, 16)
        );
        Ok(ProvisionResponse::new(format!(
            "projects/{}/locations/{}/clusters/{}",
            self.project, location, name
        ))
        .with_output("endpoint", endpoint)
        .with_output(
            "masterAuth",
            serde_json::json!({ "clusterCaCertificate": STANDARD.encode(pem) }),
        )
        .with_output("status", "RUNNING"))
    }

    fn node_pool(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let name = request.require_str("name")?;
        let cluster = request.require_str("cluster")?;
        let location = request.require_str("location")?;
        Ok(ProvisionResponse::new(format!(
            "projects/{}/locations/{}/clusters/{}/nodePools/{}",
            self.project, location, cluster, name
        ))
        .with_output("status", "RUNNING"))
    }

    fn database_instance(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let name = request.require_str("name")?;
        let region = request.get_str("region").unwrap_or(&self.region);
        let seed = stable_hex(&request.urn.to_string(), 2);
        let host = u8::from_str_radix(&seed, 16).unwrap_or(0);
        Ok(ProvisionResponse::new(format!("{}:{}", self.project, name))
            .with_output(
                "connectionName",
                format!("{}:{}:{}", self.project, region, name),
            )
            .with_output("publicIpAddress", format!("35.202.17.{}", host.max(2)))
            .with_output("state", "RUNNABLE"))
    }
}

/// First usable address of a CIDR range
fn gateway_address(cidr: Option<&str>) -> String {
    cidr.and_then(|c| c.split_once('/'))
        .and_then(|(ip, _)| ip.parse::<std::net::Ipv4Addr>().ok())
        .and_then(|ip| u32::from(ip).checked_add(1))
        .map(|gateway| std::net::Ipv4Addr::from(gateway).to_string())
        .unwrap_or_default()
}

#[async_trait]
impl ResourceProvider for GcpSimulator {
    fn package(&self) -> &str {
        PACKAGE
    }

    fn display_name(&self) -> &str {
        "Google Cloud (simulated)"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        Ok(AuthStatus::ok(format!("project {}", self.project)))
    }

    async fn create(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let response = match request.resource_type.as_str() {
            compute::NETWORK => self.network(request)?,
            compute::SUBNETWORK => self.subnetwork(request)?,
            container::CLUSTER => self.cluster(request)?,
            container::NODE_POOL => self.node_pool(request)?,
            sql::DATABASE_INSTANCE => self.database_instance(request)?,
            other => {
                return Err(CloudError::provider(
                    &request.urn,
                    format!("unsupported resource type {}", other),
                ));
            }
        };
        tracing::debug!(urn = %request.urn, id = %response.id, "Simulated GCP resource");
        Ok(response)
    }

    async fn delete(&self, state: &ResourceState) -> Result<()> {
        tracing::debug!(urn = %state.urn, id = %state.id, "Simulated GCP delete");
        Ok(())
    }
}
