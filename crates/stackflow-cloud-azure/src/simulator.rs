//! Local Azure simulator
//!
//! Fabricates ARM ids and service endpoints without calling Azure.

use crate::{PACKAGE, containerservice, documentdb, keyvault, resources};
use async_trait::async_trait;
use serde_json::{Value, json};
use stackflow_cloud::simulate::stable_hex;
use stackflow_cloud::{
    AuthStatus, CloudError, ProvisionRequest, ProvisionResponse, ResourceProvider, ResourceState,
    Result,
};

/// Subscription reported by the simulator
pub const SIMULATED_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

pub struct AzureSimulator {
    subscription_id: String,
}

impl Default for AzureSimulator {
    fn default() -> Self {
        Self::new(SIMULATED_SUBSCRIPTION_ID)
    }
}

impl AzureSimulator {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
        }
    }

    fn resource_group_id(&self, group: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, group
        )
    }

    fn provider_id(&self, group: &str, provider: &str, name: &str) -> String {
        format!(
            "{}/providers/{}/{}",
            self.resource_group_id(group),
            provider,
            name
        )
    }

    fn resource_group(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let name = request.require_str("resourceGroupName")?;
        Ok(ProvisionResponse::new(self.resource_group_id(name))
            .with_output("name", name)
            .with_output("provisioningState", "Succeeded"))
    }

    fn managed_cluster(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let group = request.require_str("resourceGroupName")?;
        let name = request.require_str("resourceName")?;
        let location = request.require_str("location")?;
        let dns_prefix = request.get_str("dnsPrefix").unwrap_or(name);
        let fqdn = format!(
            "{}-{}.hcp.{}.azmk8s.io",
            dns_prefix,
            stable_hex(&request.urn.to_string(), 8),
            location
        );
        Ok(ProvisionResponse::new(self.provider_id(
            group,
            "Microsoft.ContainerService/managedClusters",
            name,
        ))
        .with_output("name", name)
        .with_output("fqdn", fqdn)
        .with_output(
            "nodeResourceGroup",
            format!("MC_{}_{}_{}", group, name, location),
        )
        .with_output("provisioningState", "Succeeded"))
    }

    fn vault(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let group = request.require_str("resourceGroupName")?;
        let name = request.require_str("vaultName")?;
        let mut properties = request
            .inputs
            .get("properties")
            .cloned()
            .unwrap_or_else(|| json!({}));
        if let Value::Object(map) = &mut properties {
            map.insert(
                "vaultUri".to_string(),
                json!(format!("https://{}.vault.azure.net/", name)),
            );
        }
        Ok(
            ProvisionResponse::new(self.provider_id(group, "Microsoft.KeyVault/vaults", name))
                .with_output("name", name)
                .with_output("properties", properties),
        )
    }

    fn database_account(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let group = request.require_str("resourceGroupName")?;
        let name = request.require_str("accountName")?;
        Ok(ProvisionResponse::new(self.provider_id(
            group,
            "Microsoft.DocumentDB/databaseAccounts",
            name,
        ))
        .with_output("name", name)
        .with_output(
            "documentEndpoint",
            format!("https://{}.documents.azure.com:443/", name),
        ))
    }
}

#[async_trait]
impl ResourceProvider for AzureSimulator {
    fn package(&self) -> &str {
        PACKAGE
    }

    fn display_name(&self) -> &str {
        "Azure (simulated)"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        Ok(AuthStatus::ok(format!(
            "subscription {}",
            self.subscription_id
        )))
    }

    async fn create(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let response = match request.resource_type.as_str() {
            resources::RESOURCE_GROUP => self.resource_group(request)?,
            containerservice::MANAGED_CLUSTER => self.managed_cluster(request)?,
            keyvault::VAULT => self.vault(request)?,
            documentdb::DATABASE_ACCOUNT => self.database_account(request)?,
            other => {
                return Err(CloudError::provider(
                    &request.urn,
                    format!("unsupported resource type {}", other),
                ));
            }
        };
        tracing::debug!(urn = %request.urn, id = %response.id, "Simulated Azure resource");
        Ok(response)
    }

    async fn delete(&self, state: &ResourceState) -> Result<()> {
        tracing::debug!(urn = %state.urn, id = %state.id, "Simulated Azure delete");
        Ok(())
    }
}
