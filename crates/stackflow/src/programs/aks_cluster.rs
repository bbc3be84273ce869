//! AKS cluster with a Key Vault and a Cosmos DB account

use stackflow_cloud_azure::containerservice::{
    AgentPoolMode, AgentPoolProfile, IdentityType, ManagedCluster, ManagedClusterArgs,
    NetworkProfile,
};
use stackflow_cloud_azure::documentdb::{
    BackupPolicy, ConsistencyLevel, DatabaseAccount, DatabaseAccountArgs, Location,
};
use stackflow_cloud_azure::keyvault::{Vault, VaultArgs, VaultProperties};
use stackflow_cloud_azure::resources::{ResourceGroup, ResourceGroupArgs};
use stackflow_cloud_azure::DEFAULT_LOCATION;
use stackflow_core::{
    Output, Program, ProgramContext, ResourceOptions, Result, Tags, stack_scoped,
};
use std::collections::BTreeMap;

pub const KUBERNETES_VERSION: &str = "1.28.0";
pub const NODE_VM_SIZE: &str = "Standard_D2s_v3";

/// Tenant used until `tenantId` is configured
pub const PLACEHOLDER_TENANT_ID: &str = "TENANT_ID";

pub struct AksCluster;

impl Program for AksCluster {
    fn name(&self) -> &str {
        "aks-cluster"
    }

    fn description(&self) -> &str {
        "AKS cluster with Azure Key Vault and Cosmos DB"
    }

    fn run(&self, ctx: &mut ProgramContext) -> Result<()> {
        let config = ctx.config();
        let location = config.get_or("location", DEFAULT_LOCATION);
        let tenant_id = config.get_or("tenantId", PLACEHOLDER_TENANT_ID);
        let stack = ctx.stack().clone();
        let tags = Tags::standard(&stack);
        let data_tags = Tags::new().with("Environment", stack.as_str());

        let resource_group = ResourceGroup::new(
            ctx,
            "rg",
            ResourceGroupArgs {
                resource_group_name: stack_scoped("rg-aks", &stack).into(),
                location: location.into(),
                tags: tags.clone(),
            },
            ResourceOptions::default(),
        )?;

        let cluster_name = stack_scoped("aks", &stack);
        let cluster = ManagedCluster::new(
            ctx,
            "aksCluster",
            ManagedClusterArgs {
                resource_group_name: resource_group.name(),
                resource_name: cluster_name.as_str().into(),
                location: resource_group.location(),
                kubernetes_version: KUBERNETES_VERSION.to_string(),
                dns_prefix: cluster_name.as_str().into(),
                identity: IdentityType::SystemAssigned,
                agent_pool_profiles: vec![
                    AgentPoolProfile::new("systempool", AgentPoolMode::System, 2, NODE_VM_SIZE)
                        .autoscale(1, 5),
                    AgentPoolProfile::new("userpool", AgentPoolMode::User, 2, NODE_VM_SIZE)
                        .autoscale(0, 10)
                        .spot(-1.0),
                ],
                network_profile: NetworkProfile {
                    network_plugin: "azure".to_string(),
                    service_cidr: "10.0.0.0/16".to_string(),
                    dns_service_ip: "10.0.0.10".to_string(),
                },
                addon_profiles: BTreeMap::from([
                    ("azureKeyvaultSecretsProvider".to_string(), true),
                    ("omsagent".to_string(), true),
                ]),
                tags: tags.clone(),
            },
            ResourceOptions::default(),
        )?;

        let mut vault_properties = VaultProperties::new(tenant_id);
        vault_properties.enabled_for_deployment = true;
        vault_properties.enabled_for_disk_encryption = true;
        vault_properties.enabled_for_template_deployment = true;
        vault_properties.enable_purge_protection = true;
        let vault = Vault::new(
            ctx,
            "keyVault",
            VaultArgs {
                resource_group_name: resource_group.name(),
                vault_name: stack_scoped("kv", &stack).into(),
                location: resource_group.location(),
                properties: vault_properties,
                tags: data_tags.clone(),
            },
            ResourceOptions::default(),
        )?;

        let cosmos = DatabaseAccount::new(
            ctx,
            "cosmosAccount",
            DatabaseAccountArgs {
                resource_group_name: resource_group.name(),
                account_name: stack_scoped("cosmos", &stack).into(),
                location: resource_group.location(),
                database_account_offer_type: "Standard".to_string(),
                locations: vec![Location {
                    location_name: resource_group.location(),
                    failover_priority: 0,
                }],
                consistency_level: ConsistencyLevel::Session,
                enable_automatic_failover: true,
                backup_policy: BackupPolicy::Continuous,
                tags: data_tags,
            },
            ResourceOptions::default(),
        )?;

        ctx.export("resourceGroupName", resource_group.name())?;
        ctx.export("aksClusterName", cluster.name())?;
        ctx.export("keyVaultName", vault.name())?;
        ctx.export("cosmosAccountName", cosmos.name())?;
        ctx.export(
            "kubeconfig",
            Output::concat([
                Output::from("az aks get-credentials --resource-group "),
                resource_group.name(),
                Output::from(" --name "),
                cluster.name(),
            ]),
        )?;
        Ok(())
    }
}
