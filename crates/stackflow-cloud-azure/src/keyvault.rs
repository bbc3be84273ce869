//! Key vaults

use crate::naming;
use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, StackError, Tags,
};

pub const VAULT: &str = "azure-native:keyvault:Vault";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SkuName {
    #[default]
    Standard,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sku {
    pub family: String,
    pub name: SkuName,
}

impl Default for Sku {
    fn default() -> Self {
        Self {
            family: "A".to_string(),
            name: SkuName::Standard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultProperties {
    pub tenant_id: String,
    pub sku: Sku,
    pub enabled_for_deployment: bool,
    pub enabled_for_disk_encryption: bool,
    pub enabled_for_template_deployment: bool,
    pub enable_soft_delete: bool,
    /// 7..=90
    pub soft_delete_retention_in_days: u32,
    pub enable_purge_protection: bool,
}

impl VaultProperties {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            sku: Sku::default(),
            enabled_for_deployment: false,
            enabled_for_disk_encryption: false,
            enabled_for_template_deployment: false,
            enable_soft_delete: true,
            soft_delete_retention_in_days: 90,
            enable_purge_protection: false,
        }
    }

    fn into_properties(self) -> Result<PropertyMap> {
        if self.tenant_id.is_empty() {
            return Err(StackError::InvalidArgs("key vault tenant id is empty".to_string()));
        }
        if !(7..=90).contains(&self.soft_delete_retention_in_days) {
            return Err(StackError::InvalidArgs(format!(
                "soft delete retention {} is outside 7..=90 days",
                self.soft_delete_retention_in_days
            )));
        }
        if self.enable_purge_protection && !self.enable_soft_delete {
            return Err(StackError::InvalidArgs(
                "purge protection requires soft delete".to_string(),
            ));
        }

        let sku_name = match self.sku.name {
            SkuName::Standard => "standard",
            SkuName::Premium => "premium",
        };
        Ok(PropertyMap::new()
            .with("tenantId", self.tenant_id)
            .with(
                "sku",
                PropertyMap::new()
                    .with("family", self.sku.family)
                    .with("name", sku_name),
            )
            .with("enabledForDeployment", self.enabled_for_deployment)
            .with("enabledForDiskEncryption", self.enabled_for_disk_encryption)
            .with(
                "enabledForTemplateDeployment",
                self.enabled_for_template_deployment,
            )
            .with("enableSoftDelete", self.enable_soft_delete)
            .with(
                "softDeleteRetentionInDays",
                self.soft_delete_retention_in_days,
            )
            .with("enablePurgeProtection", self.enable_purge_protection))
    }
}

#[derive(Debug, Clone)]
pub struct VaultArgs {
    pub resource_group_name: Output<String>,
    pub vault_name: Output<String>,
    pub location: Output<String>,
    pub properties: VaultProperties,
    pub tags: Tags,
}

impl ResourceArgs for VaultArgs {
    fn resource_type(&self) -> &'static str {
        VAULT
    }

    fn into_properties(self) -> Result<PropertyMap> {
        let props = PropertyMap::new()
            .with("resourceGroupName", self.resource_group_name)
            .with("vaultName", self.vault_name)
            .with("location", self.location)
            .with("properties", self.properties.into_properties()?)
            .with("tags", self.tags);
        naming::KEY_VAULT.check_property(&props, "vaultName")?;
        Ok(props)
    }
}

#[derive(Debug, Clone)]
pub struct Vault {
    handle: ResourceHandle,
}

impl Vault {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: VaultArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let handle = ctx.register(name, args, options)?;
        Ok(Self { handle })
    }

    pub fn name(&self) -> Output<String> {
        self.handle.output("name")
    }

    pub fn vault_uri(&self) -> Output<String> {
        self.handle.output_path(&["properties", "vaultUri"])
    }
}

impl Resource for Vault {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
