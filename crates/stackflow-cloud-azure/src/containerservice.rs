//! AKS managed clusters

use crate::naming;
use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, StackError, Tags,
};
use std::collections::BTreeMap;

pub const MANAGED_CLUSTER: &str = "azure-native:containerservice:ManagedCluster";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentityType {
    #[default]
    SystemAssigned,
    UserAssigned,
    None,
}

impl IdentityType {
    fn as_str(self) -> &'static str {
        match self {
            IdentityType::SystemAssigned => "SystemAssigned",
            IdentityType::UserAssigned => "UserAssigned",
            IdentityType::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPoolMode {
    System,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleSetPriority {
    Regular,
    Spot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Autoscale {
    pub min_count: u32,
    pub max_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentPoolProfile {
    pub name: String,
    pub count: u32,
    pub vm_size: String,
    pub os_disk_size_gb: u32,
    pub mode: AgentPoolMode,
    pub autoscale: Option<Autoscale>,
    pub scale_set_priority: ScaleSetPriority,
    /// `-1` pays up to the on-demand price
    pub spot_max_price: Option<f64>,
}

impl AgentPoolProfile {
    pub fn new(name: &str, mode: AgentPoolMode, count: u32, vm_size: &str) -> Self {
        Self {
            name: name.to_string(),
            count,
            vm_size: vm_size.to_string(),
            os_disk_size_gb: 30,
            mode,
            autoscale: None,
            scale_set_priority: ScaleSetPriority::Regular,
            spot_max_price: None,
        }
    }

    pub fn autoscale(mut self, min_count: u32, max_count: u32) -> Self {
        self.autoscale = Some(Autoscale {
            min_count,
            max_count,
        });
        self
    }

    pub fn spot(mut self, max_price: f64) -> Self {
        self.scale_set_priority = ScaleSetPriority::Spot;
        self.spot_max_price = Some(max_price);
        self
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| -> Result<()> {
            Err(StackError::InvalidArgs(format!(
                "agent pool '{}': {}",
                self.name, reason
            )))
        };

        let valid_name = !self.name.is_empty()
            && self.name.len() <= 12
            && self.name.starts_with(|c: char| c.is_ascii_lowercase())
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !valid_name {
            return invalid("name must be 1-12 lowercase letters or digits".to_string());
        }
        if let Some(scale) = self.autoscale {
            if scale.min_count > scale.max_count {
                return invalid(format!(
                    "min count {} exceeds max count {}",
                    scale.min_count, scale.max_count
                ));
            }
            if self.count < scale.min_count || self.count > scale.max_count {
                return invalid(format!(
                    "count {} is outside {}..={}",
                    self.count, scale.min_count, scale.max_count
                ));
            }
        }
        if self.mode == AgentPoolMode::System {
            if self.scale_set_priority == ScaleSetPriority::Spot {
                return invalid("system pools cannot use spot instances".to_string());
            }
            if self.autoscale.is_some_and(|s| s.min_count == 0) || self.count == 0 {
                return invalid("system pools need at least one node".to_string());
            }
        }
        Ok(())
    }

    fn into_properties(self) -> PropertyMap {
        let (enable_auto_scaling, min_count, max_count) = match self.autoscale {
            Some(scale) => (true, Some(scale.min_count), Some(scale.max_count)),
            None => (false, None, None),
        };
        let mode = match self.mode {
            AgentPoolMode::System => "System",
            AgentPoolMode::User => "User",
        };
        let priority = match self.scale_set_priority {
            ScaleSetPriority::Regular => None,
            ScaleSetPriority::Spot => Some("Spot"),
        };

        PropertyMap::new()
            .with("name", self.name)
            .with("count", self.count)
            .with("vmSize", self.vm_size)
            .with("osDiskSizeGB", self.os_disk_size_gb)
            .with("mode", mode)
            .with("enableAutoScaling", enable_auto_scaling)
            .with_opt("minCount", min_count)
            .with_opt("maxCount", max_count)
            .with_opt("scaleSetPriority", priority)
            .with_opt("spotMaxPrice", self.spot_max_price)
            .with("type", "VirtualMachineScaleSets")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    pub network_plugin: String,
    pub service_cidr: String,
    pub dns_service_ip: String,
}

impl NetworkProfile {
    fn validate(&self) -> Result<()> {
        let Some((base, prefix)) = self.service_cidr.split_once('/') else {
            return Err(StackError::InvalidArgs(format!(
                "service CIDR '{}' has no prefix length",
                self.service_cidr
            )));
        };
        let base: std::net::Ipv4Addr = base.parse().map_err(|_| {
            StackError::InvalidArgs(format!("service CIDR '{}' is malformed", self.service_cidr))
        })?;
        let prefix: u32 = prefix.parse().ok().filter(|p| *p <= 32).ok_or_else(|| {
            StackError::InvalidArgs(format!("service CIDR '{}' is malformed", self.service_cidr))
        })?;
        let dns: std::net::Ipv4Addr = self.dns_service_ip.parse().map_err(|_| {
            StackError::InvalidArgs(format!("DNS service IP '{}' is malformed", self.dns_service_ip))
        })?;

        let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
        if u32::from(base) & mask != u32::from(dns) & mask {
            return Err(StackError::InvalidArgs(format!(
                "DNS service IP {} is outside service CIDR {}",
                self.dns_service_ip, self.service_cidr
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ManagedClusterArgs {
    pub resource_group_name: Output<String>,
    pub resource_name: Output<String>,
    pub location: Output<String>,
    pub kubernetes_version: String,
    pub dns_prefix: Output<String>,
    pub identity: IdentityType,
    pub agent_pool_profiles: Vec<AgentPoolProfile>,
    pub network_profile: NetworkProfile,
    /// Add-on name to enabled flag
    pub addon_profiles: BTreeMap<String, bool>,
    pub tags: Tags,
}

impl ResourceArgs for ManagedClusterArgs {
    fn resource_type(&self) -> &'static str {
        MANAGED_CLUSTER
    }

    fn into_properties(self) -> Result<PropertyMap> {
        let version_ok = self.kubernetes_version.split('.').count() == 3
            && self
                .kubernetes_version
                .split('.')
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
        if !version_ok {
            return Err(StackError::InvalidArgs(format!(
                "kubernetes version '{}' is not <major>.<minor>.<patch>",
                self.kubernetes_version
            )));
        }
        if !self
            .agent_pool_profiles
            .iter()
            .any(|p| p.mode == AgentPoolMode::System)
        {
            return Err(StackError::InvalidArgs(
                "a managed cluster needs at least one System agent pool".to_string(),
            ));
        }
        let mut names = std::collections::HashSet::new();
        for pool in &self.agent_pool_profiles {
            pool.validate()?;
            if !names.insert(pool.name.as_str()) {
                return Err(StackError::InvalidArgs(format!(
                    "agent pool '{}' is declared twice",
                    pool.name
                )));
            }
        }
        self.network_profile.validate()?;

        let pools: Vec<PropertyMap> = self
            .agent_pool_profiles
            .into_iter()
            .map(AgentPoolProfile::into_properties)
            .collect();
        let addons: BTreeMap<String, PropertyMap> = self
            .addon_profiles
            .into_iter()
            .map(|(name, enabled)| (name, PropertyMap::new().with("enabled", enabled)))
            .collect();

        let props = PropertyMap::new()
            .with("resourceGroupName", self.resource_group_name)
            .with("resourceName", self.resource_name)
            .with("location", self.location)
            .with("kubernetesVersion", self.kubernetes_version)
            .with("dnsPrefix", self.dns_prefix)
            .with(
                "identity",
                PropertyMap::new().with("type", self.identity.as_str()),
            )
            .with("agentPoolProfiles", pools)
            .with(
                "networkProfile",
                PropertyMap::new()
                    .with("networkPlugin", self.network_profile.network_plugin)
                    .with("serviceCidr", self.network_profile.service_cidr)
                    .with("dnsServiceIP", self.network_profile.dns_service_ip),
            )
            .with("addonProfiles", addons)
            .with("tags", self.tags);
        naming::MANAGED_CLUSTER.check_property(&props, "resourceName")?;
        Ok(props)
    }
}

#[derive(Debug, Clone)]
pub struct ManagedCluster {
    handle: ResourceHandle,
}

impl ManagedCluster {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: ManagedClusterArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let handle = ctx.register(name, args, options)?;
        Ok(Self { handle })
    }

    pub fn name(&self) -> Output<String> {
        self.handle.output("name")
    }

    /// API server FQDN
    pub fn fqdn(&self) -> Output<String> {
        self.handle.output("fqdn")
    }

    pub fn id(&self) -> Output<String> {
        self.handle.id()
    }
}

impl Resource for ManagedCluster {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stackflow_core::{ConfigStore, StackName};

    fn args() -> ManagedClusterArgs {
        ManagedClusterArgs {
            resource_group_name: "rg".into(),
            resource_name: "aks-dev".into(),
            location: "eastus".into(),
            kubernetes_version: "1.28.0".into(),
            dns_prefix: "aks-dev".into(),
            identity: IdentityType::SystemAssigned,
            agent_pool_profiles: vec![
                AgentPoolProfile::new("systempool", AgentPoolMode::System, 2, "Standard_D2s_v3")
                    .autoscale(1, 5),
                AgentPoolProfile::new("userpool", AgentPoolMode::User, 2, "Standard_D2s_v3")
                    .autoscale(0, 10)
                    .spot(-1.0),
            ],
            network_profile: NetworkProfile {
                network_plugin: "azure".into(),
                service_cidr: "10.0.0.0/16".into(),
                dns_service_ip: "10.0.0.10".into(),
            },
            addon_profiles: BTreeMap::from([("omsagent".to_string(), true)]),
            tags: Tags::new(),
        }
    }

    fn declare(args: ManagedClusterArgs) -> Result<ManagedCluster> {
        let mut ctx =
            ProgramContext::new("app", StackName::new("dev").unwrap(), ConfigStore::new());
        ManagedCluster::new(&mut ctx, "aks", args, ResourceOptions::default())
    }

    #[test]
    fn test_pool_properties() {
        let mut ctx =
            ProgramContext::new("app", StackName::new("dev").unwrap(), ConfigStore::new());
        ManagedCluster::new(&mut ctx, "aks", args(), ResourceOptions::default()).unwrap();
        let props = ctx.finish().get("aks").unwrap().properties.known_value().unwrap();

        let user = &props["agentPoolProfiles"][1];
        assert_eq!(user["scaleSetPriority"], json!("Spot"));
        assert_eq!(user["spotMaxPrice"], json!(-1.0));
        assert_eq!(user["minCount"], json!(0));
        assert!(props["agentPoolProfiles"][0].get("scaleSetPriority").is_none());
        assert_eq!(props["addonProfiles"]["omsagent"]["enabled"], json!(true));
        assert_eq!(props["identity"]["type"], json!("SystemAssigned"));
    }

    #[test]
    fn test_requires_system_pool() {
        let mut args = args();
        args.agent_pool_profiles.remove(0);
        assert!(matches!(declare(args), Err(StackError::InvalidArgs(_))));
    }

    #[test]
    fn test_count_within_autoscale_range() {
        let mut args = args();
        args.agent_pool_profiles[0] = args.agent_pool_profiles[0].clone().autoscale(3, 5);
        assert!(declare(args).is_err());
    }

    #[test]
    fn test_dns_ip_inside_service_cidr() {
        let mut args = args();
        args.network_profile.dns_service_ip = "10.1.0.10".into();
        assert!(declare(args).is_err());
    }

    #[test]
    fn test_version_format() {
        let mut args = args();
        args.kubernetes_version = "1.28".into();
        assert!(declare(args).is_err());
    }
}
