//! VPC networks and subnetworks

use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, StackError,
};

pub const NETWORK: &str = "gcp:compute:Network";
pub const SUBNETWORK: &str = "gcp:compute:Subnetwork";

#[derive(Debug, Clone)]
pub struct NetworkArgs {
    pub name: Output<String>,
    pub auto_create_subnetworks: bool,
}

impl ResourceArgs for NetworkArgs {
    fn resource_type(&self) -> &'static str {
        NETWORK
    }

    fn into_properties(self) -> Result<PropertyMap> {
        let props = PropertyMap::new()
            .with("name", self.name)
            .with("autoCreateSubnetworks", self.auto_create_subnetworks);
        check_gcp_name(&props, "network")?;
        Ok(props)
    }
}

#[derive(Debug, Clone)]
pub struct Network {
    handle: ResourceHandle,
}

impl Network {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: NetworkArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let handle = ctx.register(name, args, options)?;
        Ok(Self { handle })
    }

    pub fn name(&self) -> Output<String> {
        self.handle.output("name")
    }

    pub fn self_link(&self) -> Output<String> {
        self.handle.output("selfLink")
    }
}

impl Resource for Network {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// Named alias range of a subnetwork
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryRange {
    pub range_name: String,
    pub ip_cidr_range: String,
}

impl SecondaryRange {
    pub fn new(range_name: &str, ip_cidr_range: &str) -> Self {
        Self {
            range_name: range_name.to_string(),
            ip_cidr_range: ip_cidr_range.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubnetworkArgs {
    pub name: Output<String>,
    pub network: Output<String>,
    pub region: String,
    pub ip_cidr_range: String,
    pub secondary_ip_ranges: Vec<SecondaryRange>,
    pub private_ip_google_access: bool,
}

impl ResourceArgs for SubnetworkArgs {
    fn resource_type(&self) -> &'static str {
        SUBNETWORK
    }

    fn into_properties(self) -> Result<PropertyMap> {
        check_cidr(&self.ip_cidr_range)?;
        for range in &self.secondary_ip_ranges {
            check_cidr(&range.ip_cidr_range)?;
        }

        let ranges: Vec<PropertyMap> = self
            .secondary_ip_ranges
            .into_iter()
            .map(|r| {
                PropertyMap::new()
                    .with("rangeName", r.range_name)
                    .with("ipCidrRange", r.ip_cidr_range)
            })
            .collect();

        let props = PropertyMap::new()
            .with("name", self.name)
            .with("network", self.network)
            .with("region", self.region)
            .with("ipCidrRange", self.ip_cidr_range)
            .with("secondaryIpRanges", ranges)
            .with("privateIpGoogleAccess", self.private_ip_google_access);
        check_gcp_name(&props, "subnetwork")?;
        Ok(props)
    }
}

#[derive(Debug, Clone)]
pub struct Subnetwork {
    handle: ResourceHandle,
}

impl Subnetwork {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: SubnetworkArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let handle = ctx.register(name, args, options)?;
        Ok(Self { handle })
    }

    pub fn name(&self) -> Output<String> {
        self.handle.output("name")
    }
}

impl Resource for Subnetwork {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// RFC 1035 names: 1-63 lowercase letters, digits and hyphens
pub(crate) fn check_gcp_name(props: &PropertyMap, kind: &str) -> Result<()> {
    let Some(name) = props.known_str("name") else {
        return Ok(());
    };
    let valid = (1..=63).contains(&name.len())
        && name.starts_with(|c: char| c.is_ascii_lowercase())
        && !name.ends_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(StackError::InvalidName {
            resource_type: kind.to_string(),
            name,
            reason: "1-63 lowercase letters, digits or hyphens, starting with a letter"
                .to_string(),
        });
    }
    Ok(())
}

fn check_cidr(cidr: &str) -> Result<()> {
    let valid = cidr.split_once('/').is_some_and(|(ip, prefix)| {
        ip.parse::<std::net::Ipv4Addr>().is_ok()
            && prefix.parse::<u8>().is_ok_and(|p| (8..=29).contains(&p))
    });
    if !valid {
        return Err(StackError::InvalidArgs(format!(
            "'{}' is not an IPv4 CIDR range with a /8../29 prefix",
            cidr
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_core::{ConfigStore, StackName};

    fn ctx() -> ProgramContext {
        ProgramContext::new("app", StackName::new("dev").unwrap(), ConfigStore::new())
    }

    #[test]
    fn test_network_name_rule() {
        let mut ctx = ctx();
        let args = |name: &str| NetworkArgs {
            name: name.into(),
            auto_create_subnetworks: false,
        };
        assert!(Network::new(&mut ctx, "ok", args("gke-net-dev"), ResourceOptions::default()).is_ok());
        assert!(matches!(
            Network::new(&mut ctx, "bad", args("gke-net-Prod_1"), ResourceOptions::default()),
            Err(StackError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_subnetwork_ranges() {
        let mut ctx = ctx();
        let args = |cidr: &str| SubnetworkArgs {
            name: "gke-subnet-dev".into(),
            network: "gke-net-dev".into(),
            region: "us-central1".into(),
            ip_cidr_range: "10.0.0.0/20".into(),
            secondary_ip_ranges: vec![SecondaryRange::new("pods", cidr)],
            private_ip_google_access: true,
        };
        assert!(Subnetwork::new(&mut ctx, "a", args("10.4.0.0/14"), ResourceOptions::default()).is_ok());
        assert!(Subnetwork::new(&mut ctx, "b", args("10.4.0.0"), ResourceOptions::default()).is_err());
        assert!(Subnetwork::new(&mut ctx, "c", args("10.4.0.0/31"), ResourceOptions::default()).is_err());
    }
}
