//! Cosmos DB accounts

use crate::naming;
use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, StackError, Tags,
};

pub const DATABASE_ACCOUNT: &str = "azure-native:documentdb:DatabaseAccount";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsistencyLevel {
    Eventual,
    ConsistentPrefix,
    #[default]
    Session,
    BoundedStaleness,
    Strong,
}

impl ConsistencyLevel {
    fn as_str(self) -> &'static str {
        match self {
            ConsistencyLevel::Eventual => "Eventual",
            ConsistencyLevel::ConsistentPrefix => "ConsistentPrefix",
            ConsistencyLevel::Session => "Session",
            ConsistencyLevel::BoundedStaleness => "BoundedStaleness",
            ConsistencyLevel::Strong => "Strong",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackupPolicy {
    #[default]
    Periodic,
    Continuous,
}

#[derive(Debug, Clone)]
pub struct Location {
    pub location_name: Output<String>,
    pub failover_priority: u32,
}

#[derive(Debug, Clone)]
pub struct DatabaseAccountArgs {
    pub resource_group_name: Output<String>,
    pub account_name: Output<String>,
    pub location: Output<String>,
    pub database_account_offer_type: String,
    pub locations: Vec<Location>,
    pub consistency_level: ConsistencyLevel,
    pub enable_automatic_failover: bool,
    pub backup_policy: BackupPolicy,
    pub tags: Tags,
}

impl ResourceArgs for DatabaseAccountArgs {
    fn resource_type(&self) -> &'static str {
        DATABASE_ACCOUNT
    }

    fn into_properties(self) -> Result<PropertyMap> {
        let mut priorities: Vec<u32> = self.locations.iter().map(|l| l.failover_priority).collect();
        priorities.sort_unstable();
        let contiguous = priorities.iter().enumerate().all(|(i, p)| *p == i as u32);
        if priorities.is_empty() || !contiguous {
            return Err(StackError::InvalidArgs(format!(
                "failover priorities must be 0..{} without gaps, got {:?}",
                self.locations.len(),
                priorities
            )));
        }

        let locations: Vec<PropertyMap> = self
            .locations
            .into_iter()
            .map(|l| {
                PropertyMap::new()
                    .with("locationName", l.location_name)
                    .with("failoverPriority", l.failover_priority)
            })
            .collect();
        let backup_type = match self.backup_policy {
            BackupPolicy::Periodic => "Periodic",
            BackupPolicy::Continuous => "Continuous",
        };

        let props = PropertyMap::new()
            .with("resourceGroupName", self.resource_group_name)
            .with("accountName", self.account_name)
            .with("location", self.location)
            .with("databaseAccountOfferType", self.database_account_offer_type)
            .with("locations", locations)
            .with(
                "consistencyPolicy",
                PropertyMap::new().with("defaultConsistencyLevel", self.consistency_level.as_str()),
            )
            .with("enableAutomaticFailover", self.enable_automatic_failover)
            .with("backupPolicy", PropertyMap::new().with("type", backup_type))
            .with("tags", self.tags);
        naming::COSMOS_ACCOUNT.check_property(&props, "accountName")?;
        Ok(props)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseAccount {
    handle: ResourceHandle,
}

impl DatabaseAccount {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: DatabaseAccountArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let handle = ctx.register(name, args, options)?;
        Ok(Self { handle })
    }

    pub fn name(&self) -> Output<String> {
        self.handle.output("name")
    }

    pub fn document_endpoint(&self) -> Output<String> {
        self.handle.output("documentEndpoint")
    }
}

impl Resource for DatabaseAccount {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
