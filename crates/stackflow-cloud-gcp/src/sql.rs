//! Cloud SQL instances

use crate::compute::check_gcp_name;
use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, StackError, Tags,
};

pub const DATABASE_INSTANCE: &str = "gcp:sql:DatabaseInstance";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfiguration {
    pub enabled: bool,
    pub point_in_time_recovery_enabled: bool,
    /// `HH:MM` UTC
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AvailabilityType {
    #[default]
    Zonal,
    Regional,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub tier: String,
    pub availability_type: AvailabilityType,
    pub backup_configuration: BackupConfiguration,
    pub user_labels: Tags,
}

#[derive(Debug, Clone)]
pub struct DatabaseInstanceArgs {
    pub name: Output<String>,
    /// e.g. `POSTGRES_15`
    pub database_version: String,
    pub region: String,
    pub settings: Settings,
    pub deletion_protection: bool,
}

impl ResourceArgs for DatabaseInstanceArgs {
    fn resource_type(&self) -> &'static str {
        DATABASE_INSTANCE
    }

    fn into_properties(self) -> Result<PropertyMap> {
        let engine_ok = ["POSTGRES_", "MYSQL_", "SQLSERVER_"]
            .iter()
            .any(|p| self.database_version.starts_with(p));
        if !engine_ok {
            return Err(StackError::InvalidArgs(format!(
                "unknown database version '{}'",
                self.database_version
            )));
        }
        let backup = self.settings.backup_configuration;
        if backup.point_in_time_recovery_enabled && !backup.enabled {
            return Err(StackError::InvalidArgs(
                "point-in-time recovery requires backups".to_string(),
            ));
        }
        if let Some(start) = backup.start_time.as_deref().filter(|s| !is_hh_mm(s)) {
            return Err(StackError::InvalidArgs(format!(
                "backup start time '{}' is not HH:MM",
                start
            )));
        }

        let availability = match self.settings.availability_type {
            AvailabilityType::Zonal => "ZONAL",
            AvailabilityType::Regional => "REGIONAL",
        };
        let settings = PropertyMap::new()
            .with("tier", self.settings.tier)
            .with("availabilityType", availability)
            .with(
                "backupConfiguration",
                PropertyMap::new()
                    .with("enabled", backup.enabled)
                    .with(
                        "pointInTimeRecoveryEnabled",
                        backup.point_in_time_recovery_enabled,
                    )
                    .with_opt("startTime", backup.start_time),
            )
            .with("userLabels", self.settings.user_labels.to_labels());

        let props = PropertyMap::new()
            .with("name", self.name)
            .with("databaseVersion", self.database_version)
            .with("region", self.region)
            .with("settings", settings)
            .with("deletionProtection", self.deletion_protection);
        check_gcp_name(&props, "database instance")?;
        Ok(props)
    }
}

fn is_hh_mm(s: &str) -> bool {
    match s.split_once(':') {
        Some((h, m)) if h.len() == 2 && m.len() == 2 => {
            h.parse::<u8>().is_ok_and(|h| h < 24) && m.parse::<u8>().is_ok_and(|m| m < 60)
        }
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseInstance {
    handle: ResourceHandle,
}

impl DatabaseInstance {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: DatabaseInstanceArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let handle = ctx.register(name, args, options)?;
        Ok(Self { handle })
    }

    pub fn name(&self) -> Output<String> {
        self.handle.output("name")
    }

    /// `<project>:<region>:<instance>`
    pub fn connection_name(&self) -> Output<String> {
        self.handle.output("connectionName")
    }

    pub fn public_ip_address(&self) -> Output<String> {
        self.handle.output("publicIpAddress")
    }
}

impl Resource for DatabaseInstance {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
