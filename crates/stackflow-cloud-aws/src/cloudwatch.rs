//! CloudWatch log groups

use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, StackError, Tags,
};

pub const LOG_GROUP: &str = "aws:cloudwatch:LogGroup";

/// Retention periods CloudWatch accepts
const RETENTION_DAYS: &[u32] = &[
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

#[derive(Debug, Clone)]
pub struct LogGroupArgs {
    pub name: Output<String>,
    /// `None` keeps logs forever
    pub retention_in_days: Option<u32>,
    pub tags: Tags,
}

impl ResourceArgs for LogGroupArgs {
    fn resource_type(&self) -> &'static str {
        LOG_GROUP
    }

    fn into_properties(self) -> Result<PropertyMap> {
        if let Some(days) = self.retention_in_days.filter(|d| !RETENTION_DAYS.contains(d)) {
            return Err(StackError::InvalidArgs(format!(
                "{} is not a valid log retention period",
                days
            )));
        }
        Ok(PropertyMap::new()
            .with("name", self.name)
            .with_opt("retentionInDays", self.retention_in_days)
            .with("tags", self.tags))
    }
}

#[derive(Debug, Clone)]
pub struct LogGroup {
    handle: ResourceHandle,
}

impl LogGroup {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: LogGroupArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let handle = ctx.register(name, args, options)?;
        Ok(Self { handle })
    }

    pub fn name(&self) -> Output<String> {
        self.handle.output("name")
    }

    pub fn arn(&self) -> Output<String> {
        self.handle.output("arn")
    }
}

impl Resource for LogGroup {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_core::{ConfigStore, StackName};

    #[test]
    fn test_retention_must_be_supported() {
        let mut ctx =
            ProgramContext::new("app", StackName::new("dev").unwrap(), ConfigStore::new());
        let args = |days| LogGroupArgs {
            name: "/aws/lambda/fn".into(),
            retention_in_days: Some(days),
            tags: Tags::new(),
        };

        assert!(LogGroup::new(&mut ctx, "ok", args(7), ResourceOptions::default()).is_ok());
        assert!(LogGroup::new(&mut ctx, "bad", args(8), ResourceOptions::default()).is_err());
    }
}
