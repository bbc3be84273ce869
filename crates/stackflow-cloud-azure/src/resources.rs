//! Resource groups

use crate::naming;
use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, Tags,
};

pub const RESOURCE_GROUP: &str = "azure-native:resources:ResourceGroup";

#[derive(Debug, Clone)]
pub struct ResourceGroupArgs {
    pub resource_group_name: Output<String>,
    pub location: Output<String>,
    pub tags: Tags,
}

impl ResourceArgs for ResourceGroupArgs {
    fn resource_type(&self) -> &'static str {
        RESOURCE_GROUP
    }

    fn into_properties(self) -> Result<PropertyMap> {
        let props = PropertyMap::new()
            .with("resourceGroupName", self.resource_group_name)
            .with("location", self.location)
            .with("tags", self.tags);
        naming::RESOURCE_GROUP.check_property(&props, "resourceGroupName")?;
        Ok(props)
    }
}

#[derive(Debug, Clone)]
pub struct ResourceGroup {
    handle: ResourceHandle,
}

impl ResourceGroup {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: ResourceGroupArgs,
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

    pub fn id(&self) -> Output<String> {
        self.handle.id()
    }
}

impl Resource for ResourceGroup {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_core::{ConfigStore, StackError, StackName};

    #[test]
    fn test_malformed_name_fails_declaration() {
        let mut ctx =
            ProgramContext::new("app", StackName::new("dev").unwrap(), ConfigStore::new());
        let err = ResourceGroup::new(
            &mut ctx,
            "rg",
            ResourceGroupArgs {
                resource_group_name: "rg-dev.".into(),
                location: "eastus".into(),
                tags: Tags::new(),
            },
            ResourceOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StackError::InvalidName { .. }));
        assert!(ctx.finish().is_empty());
    }
}
