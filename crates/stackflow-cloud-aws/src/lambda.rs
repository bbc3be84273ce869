//! Lambda functions

use stackflow_core::{
    Output, ProgramContext, PropertyMap, PropertyValue, Resource, ResourceArgs, ResourceHandle,
    ResourceOptions, Result, StackError, Tags,
};
use std::collections::BTreeMap;

pub const FUNCTION: &str = "aws:lambda:Function";

/// In-memory code archive: file name to file contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetArchive {
    files: BTreeMap<String, String>,
}

impl AssetArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.insert(name.into(), contents.into());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl From<AssetArchive> for PropertyValue {
    fn from(archive: AssetArchive) -> Self {
        let assets: BTreeMap<String, PropertyMap> = archive
            .files
            .into_iter()
            .map(|(name, text)| (name, PropertyMap::new().with("text", text)))
            .collect();
        PropertyMap::new().with("assets", assets).into()
    }
}

#[derive(Debug, Clone)]
pub struct FunctionArgs {
    pub name: Option<Output<String>>,
    pub role: Output<String>,
    pub runtime: String,
    /// `<module>.<function>`
    pub handler: String,
    pub code: AssetArchive,
    pub environment: BTreeMap<String, Output<String>>,
    pub timeout: u32,
    pub memory_size: u32,
    pub tags: Tags,
}

impl FunctionArgs {
    pub fn new(role: Output<String>, runtime: &str, handler: &str, code: AssetArchive) -> Self {
        Self {
            name: None,
            role,
            runtime: runtime.to_string(),
            handler: handler.to_string(),
            code,
            environment: BTreeMap::new(),
            timeout: 3,
            memory_size: 128,
            tags: Tags::new(),
        }
    }
}

impl ResourceArgs for FunctionArgs {
    fn resource_type(&self) -> &'static str {
        FUNCTION
    }

    fn into_properties(self) -> Result<PropertyMap> {
        let Some((module, _)) = self.handler.split_once('.') else {
            return Err(StackError::InvalidArgs(format!(
                "handler '{}' must be <module>.<function>",
                self.handler
            )));
        };
        if self.runtime.starts_with("python") && !self.code.contains(&format!("{}.py", module)) {
            return Err(StackError::InvalidArgs(format!(
                "code archive has no {}.py for handler '{}'",
                module, self.handler
            )));
        }
        if !(1..=900).contains(&self.timeout) {
            return Err(StackError::InvalidArgs(format!(
                "timeout {} is outside 1..=900 seconds",
                self.timeout
            )));
        }
        if !(128..=10240).contains(&self.memory_size) {
            return Err(StackError::InvalidArgs(format!(
                "memory size {} is outside 128..=10240 MB",
                self.memory_size
            )));
        }

        Ok(PropertyMap::new()
            .with_opt("name", self.name)
            .with("role", self.role)
            .with("runtime", self.runtime)
            .with("handler", self.handler)
            .with("code", self.code)
            .with(
                "environment",
                PropertyMap::new().with("variables", self.environment),
            )
            .with("timeout", self.timeout)
            .with("memorySize", self.memory_size)
            .with("tags", self.tags))
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    handle: ResourceHandle,
}

impl Function {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: FunctionArgs,
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

    /// ARN used by API Gateway integrations
    pub fn invoke_arn(&self) -> Output<String> {
        self.handle.output("invokeArn")
    }
}

impl Resource for Function {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stackflow_core::{ConfigStore, StackName};

    fn args() -> FunctionArgs {
        FunctionArgs::new(
            "arn:aws:iam::123456789012:role/r".into(),
            "python3.11",
            "index.handler",
            AssetArchive::new().with_file("index.py", "def handler(e, c): pass"),
        )
    }

    fn ctx() -> ProgramContext {
        ProgramContext::new("app", StackName::new("dev").unwrap(), ConfigStore::new())
    }

    #[test]
    fn test_function_properties() {
        let mut ctx = ctx();
        let mut args = args();
        args.environment.insert("TABLE_NAME".into(), "items".into());
        Function::new(&mut ctx, "fn", args, ResourceOptions::default()).unwrap();

        let props = ctx.finish().get("fn").unwrap().properties.known_value().unwrap();
        assert_eq!(
            props["code"]["assets"]["index.py"]["text"],
            json!("def handler(e, c): pass")
        );
        assert_eq!(props["environment"]["variables"]["TABLE_NAME"], json!("items"));
        assert_eq!(props["memorySize"], json!(128));
    }

    #[test]
    fn test_handler_module_must_be_in_archive() {
        let mut ctx = ctx();
        let mut args = args();
        args.handler = "main.handler".into();
        assert!(matches!(
            Function::new(&mut ctx, "fn", args, ResourceOptions::default()),
            Err(StackError::InvalidArgs(_))
        ));
    }

    #[test]
    fn test_timeout_range() {
        let mut ctx = ctx();
        let mut args = args();
        args.timeout = 0;
        assert!(Function::new(&mut ctx, "fn", args, ResourceOptions::default()).is_err());
    }
}
