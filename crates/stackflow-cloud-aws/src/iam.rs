//! IAM roles and policies

use serde::{Deserialize, Serialize};
use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, StackError, Tags,
};

pub const ROLE: &str = "aws:iam:Role";
pub const ROLE_POLICY: &str = "aws:iam:RolePolicy";
pub const ROLE_POLICY_ATTACHMENT: &str = "aws:iam:RolePolicyAttachment";

pub const POLICY_VERSION: &str = "2012-10-17";

/// Managed policy granting CloudWatch Logs access to Lambda functions
pub const LAMBDA_BASIC_EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// IAM policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: Actions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub service: String,
}

/// `"Action": "sts:AssumeRole"` or `"Action": [...]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Actions {
    One(String),
    Many(Vec<String>),
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }

    /// Trust policy letting `service` assume the role
    pub fn assume_role(service: &str) -> Self {
        Self::new(vec![PolicyStatement {
            effect: "Allow".to_string(),
            principal: Some(Principal {
                service: service.to_string(),
            }),
            action: Actions::One("sts:AssumeRole".to_string()),
            resource: None,
        }])
    }

    /// Allow `actions` on one resource
    pub fn allow(actions: &[&str], resource: impl Into<String>) -> Self {
        Self::new(vec![PolicyStatement {
            effect: "Allow".to_string(),
            principal: None,
            action: Actions::Many(actions.iter().map(|a| a.to_string()).collect()),
            resource: Some(resource.into()),
        }])
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Policy allowing `actions` on a resource whose ARN is deferred
    pub fn allow_deferred(actions: &[&str], resource_arn: &Output<String>) -> Output<String> {
        let actions: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
        resource_arn.try_apply(move |arn: String| {
            let actions: Vec<&str> = actions.iter().map(String::as_str).collect();
            PolicyDocument::allow(&actions, arn)
                .to_json()
                .map_err(|e| e.to_string())
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoleArgs {
    pub name: Option<Output<String>>,
    /// Trust policy as a JSON document
    pub assume_role_policy: String,
    pub tags: Tags,
}

impl ResourceArgs for RoleArgs {
    fn resource_type(&self) -> &'static str {
        ROLE
    }

    fn into_properties(self) -> Result<PropertyMap> {
        serde_json::from_str::<PolicyDocument>(&self.assume_role_policy).map_err(|e| {
            StackError::InvalidArgs(format!("assume role policy is not a policy document: {}", e))
        })?;
        Ok(PropertyMap::new()
            .with_opt("name", self.name)
            .with("assumeRolePolicy", self.assume_role_policy)
            .with("tags", self.tags))
    }
}

#[derive(Debug, Clone)]
pub struct Role {
    handle: ResourceHandle,
}

impl Role {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: RoleArgs,
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

impl Resource for Role {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[derive(Debug, Clone)]
pub struct RolePolicyAttachmentArgs {
    pub role: Output<String>,
    pub policy_arn: String,
}

impl ResourceArgs for RolePolicyAttachmentArgs {
    fn resource_type(&self) -> &'static str {
        ROLE_POLICY_ATTACHMENT
    }

    fn into_properties(self) -> Result<PropertyMap> {
        if !self.policy_arn.starts_with("arn:") {
            return Err(StackError::InvalidArgs(format!(
                "'{}' is not a policy ARN",
                self.policy_arn
            )));
        }
        Ok(PropertyMap::new()
            .with("role", self.role)
            .with("policyArn", self.policy_arn))
    }
}

#[derive(Debug, Clone)]
pub struct RolePolicyArgs {
    pub role: Output<String>,
    /// Policy document as JSON, usually derived from other outputs
    pub policy: Output<String>,
}

impl ResourceArgs for RolePolicyArgs {
    fn resource_type(&self) -> &'static str {
        ROLE_POLICY
    }

    fn into_properties(self) -> Result<PropertyMap> {
        Ok(PropertyMap::new()
            .with("role", self.role)
            .with("policy", self.policy))
    }
}

/// Declare a managed policy attachment; nothing reads its outputs
pub fn attach_role_policy(
    ctx: &mut ProgramContext,
    name: &str,
    args: RolePolicyAttachmentArgs,
) -> Result<ResourceHandle> {
    ctx.register(name, args, ResourceOptions::default())
}

/// Declare an inline role policy
pub fn role_policy(
    ctx: &mut ProgramContext,
    name: &str,
    args: RolePolicyArgs,
) -> Result<ResourceHandle> {
    ctx.register(name, args, ResourceOptions::default())
}
