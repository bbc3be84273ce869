//! DynamoDB tables

use serde::{Deserialize, Serialize};
use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, StackError, Tags,
};

pub const TABLE: &str = "aws:dynamodb:Table";

/// Key attribute type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

impl AttributeType {
    fn as_str(self) -> &'static str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl TableAttribute {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BillingMode {
    #[default]
    PayPerRequest,
    Provisioned,
}

impl BillingMode {
    fn as_str(self) -> &'static str {
        match self {
            BillingMode::PayPerRequest => "PAY_PER_REQUEST",
            BillingMode::Provisioned => "PROVISIONED",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableArgs {
    /// Physical name; generated from the logical name when absent
    pub name: Option<Output<String>>,
    pub attributes: Vec<TableAttribute>,
    pub hash_key: String,
    pub billing_mode: BillingMode,
    pub point_in_time_recovery: bool,
    pub server_side_encryption: bool,
    pub tags: Tags,
}

impl ResourceArgs for TableArgs {
    fn resource_type(&self) -> &'static str {
        TABLE
    }

    fn into_properties(self) -> Result<PropertyMap> {
        if !self.attributes.iter().any(|a| a.name == self.hash_key) {
            return Err(StackError::InvalidArgs(format!(
                "hash key '{}' is not a declared attribute",
                self.hash_key
            )));
        }

        let attributes: Vec<PropertyMap> = self
            .attributes
            .into_iter()
            .map(|a| {
                PropertyMap::new()
                    .with("name", a.name)
                    .with("type", a.attribute_type.as_str())
            })
            .collect();

        Ok(PropertyMap::new()
            .with_opt("name", self.name)
            .with("attributes", attributes)
            .with("hashKey", self.hash_key)
            .with("billingMode", self.billing_mode.as_str())
            .with(
                "pointInTimeRecovery",
                PropertyMap::new().with("enabled", self.point_in_time_recovery),
            )
            .with(
                "serverSideEncryption",
                PropertyMap::new().with("enabled", self.server_side_encryption),
            )
            .with("tags", self.tags))
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    handle: ResourceHandle,
}

impl Table {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: TableArgs,
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

impl Resource for Table {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stackflow_core::{ConfigStore, StackName};

    fn ctx() -> ProgramContext {
        ProgramContext::new("app", StackName::new("dev").unwrap(), ConfigStore::new())
    }

    #[test]
    fn test_table_properties() {
        let mut ctx = ctx();
        Table::new(
            &mut ctx,
            "items",
            TableArgs {
                name: Some("items-dev".into()),
                attributes: vec![TableAttribute::new("id", AttributeType::String)],
                hash_key: "id".into(),
                point_in_time_recovery: true,
                ..Default::default()
            },
            ResourceOptions::default(),
        )
        .unwrap();

        let graph = ctx.finish();
        let props = graph.get("items").unwrap().properties.known_value().unwrap();
        assert_eq!(props["name"], json!("items-dev"));
        assert_eq!(props["attributes"], json!([{ "name": "id", "type": "S" }]));
        assert_eq!(props["billingMode"], json!("PAY_PER_REQUEST"));
        assert_eq!(props["pointInTimeRecovery"]["enabled"], json!(true));
        assert_eq!(props["serverSideEncryption"]["enabled"], json!(false));
    }

    #[test]
    fn test_hash_key_must_be_an_attribute() {
        let mut ctx = ctx();
        let err = Table::new(
            &mut ctx,
            "items",
            TableArgs {
                hash_key: "pk".into(),
                attributes: vec![TableAttribute::new("id", AttributeType::String)],
                ..Default::default()
            },
            ResourceOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StackError::InvalidArgs(_)));
    }
}
