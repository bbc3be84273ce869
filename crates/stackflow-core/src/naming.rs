//! Stack-scoped names, tags and provider naming rules

use crate::error::{Result, StackError};
use crate::property::{PropertyMap, PropertyValue};
use crate::stack::StackName;
use regex::Regex;
use std::collections::BTreeMap;

/// Value of the `ManagedBy` tag on every resource
pub const MANAGED_BY: &str = "stackflow";

/// `<prefix>-<stack>`, e.g. `rg-aks-dev`
pub fn stack_scoped(prefix: &str, stack: &StackName) -> String {
    format!("{}-{}", prefix, stack)
}

/// Resource tags / labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Environment=<stack>` and `ManagedBy=stackflow`
    pub fn standard(stack: &StackName) -> Self {
        Self::new()
            .with("Environment", stack.as_str())
            .with("ManagedBy", MANAGED_BY)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// GCP labels only allow lowercase keys
    pub fn to_labels(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
                .collect(),
        )
    }
}

impl From<Tags> for PropertyValue {
    fn from(tags: Tags) -> Self {
        tags.0.into()
    }
}

/// Naming rule of one provider resource type
#[derive(Debug, Clone, Copy)]
pub struct NameRule {
    pub resource_type: &'static str,
    pub min_len: usize,
    pub max_len: usize,
    /// Anchored pattern the whole name must match
    pub pattern: &'static str,
    /// Human readable summary used in errors
    pub description: &'static str,
}

impl NameRule {
    pub fn check(&self, name: &str) -> Result<()> {
        let len = name.chars().count();
        if len < self.min_len || len > self.max_len {
            return Err(self.violation(
                name,
                format!("length must be {}..={}", self.min_len, self.max_len),
            ));
        }

        let re = Regex::new(self.pattern).map_err(|e| {
            StackError::InvalidArgs(format!("bad name pattern for {}: {}", self.resource_type, e))
        })?;
        if !re.is_match(name) {
            return Err(self.violation(name, self.description.to_string()));
        }
        Ok(())
    }

    /// Check `properties[key]` when it is a literal; deferred names are
    /// left to the provider.
    pub fn check_property(&self, properties: &PropertyMap, key: &str) -> Result<()> {
        match properties.known_str(key) {
            Some(name) => self.check(&name),
            None => Ok(()),
        }
    }

    fn violation(&self, name: &str, reason: String) -> StackError {
        StackError::InvalidName {
            resource_type: self.resource_type.to_string(),
            name: name.to_string(),
            reason,
        }
    }
}
